use serde::{Deserialize, Serialize};

use super::MovieId;

/// Average rating of a single movie
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieStat {
    pub movie_id: MovieId,
    pub movie_name: String,
    pub genre: String,
    pub average_rating: f64,
    pub rating_count: usize,
}

/// Average rating of every rating that lists a genre
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenreStat {
    pub genre: String,
    pub average_rating: f64,
    pub rating_count: usize,
}

/// Genre statistics restricted to one user's ratings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserGenreStat {
    pub genre: String,
    pub count_ratings: usize,
    pub avg_rating: f64,
    /// `avg_rating * count_ratings`
    pub weighted_score: f64,
}

/// Ordering applied to per-user genre statistics
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GenreSortKey {
    #[default]
    WeightedScore,
    CountRatings,
    AvgRating,
}

impl GenreSortKey {
    /// Value of `stat` used for ranking under this key
    pub fn value_of(self, stat: &UserGenreStat) -> f64 {
        match self {
            GenreSortKey::WeightedScore => stat.weighted_score,
            GenreSortKey::CountRatings => stat.count_ratings as f64,
            GenreSortKey::AvgRating => stat.avg_rating,
        }
    }
}
