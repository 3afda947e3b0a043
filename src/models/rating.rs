use serde::{Deserialize, Serialize};

use super::{MovieId, UserId};

/// Genre label used when a movie lists no genre at all
pub const UNKNOWN_GENRE: &str = "Unknown";

/// A single (user, movie, rating) observation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Rating {
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub rating: f64,
}

impl Rating {
    pub fn new(user_id: UserId, movie_id: MovieId, rating: f64) -> Self {
        Self {
            user_id,
            movie_id,
            rating,
        }
    }
}

/// A movie catalog entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Movie {
    pub movie_id: MovieId,
    pub movie_name: String,
    /// Raw genre field, `|`-separated when the movie has several genres
    pub genre: String,
}

impl Movie {
    /// Individual genres of this movie
    pub fn genres(&self) -> Vec<String> {
        split_genres(&self.genre)
    }
}

/// One rating joined with its movie metadata, with every field present
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RatingRow {
    pub movie_id: MovieId,
    pub movie_name: String,
    pub genre: String,
    pub user_id: UserId,
    pub rating: f64,
}

impl RatingRow {
    /// The bare observation carried by this row
    pub fn observation(&self) -> Rating {
        Rating::new(self.user_id, self.movie_id, self.rating)
    }

    pub fn genres(&self) -> Vec<String> {
        split_genres(&self.genre)
    }
}

/// Splits a multi-valued genre field on `|`.
///
/// Entries are trimmed and blank entries become [`UNKNOWN_GENRE`], so every
/// field yields at least one genre.
pub fn split_genres(field: &str) -> Vec<String> {
    field
        .split('|')
        .map(|g| {
            let g = g.trim();
            if g.is_empty() {
                UNKNOWN_GENRE.to_string()
            } else {
                g.to_string()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_single_genre() {
        assert_eq!(split_genres("Drama"), vec!["Drama"]);
    }

    #[test]
    fn test_split_multi_genre_trims() {
        assert_eq!(
            split_genres("Action | Comedy|Drama"),
            vec!["Action", "Comedy", "Drama"]
        );
    }

    #[test]
    fn test_split_blank_is_unknown() {
        assert_eq!(split_genres(""), vec![UNKNOWN_GENRE]);
        assert_eq!(split_genres("Action|"), vec!["Action", UNKNOWN_GENRE]);
    }

    #[test]
    fn test_rating_row_observation() {
        let row = RatingRow {
            movie_id: 10,
            movie_name: "Heat".to_string(),
            genre: "Crime|Thriller".to_string(),
            user_id: 3,
            rating: 4.5,
        };
        assert_eq!(row.observation(), Rating::new(3, 10, 4.5));
        assert_eq!(row.genres(), vec!["Crime", "Thriller"]);
    }
}
