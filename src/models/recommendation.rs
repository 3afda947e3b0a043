use serde::{Deserialize, Serialize};

use super::{MovieId, UserId};

/// Another user selected for similarity-based recommendation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Neighbor {
    pub user_id: UserId,
    /// Cosine similarity to the target user, in [-1, 1]
    pub similarity: f64,
}

/// A candidate movie with its predicted score
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub movie_id: MovieId,
    /// Mean rating of the movie across the neighbors that rated it
    pub score: f64,
}

/// A recommendation enriched with catalog metadata, returned to the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendedMovie {
    pub movie_id: MovieId,
    pub movie_name: String,
    pub genre: String,
    pub score: f64,
}
