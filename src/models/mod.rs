pub mod rating;
pub mod recommendation;
pub mod stats;

pub use rating::{split_genres, Movie, Rating, RatingRow, UNKNOWN_GENRE};
pub use recommendation::{Neighbor, Recommendation, RecommendedMovie};
pub use stats::{GenreSortKey, GenreStat, MovieStat, UserGenreStat};

/// Identifier of a user in the ratings dataset
pub type UserId = i64;

/// Identifier of a movie in the ratings and movies datasets
pub type MovieId = i64;
