//! Header harmonization for movie and rating tables.
//!
//! Datasets in the wild name the same column differently. Each canonical
//! column has an ordered alias list; the first alias present in the header
//! row wins.

use ::csv::StringRecord;

use crate::error::{AppError, AppResult};

pub const MOVIE_ID_ALIASES: &[&str] = &["movieId", "movie_id", "movieID", "movieid", "id", "movie"];
pub const MOVIE_NAME_ALIASES: &[&str] = &["title", "movie_name", "movieTitle", "name"];
pub const GENRE_ALIASES: &[&str] = &["genres", "genre"];
pub const USER_ID_ALIASES: &[&str] = &["userId", "user_id", "customer_id", "customerId", "userid"];
pub const RATING_ALIASES: &[&str] = &["rating", "ratings", "score"];

/// Column positions of a movies table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovieColumns {
    pub movie_id: usize,
    pub movie_name: usize,
    pub genre: usize,
}

impl MovieColumns {
    pub fn resolve(headers: &StringRecord, file: &str) -> AppResult<Self> {
        Ok(Self {
            movie_id: require(headers, file, "movieId", MOVIE_ID_ALIASES)?,
            movie_name: require(headers, file, "movie_name", MOVIE_NAME_ALIASES)?,
            genre: require(headers, file, "genre", GENRE_ALIASES)?,
        })
    }
}

/// Column positions of a ratings table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingColumns {
    pub user_id: usize,
    pub movie_id: usize,
    pub rating: usize,
}

impl RatingColumns {
    pub fn resolve(headers: &StringRecord, file: &str) -> AppResult<Self> {
        Ok(Self {
            user_id: require(headers, file, "userId", USER_ID_ALIASES)?,
            movie_id: require(headers, file, "movieId", MOVIE_ID_ALIASES)?,
            rating: require(headers, file, "rating", RATING_ALIASES)?,
        })
    }
}

/// Position of the first alias present in `headers`
pub fn find_column(headers: &StringRecord, aliases: &[&str]) -> Option<usize> {
    aliases
        .iter()
        .find_map(|alias| headers.iter().position(|h| h.trim() == *alias))
}

fn require(
    headers: &StringRecord,
    file: &str,
    column: &'static str,
    aliases: &'static [&'static str],
) -> AppResult<usize> {
    find_column(headers, aliases).ok_or_else(|| AppError::MissingColumn {
        file: file.to_string(),
        column,
        accepted: aliases,
    })
}
