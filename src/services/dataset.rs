//! Immutable dataset snapshot and the merge/clean steps that produce it.
//!
//! Loaders hand over raw tables whose cells may be absent. [`merge`] joins
//! ratings onto the movie catalog and [`clean`] drops every row with a missing
//! field, leaving only complete [`RatingRow`]s.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Movie, MovieId, Rating, RatingRow, UserId};

/// A row of the movies table as read from disk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovieRecord {
    pub movie_id: Option<MovieId>,
    pub movie_name: Option<String>,
    pub genre: Option<String>,
}

/// A row of the ratings table as read from disk
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatingRecord {
    pub user_id: Option<UserId>,
    pub movie_id: Option<MovieId>,
    pub rating: Option<f64>,
}

/// A rating left-joined with its movie, before cleaning
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedRow {
    pub user_id: Option<UserId>,
    pub movie_id: Option<MovieId>,
    pub rating: Option<f64>,
    pub movie_name: Option<String>,
    pub genre: Option<String>,
}

/// Left-joins ratings onto the movie catalog by movie id
///
/// Every rating yields exactly one row, in input order. When the catalog
/// lists an id more than once, the first entry wins.
pub fn merge(movies: &[MovieRecord], ratings: &[RatingRecord]) -> Vec<MergedRow> {
    let mut catalog: HashMap<MovieId, &MovieRecord> = HashMap::with_capacity(movies.len());
    let mut duplicate_ids = 0usize;

    for movie in movies {
        if let Some(id) = movie.movie_id {
            if catalog.contains_key(&id) {
                duplicate_ids += 1;
            } else {
                catalog.insert(id, movie);
            }
        }
    }

    if duplicate_ids > 0 {
        tracing::warn!(
            count = duplicate_ids,
            "Duplicate movie ids in catalog, keeping first entry"
        );
    }

    ratings
        .iter()
        .map(|rating| {
            let movie = rating.movie_id.and_then(|id| catalog.get(&id));
            MergedRow {
                user_id: rating.user_id,
                movie_id: rating.movie_id,
                rating: rating.rating,
                movie_name: movie.and_then(|m| m.movie_name.clone()),
                genre: movie.and_then(|m| m.genre.clone()),
            }
        })
        .collect()
}

/// Drops rows with any missing field
pub fn clean(rows: Vec<MergedRow>) -> Vec<RatingRow> {
    let total = rows.len();

    let cleaned: Vec<RatingRow> = rows
        .into_iter()
        .filter_map(|row| {
            Some(RatingRow {
                movie_id: row.movie_id?,
                movie_name: row.movie_name?,
                genre: row.genre?,
                user_id: row.user_id?,
                rating: row.rating?,
            })
        })
        .collect();

    let dropped = total - cleaned.len();
    if dropped > 0 {
        tracing::info!(dropped, kept = cleaned.len(), "Dropped incomplete rows");
    }

    cleaned
}

/// Counts describing a loaded dataset
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DatasetSummary {
    pub rows: usize,
    pub users: usize,
    pub movies: usize,
    pub loaded_at: DateTime<Utc>,
}

/// Cleaned ratings joined with movie metadata
///
/// A snapshot is never mutated. Reloading produces a new snapshot that
/// replaces the old one wherever it is held.
#[derive(Debug, Clone)]
pub struct Dataset {
    rows: Vec<RatingRow>,
    movies: BTreeMap<MovieId, Movie>,
    loaded_at: DateTime<Utc>,
}

impl Default for Dataset {
    fn default() -> Self {
        Self::empty()
    }
}

impl Dataset {
    pub fn empty() -> Self {
        Self::from_rows(Vec::new())
    }

    /// Builds a snapshot from already cleaned rows
    pub fn from_rows(rows: Vec<RatingRow>) -> Self {
        let mut movies = BTreeMap::new();
        for row in &rows {
            movies.entry(row.movie_id).or_insert_with(|| Movie {
                movie_id: row.movie_id,
                movie_name: row.movie_name.clone(),
                genre: row.genre.clone(),
            });
        }

        Self {
            rows,
            movies,
            loaded_at: Utc::now(),
        }
    }

    /// Merges and cleans raw tables into a snapshot
    pub fn from_tables(movies: &[MovieRecord], ratings: &[RatingRecord]) -> Self {
        Self::from_rows(clean(merge(movies, ratings)))
    }

    pub fn rows(&self) -> &[RatingRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Flat (user, movie, rating) observations in row order
    pub fn observations(&self) -> Vec<Rating> {
        self.rows.iter().map(RatingRow::observation).collect()
    }

    pub fn movie(&self, movie_id: MovieId) -> Option<&Movie> {
        self.movies.get(&movie_id)
    }

    /// Distinct user ids, ascending
    pub fn user_ids(&self) -> Vec<UserId> {
        self.rows
            .iter()
            .map(|r| r.user_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn contains_user(&self, user_id: UserId) -> bool {
        self.rows.iter().any(|r| r.user_id == user_id)
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary {
            rows: self.rows.len(),
            users: self.user_ids().len(),
            movies: self.movies.len(),
            loaded_at: self.loaded_at,
        }
    }
}
