//! Genre-level rating statistics.
//!
//! A rating of a multi-genre movie counts once toward every genre the movie
//! lists. Contributions are not weighted by the number of genres.

use std::collections::BTreeMap;

use crate::{
    error::{AppError, AppResult},
    models::{GenreSortKey, GenreStat, UserGenreStat, UserId},
};

use super::{dataset::Dataset, popularity::order_independent_mean};

/// Top `n` genres by average rating, ties by ascending genre name
pub fn top_genres(dataset: &Dataset, n: usize) -> Vec<GenreStat> {
    let mut stats: Vec<GenreStat> = ratings_by_genre(dataset, None)
        .into_iter()
        .map(|(genre, mut ratings)| GenreStat {
            genre,
            average_rating: order_independent_mean(&mut ratings),
            rating_count: ratings.len(),
        })
        .collect();

    stats.sort_by(|a, b| {
        b.average_rating
            .total_cmp(&a.average_rating)
            .then_with(|| a.genre.cmp(&b.genre))
    });
    stats.truncate(n);
    stats
}

/// Per-genre statistics of one user's ratings
///
/// Genres rated fewer than `min_ratings` times are dropped. The rest are
/// ordered by `sort_by` descending, ties by ascending genre name, and
/// truncated to `n`. An empty dataset yields an empty list; otherwise a user
/// without ratings is `UnknownUser`.
pub fn user_genre_stats(
    dataset: &Dataset,
    user_id: UserId,
    min_ratings: usize,
    sort_by: GenreSortKey,
    n: usize,
) -> AppResult<Vec<UserGenreStat>> {
    if dataset.is_empty() {
        return Ok(Vec::new());
    }
    if !dataset.contains_user(user_id) {
        return Err(AppError::UnknownUser(user_id));
    }

    let mut stats: Vec<UserGenreStat> = ratings_by_genre(dataset, Some(user_id))
        .into_iter()
        .filter(|(_, ratings)| ratings.len() >= min_ratings)
        .map(|(genre, mut ratings)| {
            let avg_rating = order_independent_mean(&mut ratings);
            UserGenreStat {
                genre,
                count_ratings: ratings.len(),
                avg_rating,
                weighted_score: avg_rating * ratings.len() as f64,
            }
        })
        .collect();

    stats.sort_by(|a, b| {
        sort_by
            .value_of(b)
            .total_cmp(&sort_by.value_of(a))
            .then_with(|| a.genre.cmp(&b.genre))
    });
    stats.truncate(n);

    tracing::debug!(user_id, ?sort_by, genres = stats.len(), "Computed user genre stats");

    Ok(stats)
}

fn ratings_by_genre(dataset: &Dataset, user_id: Option<UserId>) -> BTreeMap<String, Vec<f64>> {
    let mut grouped: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for row in dataset.rows() {
        if user_id.is_some_and(|id| id != row.user_id) {
            continue;
        }
        for genre in row.genres() {
            grouped.entry(genre).or_default().push(row.rating);
        }
    }
    grouped
}
