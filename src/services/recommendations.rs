use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    error::AppResult,
    models::{MovieId, Neighbor, Recommendation, RecommendedMovie, UserId, UNKNOWN_GENRE},
};

use super::{
    dataset::Dataset,
    matrix::{DuplicatePolicy, RatingMatrix},
    neighbors::select_neighbors,
    similarity::{SimilarityPolicy, UserSimilarity},
};

/// Knobs of the collaborative-filtering pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommenderSettings {
    /// Number of neighbors whose ratings are aggregated
    pub neighbor_count: usize,
    pub similarity: SimilarityPolicy,
    pub duplicates: DuplicatePolicy,
}

impl Default for RecommenderSettings {
    fn default() -> Self {
        Self {
            neighbor_count: 5,
            similarity: SimilarityPolicy::default(),
            duplicates: DuplicatePolicy::default(),
        }
    }
}

/// Generates collaborative-filtering recommendations for a user
///
/// Rebuilds the rating matrix and the similarity table from the snapshot on
/// every call, picks the `settings.neighbor_count` most similar users and
/// ranks the movies they rated by their mean rating. Movies the user already
/// rated are never returned.
///
/// An empty dataset yields an empty list. Otherwise a user absent from the
/// dataset is `UnknownUser`.
pub fn recommend(
    dataset: &Dataset,
    user_id: UserId,
    n: usize,
    settings: &RecommenderSettings,
) -> AppResult<Vec<Recommendation>> {
    if dataset.is_empty() {
        tracing::info!(user_id, "Empty dataset, no recommendations");
        return Ok(Vec::new());
    }

    let matrix = RatingMatrix::build(&dataset.observations(), settings.duplicates)?;
    let similarity = UserSimilarity::compute(&matrix, settings.similarity);
    let neighbors = select_neighbors(&similarity, user_id, settings.neighbor_count)?;
    let recommendations = aggregate(&matrix, user_id, &neighbors, n);

    tracing::info!(
        user_id,
        neighbors = neighbors.len(),
        requested = n,
        returned = recommendations.len(),
        "Generated recommendations"
    );

    Ok(recommendations)
}

/// Most similar users to `user_id`, computed the same way [`recommend`] does
pub fn neighbors_for(
    dataset: &Dataset,
    user_id: UserId,
    k: usize,
    settings: &RecommenderSettings,
) -> AppResult<Vec<Neighbor>> {
    if dataset.is_empty() {
        return Ok(Vec::new());
    }

    let matrix = RatingMatrix::build(&dataset.observations(), settings.duplicates)?;
    let similarity = UserSimilarity::compute(&matrix, settings.similarity);
    select_neighbors(&similarity, user_id, k)
}

/// Ranks the movies rated by `neighbors` for `target`
///
/// A movie's score is the mean of the ratings given by the neighbors that
/// rated it; neighbors that did not rate it are left out of the mean rather
/// than counted as 0. Movies `target` rated are removed. Ordered by
/// descending score, then ascending movie id, truncated to `n`.
pub fn aggregate(
    matrix: &RatingMatrix,
    target: UserId,
    neighbors: &[Neighbor],
    n: usize,
) -> Vec<Recommendation> {
    let already_rated = matrix.rated_movies(target);
    let mut totals: BTreeMap<MovieId, (f64, u32)> = BTreeMap::new();

    for neighbor in neighbors {
        let Some(row) = matrix.row(neighbor.user_id) else {
            continue;
        };

        for (movie_id, rating) in matrix.movies().iter().zip(row) {
            if let Some(rating) = rating {
                if already_rated.contains(movie_id) {
                    continue;
                }
                let entry = totals.entry(*movie_id).or_insert((0.0, 0));
                entry.0 += rating;
                entry.1 += 1;
            }
        }
    }

    let mut candidates: Vec<Recommendation> = totals
        .into_iter()
        .map(|(movie_id, (sum, count))| Recommendation {
            movie_id,
            score: sum / f64::from(count),
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.movie_id.cmp(&b.movie_id))
    });
    candidates.truncate(n);
    candidates
}

/// Attaches catalog name and genre to each recommendation
pub fn describe(dataset: &Dataset, recommendations: &[Recommendation]) -> Vec<RecommendedMovie> {
    recommendations
        .iter()
        .map(|rec| {
            let movie = dataset.movie(rec.movie_id);
            RecommendedMovie {
                movie_id: rec.movie_id,
                movie_name: movie
                    .map(|m| m.movie_name.clone())
                    .unwrap_or_else(|| "Unknown".to_string()),
                genre: movie
                    .map(|m| m.genre.clone())
                    .unwrap_or_else(|| UNKNOWN_GENRE.to_string()),
                score: rec.score,
            }
        })
        .collect()
}
