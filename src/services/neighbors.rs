use std::cmp::Ordering;

use crate::{
    error::{AppError, AppResult},
    models::{Neighbor, UserId},
};

use super::similarity::UserSimilarity;

/// Returns up to `k` users most similar to `target`, excluding `target`
///
/// Ordered by descending similarity; equal scores are ordered by ascending
/// user id. `k == 0` yields an empty set.
pub fn select_neighbors(
    similarity: &UserSimilarity,
    target: UserId,
    k: usize,
) -> AppResult<Vec<Neighbor>> {
    let scores = similarity
        .scores_for(target)
        .ok_or(AppError::UnknownUser(target))?;

    let mut neighbors: Vec<Neighbor> = scores
        .filter(|(user_id, _)| *user_id != target)
        .map(|(user_id, similarity)| Neighbor {
            user_id,
            similarity,
        })
        .collect();

    neighbors.sort_by(rank_neighbors);
    neighbors.truncate(k);

    tracing::debug!(
        target_user = target,
        requested = k,
        selected = neighbors.len(),
        "Selected neighbors"
    );

    Ok(neighbors)
}

fn rank_neighbors(a: &Neighbor, b: &Neighbor) -> Ordering {
    b.similarity
        .total_cmp(&a.similarity)
        .then_with(|| a.user_id.cmp(&b.user_id))
}
