//! Pairwise cosine similarity between user rating vectors.
//!
//! The matrix keeps missing ratings explicit; this module decides how they
//! enter the cosine through [`SimilarityPolicy`]. The default,
//! [`SimilarityPolicy::ZeroFill`], treats a missing rating as 0 over the full
//! movie axis. That inflates similarity between users with sparse vectors
//! that overlap on few movies, and it is kept as the default so results match
//! the established behavior. The other policies are opt-in changes.

use serde::{Deserialize, Serialize};

use crate::models::UserId;

use super::matrix::RatingMatrix;

/// How missing ratings are handled when comparing two users
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityPolicy {
    /// Missing ratings count as 0 over the full movie axis
    #[default]
    ZeroFill,
    /// Each user's observed ratings are centered on their own mean, then
    /// missing ratings count as 0
    MeanCenter,
    /// Only movies rated by both users contribute
    Pairwise,
}

/// Symmetric user×user similarity table
#[derive(Debug, Clone, PartialEq)]
pub struct UserSimilarity {
    users: Vec<UserId>,
    scores: Vec<f64>,
}

impl UserSimilarity {
    /// Computes every pairwise similarity of the matrix's users
    ///
    /// O(U² · M). Each unordered pair is computed once and mirrored, so
    /// `get(a, b) == get(b, a)` holds bit for bit.
    pub fn compute(matrix: &RatingMatrix, policy: SimilarityPolicy) -> Self {
        let users = matrix.users().to_vec();
        let n = users.len();

        let vectors: Vec<Vec<Option<f64>>> = (0..n)
            .map(|i| prepare_vector(matrix.row_at(i), policy))
            .collect();
        let pairwise = policy == SimilarityPolicy::Pairwise;

        let mut scores = vec![0.0; n * n];
        for i in 0..n {
            let self_norm: f64 = vectors[i].iter().flatten().map(|r| r * r).sum();
            scores[i * n + i] = if self_norm > 0.0 { 1.0 } else { 0.0 };

            for j in (i + 1)..n {
                let score = cosine(&vectors[i], &vectors[j], pairwise);
                scores[i * n + j] = score;
                scores[j * n + i] = score;
            }
        }

        tracing::debug!(users = n, ?policy, "Computed user similarity");

        Self { users, scores }
    }

    /// Users in ascending id order
    pub fn users(&self) -> &[UserId] {
        &self.users
    }

    pub fn contains_user(&self, user_id: UserId) -> bool {
        self.users.binary_search(&user_id).is_ok()
    }

    /// Similarity between two users, `None` if either is unknown
    pub fn get(&self, a: UserId, b: UserId) -> Option<f64> {
        let i = self.users.binary_search(&a).ok()?;
        let j = self.users.binary_search(&b).ok()?;
        Some(self.scores[i * self.users.len() + j])
    }

    /// Similarity of `user_id` to every user (itself included), in user order
    pub fn scores_for(&self, user_id: UserId) -> Option<impl Iterator<Item = (UserId, f64)> + '_> {
        let i = self.users.binary_search(&user_id).ok()?;
        let n = self.users.len();
        Some(
            self.users
                .iter()
                .copied()
                .zip(self.scores[i * n..(i + 1) * n].iter().copied()),
        )
    }
}

fn prepare_vector(row: &[Option<f64>], policy: SimilarityPolicy) -> Vec<Option<f64>> {
    match policy {
        SimilarityPolicy::ZeroFill | SimilarityPolicy::Pairwise => row.to_vec(),
        SimilarityPolicy::MeanCenter => {
            let (sum, count) = row
                .iter()
                .flatten()
                .fold((0.0, 0usize), |(s, c), r| (s + r, c + 1));
            if count == 0 {
                return row.to_vec();
            }
            let mean = sum / count as f64;
            row.iter().map(|cell| cell.map(|r| r - mean)).collect()
        }
    }
}

/// Cosine over two aligned vectors with explicit missing entries
///
/// A missing entry contributes 0 to the dot product. Outside pairwise mode an
/// observed entry still counts toward its own norm even when the other side
/// is missing, which is exactly cosine over zero-filled vectors.
fn cosine(a: &[Option<f64>], b: &[Option<f64>], pairwise: bool) -> f64 {
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;

    for (x, y) in a.iter().zip(b) {
        match (x, y) {
            (Some(x), Some(y)) => {
                dot += x * y;
                norm_a += x * x;
                norm_b += y * y;
            }
            (Some(x), None) if !pairwise => norm_a += x * x,
            (None, Some(y)) if !pairwise => norm_b += y * y,
            _ => {}
        }
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    // sqrt of the product keeps identical vectors at exactly 1.0
    (dot / (norm_a * norm_b).sqrt()).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Rating;
    use crate::services::matrix::DuplicatePolicy;

    fn matrix(rows: &[(UserId, i64, f64)]) -> RatingMatrix {
        let obs: Vec<Rating> = rows
            .iter()
            .map(|&(u, m, r)| Rating::new(u, m, r))
            .collect();
        RatingMatrix::build(&obs, DuplicatePolicy::Error).unwrap()
    }

    fn scenario() -> RatingMatrix {
        matrix(&[(1, 1, 5.0), (1, 2, 3.0), (2, 1, 5.0), (2, 2, 3.0), (3, 1, 1.0)])
    }

    #[test]
    fn test_identical_vectors_are_exactly_one() {
        let sim = UserSimilarity::compute(&scenario(), SimilarityPolicy::ZeroFill);
        assert_eq!(sim.get(1, 2), Some(1.0));
    }

    #[test]
    fn test_zero_fill_partial_overlap() {
        let sim = UserSimilarity::compute(&scenario(), SimilarityPolicy::ZeroFill);
        let expected = 5.0 / 34f64.sqrt();
        assert!((sim.get(1, 3).unwrap() - expected).abs() < 1e-12);
        assert!(sim.get(1, 3).unwrap() < 1.0);
    }

    #[test]
    fn test_symmetry_and_self_similarity() {
        let m = matrix(&[
            (1, 1, 4.0),
            (1, 3, 2.0),
            (2, 2, 5.0),
            (2, 3, 1.0),
            (3, 1, 3.5),
            (3, 2, 2.5),
            (3, 4, 4.0),
            (4, 4, 1.0),
        ]);

        for policy in [
            SimilarityPolicy::ZeroFill,
            SimilarityPolicy::MeanCenter,
            SimilarityPolicy::Pairwise,
        ] {
            let sim = UserSimilarity::compute(&m, policy);
            for &a in sim.users() {
                for &b in sim.users() {
                    assert_eq!(sim.get(a, b), sim.get(b, a), "{policy:?} {a} {b}");
                    let s = sim.get(a, b).unwrap();
                    assert!((-1.0..=1.0).contains(&s));
                }
            }
        }

        let sim = UserSimilarity::compute(&m, SimilarityPolicy::ZeroFill);
        for &u in sim.users() {
            assert_eq!(sim.get(u, u), Some(1.0));
        }
    }

    #[test]
    fn test_disjoint_users_are_orthogonal() {
        let m = matrix(&[(1, 1, 5.0), (2, 2, 5.0)]);
        let sim = UserSimilarity::compute(&m, SimilarityPolicy::ZeroFill);
        assert_eq!(sim.get(1, 2), Some(0.0));
    }

    #[test]
    fn test_zero_norm_user_scores_zero() {
        let m = matrix(&[(1, 1, 0.0), (2, 1, 4.0)]);
        let sim = UserSimilarity::compute(&m, SimilarityPolicy::ZeroFill);
        assert_eq!(sim.get(1, 2), Some(0.0));
        assert_eq!(sim.get(1, 1), Some(0.0));
        assert_eq!(sim.get(2, 2), Some(1.0));
    }

    #[test]
    fn test_pairwise_ignores_non_shared_movies() {
        let sim = UserSimilarity::compute(&scenario(), SimilarityPolicy::Pairwise);
        // U1 and U3 share only movie 1
        assert_eq!(sim.get(1, 3), Some(1.0));
    }

    #[test]
    fn test_mean_center_flat_user_scores_zero() {
        let sim = UserSimilarity::compute(&scenario(), SimilarityPolicy::MeanCenter);
        assert_eq!(sim.get(1, 2), Some(1.0));
        // U3 has a single rating, centered to 0
        assert_eq!(sim.get(1, 3), Some(0.0));
    }

    #[test]
    fn test_mean_center_opposite_tastes() {
        let m = matrix(&[(1, 1, 5.0), (1, 2, 1.0), (2, 1, 1.0), (2, 2, 5.0)]);
        let sim = UserSimilarity::compute(&m, SimilarityPolicy::MeanCenter);
        assert_eq!(sim.get(1, 2), Some(-1.0));
    }

    #[test]
    fn test_unknown_user_lookup() {
        let sim = UserSimilarity::compute(&scenario(), SimilarityPolicy::ZeroFill);
        assert_eq!(sim.get(1, 42), None);
        assert!(sim.scores_for(42).is_none());
        assert_eq!(sim.scores_for(3).unwrap().count(), 3);
    }
}
