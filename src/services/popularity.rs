use std::collections::BTreeMap;

use crate::models::{MovieId, MovieStat};

use super::dataset::Dataset;

/// Top `n` movies by average rating
///
/// Movies with fewer than `min_ratings` observations are left out. Ties on
/// the average are ordered by ascending movie name, then movie id.
pub fn top_movies(dataset: &Dataset, n: usize, min_ratings: usize) -> Vec<MovieStat> {
    let mut ratings_by_movie: BTreeMap<MovieId, Vec<f64>> = BTreeMap::new();
    for row in dataset.rows() {
        ratings_by_movie
            .entry(row.movie_id)
            .or_default()
            .push(row.rating);
    }

    let mut stats: Vec<MovieStat> = ratings_by_movie
        .into_iter()
        .filter(|(_, ratings)| ratings.len() >= min_ratings.max(1))
        .filter_map(|(movie_id, mut ratings)| {
            let movie = dataset.movie(movie_id)?;
            Some(MovieStat {
                movie_id,
                movie_name: movie.movie_name.clone(),
                genre: movie.genre.clone(),
                average_rating: order_independent_mean(&mut ratings),
                rating_count: ratings.len(),
            })
        })
        .collect();

    stats.sort_by(|a, b| {
        b.average_rating
            .total_cmp(&a.average_rating)
            .then_with(|| a.movie_name.cmp(&b.movie_name))
            .then_with(|| a.movie_id.cmp(&b.movie_id))
    });
    stats.truncate(n);

    tracing::debug!(requested = n, min_ratings, returned = stats.len(), "Ranked movies");

    stats
}

/// Mean of `values`, summed in ascending order so row order cannot change it
pub(crate) fn order_independent_mean(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(f64::total_cmp);
    values.iter().sum::<f64>() / values.len() as f64
}
