use std::collections::{btree_map::Entry, BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::{MovieId, Rating, UserId},
};

/// How repeated (user, movie) observations are folded into one matrix cell
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Reject the dataset with `DuplicateObservation`
    Error,
    /// Keep the first value seen
    First,
    /// Keep the last value seen
    Last,
    /// Average every value seen
    #[default]
    Mean,
}

/// Running state of one (user, movie) cell while the matrix is built
struct CellAccumulator {
    first: f64,
    last: f64,
    sum: f64,
    count: u32,
}

impl CellAccumulator {
    fn new(rating: f64) -> Self {
        Self {
            first: rating,
            last: rating,
            sum: rating,
            count: 1,
        }
    }

    fn push(&mut self, rating: f64) {
        self.last = rating;
        self.sum += rating;
        self.count += 1;
    }

    fn resolve(&self, policy: DuplicatePolicy) -> f64 {
        match policy {
            DuplicatePolicy::First | DuplicatePolicy::Error => self.first,
            DuplicatePolicy::Last => self.last,
            DuplicatePolicy::Mean => self.sum / f64::from(self.count),
        }
    }
}

/// Dense user×movie rating matrix with explicit missing entries
///
/// Rows follow ascending user id and columns ascending movie id. A cell is
/// `None` when the user never rated the movie; missing cells are never
/// imputed here.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingMatrix {
    users: Vec<UserId>,
    movies: Vec<MovieId>,
    cells: Vec<Option<f64>>,
}

impl RatingMatrix {
    /// Builds the matrix from a flat sequence of observations
    ///
    /// Fails fast with `EmptyDataset` when there are no observations, with
    /// `InvalidRating` on a non-finite rating and, under
    /// [`DuplicatePolicy::Error`], with `DuplicateObservation` on the first
    /// repeated (user, movie) pair.
    pub fn build(observations: &[Rating], policy: DuplicatePolicy) -> AppResult<Self> {
        if observations.is_empty() {
            return Err(AppError::EmptyDataset);
        }

        let mut accumulated: BTreeMap<(UserId, MovieId), CellAccumulator> = BTreeMap::new();

        for obs in observations {
            if !obs.rating.is_finite() {
                return Err(AppError::InvalidRating {
                    user_id: obs.user_id,
                    movie_id: obs.movie_id,
                    value: obs.rating,
                });
            }

            match accumulated.entry((obs.user_id, obs.movie_id)) {
                Entry::Vacant(slot) => {
                    slot.insert(CellAccumulator::new(obs.rating));
                }
                Entry::Occupied(mut slot) => {
                    if policy == DuplicatePolicy::Error {
                        return Err(AppError::DuplicateObservation {
                            user_id: obs.user_id,
                            movie_id: obs.movie_id,
                        });
                    }
                    slot.get_mut().push(obs.rating);
                }
            }
        }

        let users: Vec<UserId> = accumulated
            .keys()
            .map(|(user, _)| *user)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let movies: Vec<MovieId> = accumulated
            .keys()
            .map(|(_, movie)| *movie)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut cells = vec![None; users.len() * movies.len()];
        for ((user, movie), acc) in &accumulated {
            // Both ids were collected from these keys
            if let (Ok(row), Ok(col)) = (users.binary_search(user), movies.binary_search(movie)) {
                cells[row * movies.len() + col] = Some(acc.resolve(policy));
            }
        }

        tracing::debug!(
            users = users.len(),
            movies = movies.len(),
            observations = observations.len(),
            cells_filled = accumulated.len(),
            ?policy,
            "Built rating matrix"
        );

        Ok(Self {
            users,
            movies,
            cells,
        })
    }

    /// User ids in row order (ascending)
    pub fn users(&self) -> &[UserId] {
        &self.users
    }

    /// Movie ids in column order (ascending)
    pub fn movies(&self) -> &[MovieId] {
        &self.movies
    }

    pub fn contains_user(&self, user_id: UserId) -> bool {
        self.user_index(user_id).is_some()
    }

    pub fn user_index(&self, user_id: UserId) -> Option<usize> {
        self.users.binary_search(&user_id).ok()
    }

    pub fn movie_index(&self, movie_id: MovieId) -> Option<usize> {
        self.movies.binary_search(&movie_id).ok()
    }

    /// The full row of a user, aligned with [`RatingMatrix::movies`]
    pub fn row(&self, user_id: UserId) -> Option<&[Option<f64>]> {
        self.user_index(user_id).map(|i| self.row_at(i))
    }

    pub(crate) fn row_at(&self, index: usize) -> &[Option<f64>] {
        let width = self.movies.len();
        &self.cells[index * width..(index + 1) * width]
    }

    /// Rating of `movie_id` by `user_id`, `None` when missing or unknown
    pub fn get(&self, user_id: UserId, movie_id: MovieId) -> Option<f64> {
        let row = self.user_index(user_id)?;
        let col = self.movie_index(movie_id)?;
        self.cells[row * self.movies.len() + col]
    }

    /// Movies rated by a user, empty for an unknown user
    pub fn rated_movies(&self, user_id: UserId) -> BTreeSet<MovieId> {
        match self.row(user_id) {
            Some(row) => self
                .movies
                .iter()
                .zip(row)
                .filter(|(_, cell)| cell.is_some())
                .map(|(movie, _)| *movie)
                .collect(),
            None => BTreeSet::new(),
        }
    }
}
