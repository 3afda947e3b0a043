pub mod convert;
pub mod dataset;
pub mod genres;
pub mod matrix;
pub mod neighbors;
pub mod popularity;
pub mod recommendations;
pub mod similarity;
pub mod source;

pub use dataset::{Dataset, DatasetSummary};
pub use genres::{top_genres, user_genre_stats};
pub use matrix::{DuplicatePolicy, RatingMatrix};
pub use neighbors::select_neighbors;
pub use popularity::top_movies;
pub use recommendations::{recommend, RecommenderSettings};
pub use similarity::{SimilarityPolicy, UserSimilarity};
pub use source::{CsvDatasetSource, DatasetSource};
