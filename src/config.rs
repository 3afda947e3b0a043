use serde::Deserialize;

use crate::services::{DuplicatePolicy, RecommenderSettings, SimilarityPolicy};

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Directory holding the movies and ratings CSV files
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Movies file name tried before the default candidates
    #[serde(default)]
    pub movies_file: Option<String>,

    /// Ratings file name tried before the default candidates
    #[serde(default)]
    pub ratings_file: Option<String>,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of similar users consulted per recommendation
    #[serde(default = "default_neighbor_count")]
    pub neighbor_count: usize,

    /// zero_fill, mean_center or pairwise
    #[serde(default)]
    pub similarity_policy: SimilarityPolicy,

    /// error, first, last or mean
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,

    /// Minimum ratings a movie needs to appear in the top movies
    #[serde(default = "default_min_ratings_per_movie")]
    pub min_ratings_per_movie: usize,
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_neighbor_count() -> usize {
    5
}

fn default_min_ratings_per_movie() -> usize {
    1
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from explicit key/value pairs
    pub fn from_vars<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter::<_, Config>(vars)
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Collaborative-filtering settings derived from this configuration
    pub fn recommender_settings(&self) -> RecommenderSettings {
        RecommenderSettings {
            neighbor_count: self.neighbor_count,
            similarity: self.similarity_policy,
            duplicates: self.duplicate_policy,
        }
    }

    /// Address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
