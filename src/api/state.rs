use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    error::AppResult,
    services::{Dataset, DatasetSource, DatasetSummary, RecommenderSettings},
};

/// Shared application state
///
/// Holds the current dataset snapshot behind an explicit handle. Handlers
/// take a cheap `Arc` clone of the snapshot and compute without holding the
/// lock; [`AppState::reload`] is the only way the snapshot changes.
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<RwLock<AppStateInner>>,
    source: Arc<dyn DatasetSource>,
    settings: RecommenderSettings,
    min_ratings_per_movie: usize,
}

/// Inner state replaced on reload
pub struct AppStateInner {
    pub dataset: Arc<Dataset>,
    /// Number of snapshots loaded so far, starting at 1
    pub generation: u64,
}

impl AppState {
    /// Creates state around an already loaded snapshot
    pub fn new(
        source: Arc<dyn DatasetSource>,
        dataset: Dataset,
        settings: RecommenderSettings,
        min_ratings_per_movie: usize,
    ) -> Self {
        Self {
            inner: Arc::new(RwLock::new(AppStateInner {
                dataset: Arc::new(dataset),
                generation: 1,
            })),
            source,
            settings,
            min_ratings_per_movie,
        }
    }

    /// Loads the first snapshot from `source`
    pub async fn load(
        source: Arc<dyn DatasetSource>,
        settings: RecommenderSettings,
        min_ratings_per_movie: usize,
    ) -> AppResult<Self> {
        let dataset = source.load().await?;
        tracing::info!(
            source = source.name(),
            rows = dataset.len(),
            "Initial dataset loaded"
        );
        Ok(Self::new(source, dataset, settings, min_ratings_per_movie))
    }

    /// Current snapshot
    pub async fn dataset(&self) -> Arc<Dataset> {
        self.inner.read().await.dataset.clone()
    }

    pub async fn generation(&self) -> u64 {
        self.inner.read().await.generation
    }

    /// Replaces the snapshot with a fresh load from the source
    ///
    /// On failure the previous snapshot stays in place.
    pub async fn reload(&self) -> AppResult<DatasetSummary> {
        let dataset = self.source.load().await?;
        let summary = dataset.summary();

        let mut inner = self.inner.write().await;
        inner.dataset = Arc::new(dataset);
        inner.generation += 1;

        tracing::info!(
            source = self.source.name(),
            generation = inner.generation,
            rows = summary.rows,
            "Dataset reloaded"
        );

        Ok(summary)
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    pub fn settings(&self) -> RecommenderSettings {
        self.settings
    }

    pub fn min_ratings_per_movie(&self) -> usize {
        self.min_ratings_per_movie
    }
}
