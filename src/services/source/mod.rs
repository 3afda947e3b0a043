//! Dataset source abstraction
//!
//! The service never reads files itself: it asks a `DatasetSource` for a
//! fresh snapshot at startup and again on every explicit reload.

use crate::{error::AppResult, services::dataset::Dataset};

pub mod columns;
pub mod csv;

pub use self::csv::CsvDatasetSource;

/// Trait for dataset providers
///
/// Implementations return a merged and cleaned [`Dataset`]. Problems with the
/// underlying data (missing files, malformed numbers) are errors; a source
/// must not hand back a partially populated snapshot.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait DatasetSource: Send + Sync {
    /// Loads a complete snapshot
    async fn load(&self) -> AppResult<Dataset>;

    /// Source name for logging and the dataset summary
    fn name(&self) -> &'static str;
}
