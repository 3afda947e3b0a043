use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

use ::csv::{ReaderBuilder, StringRecord, Trim};

use crate::{
    error::{AppError, AppResult},
    services::dataset::{Dataset, MovieRecord, RatingRecord},
};

use super::{
    columns::{MovieColumns, RatingColumns},
    DatasetSource,
};

/// File names tried, in order, when no movies file is configured
pub const MOVIES_CANDIDATES: &[&str] = &["movies.csv", "movies_data.csv", "movies_dataset.csv"];

/// File names tried, in order, when no ratings file is configured
pub const RATINGS_CANDIDATES: &[&str] = &["ratings.csv", "ratings_data.csv"];

/// Cell values read as missing rather than parsed
const NULL_TOKENS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL"];

/// Loads `movies.csv` / `ratings.csv` style files from a data directory
#[derive(Debug, Clone)]
pub struct CsvDatasetSource {
    data_dir: PathBuf,
    movies_file: Option<String>,
    ratings_file: Option<String>,
}

impl CsvDatasetSource {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            movies_file: None,
            ratings_file: None,
        }
    }

    /// Tries the given file names before the default candidates
    pub fn with_files(mut self, movies_file: Option<String>, ratings_file: Option<String>) -> Self {
        self.movies_file = movies_file;
        self.ratings_file = ratings_file;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Reads, merges and cleans both tables on the calling thread
    pub fn load_blocking(&self) -> AppResult<Dataset> {
        let movies_path = resolve_file(
            &self.data_dir,
            self.movies_file.as_deref(),
            MOVIES_CANDIDATES,
            "movies",
        )?;
        let ratings_path = resolve_file(
            &self.data_dir,
            self.ratings_file.as_deref(),
            RATINGS_CANDIDATES,
            "ratings",
        )?;

        tracing::info!(path = %movies_path.display(), "Loading movies");
        let movies = read_movies(&movies_path)?;

        tracing::info!(path = %ratings_path.display(), "Loading ratings");
        let ratings = read_ratings(&ratings_path)?;

        let dataset = Dataset::from_tables(&movies, &ratings);

        tracing::info!(
            movies_read = movies.len(),
            ratings_read = ratings.len(),
            rows = dataset.len(),
            "Dataset loaded"
        );

        Ok(dataset)
    }
}

#[async_trait::async_trait]
impl DatasetSource for CsvDatasetSource {
    async fn load(&self) -> AppResult<Dataset> {
        let source = self.clone();
        tokio::task::spawn_blocking(move || source.load_blocking())
            .await
            .map_err(|e| AppError::Internal(format!("Dataset load task failed: {}", e)))?
    }

    fn name(&self) -> &'static str {
        "csv"
    }
}

/// First existing file among `preferred` and `candidates` inside `dir`
pub fn resolve_file(
    dir: &Path,
    preferred: Option<&str>,
    candidates: &[&str],
    kind: &'static str,
) -> AppResult<PathBuf> {
    let tried: Vec<String> = preferred
        .into_iter()
        .chain(candidates.iter().copied())
        .map(str::to_string)
        .collect();

    tried
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
        .ok_or_else(|| AppError::DatasetNotFound {
            kind,
            dir: dir.display().to_string(),
            tried,
        })
}

/// Reads a movies table, resolving header aliases
pub fn read_movies(path: &Path) -> AppResult<Vec<MovieRecord>> {
    let file = file_label(path);
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)?;
    let columns = MovieColumns::resolve(reader.headers()?, &file)?;

    let mut movies = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = line_of(&record);
        movies.push(MovieRecord {
            movie_id: parse_cell(&record, columns.movie_id, &file, line, "movieId")?,
            movie_name: text_cell(&record, columns.movie_name),
            genre: text_cell(&record, columns.genre),
        });
    }

    Ok(movies)
}

/// Reads a ratings table, resolving header aliases
///
/// Empty or null-like cells become missing values. Anything else that does
/// not parse, or a rating that is not finite, fails the whole read with
/// `MalformedField`.
pub fn read_ratings(path: &Path) -> AppResult<Vec<RatingRecord>> {
    let file = file_label(path);
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)?;
    let columns = RatingColumns::resolve(reader.headers()?, &file)?;

    let mut ratings = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = line_of(&record);
        ratings.push(RatingRecord {
            user_id: parse_cell(&record, columns.user_id, &file, line, "userId")?,
            movie_id: parse_cell(&record, columns.movie_id, &file, line, "movieId")?,
            rating: parse_rating(&record, columns.rating, &file, line)?,
        });
    }

    Ok(ratings)
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

fn is_null(value: &str) -> bool {
    NULL_TOKENS.contains(&value)
}

fn text_cell(record: &StringRecord, index: usize) -> Option<String> {
    record
        .get(index)
        .filter(|value| !is_null(value))
        .map(str::to_string)
}

fn parse_cell<T: FromStr>(
    record: &StringRecord,
    index: usize,
    file: &str,
    line: u64,
    column: &'static str,
) -> AppResult<Option<T>> {
    let Some(value) = record.get(index).filter(|value| !is_null(value)) else {
        return Ok(None);
    };

    value
        .parse::<T>()
        .map(Some)
        .map_err(|_| AppError::MalformedField {
            file: file.to_string(),
            line,
            column,
            value: value.to_string(),
        })
}

/// Rating cell, which must be finite (`inf` parses as `f64`)
fn parse_rating(
    record: &StringRecord,
    index: usize,
    file: &str,
    line: u64,
) -> AppResult<Option<f64>> {
    match parse_cell::<f64>(record, index, file, line, "rating")? {
        Some(rating) if !rating.is_finite() => Err(AppError::MalformedField {
            file: file.to_string(),
            line,
            column: "rating",
            value: record.get(index).unwrap_or_default().to_string(),
        }),
        rating => Ok(rating),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) {
        fs::write(dir.path().join(name), contents).expect("write fixture");
    }

    #[test]
    fn test_load_blocking_merges_and_cleans() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "movies.csv",
            "movieId,movie_name,genre\n\
             1,Toy Story (1995),Animation|Comedy\n\
             2,\"Heat, Again\",Crime\n",
        );
        write(
            &dir,
            "ratings.csv",
            "userId,movieId,rating\n1,1,4\n1,2,\n2,2,3.5\n2,5,1\n",
        );

        let dataset = CsvDatasetSource::new(dir.path()).load_blocking().unwrap();

        // Missing rating and unknown movie rows are dropped
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.rows()[1].movie_name, "Heat, Again");
        assert_eq!(dataset.rows()[1].rating, 3.5);
        assert_eq!(dataset.user_ids(), vec![1, 2]);
    }

    #[test]
    fn test_alternate_file_names_and_headers() {
        let dir = TempDir::new().unwrap();
        write(&dir, "movies_data.csv", "id,title,genres\n7,Alien,Horror\n");
        write(&dir, "ratings_data.csv", "user_id,movie,score\n3,7,5\n");

        let dataset = CsvDatasetSource::new(dir.path()).load_blocking().unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.rows()[0].genre, "Horror");
    }

    #[test]
    fn test_configured_file_tried_first() {
        let dir = TempDir::new().unwrap();
        write(&dir, "movies.csv", "movieId,movie_name,genre\n1,Default,Drama\n");
        write(&dir, "catalog.csv", "movieId,movie_name,genre\n1,Configured,Drama\n");
        write(&dir, "ratings.csv", "userId,movieId,rating\n1,1,4\n");

        let dataset = CsvDatasetSource::new(dir.path())
            .with_files(Some("catalog.csv".to_string()), None)
            .load_blocking()
            .unwrap();
        assert_eq!(dataset.rows()[0].movie_name, "Configured");
    }

    #[test]
    fn test_missing_files_reported() {
        let dir = TempDir::new().unwrap();
        let err = CsvDatasetSource::new(dir.path()).load_blocking().unwrap_err();
        match err {
            AppError::DatasetNotFound { kind, tried, .. } => {
                assert_eq!(kind, "movies");
                assert_eq!(tried, MOVIES_CANDIDATES);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_rating_fails_loudly() {
        let dir = TempDir::new().unwrap();
        write(&dir, "movies.csv", "movieId,movie_name,genre\n1,Alien,Horror\n");
        write(&dir, "ratings.csv", "userId,movieId,rating\n1,1,4\n2,1,five\n");

        let err = CsvDatasetSource::new(dir.path()).load_blocking().unwrap_err();
        match err {
            AppError::MalformedField {
                file,
                line,
                column,
                value,
            } => {
                assert_eq!(file, "ratings.csv");
                assert_eq!(line, 3);
                assert_eq!(column, "rating");
                assert_eq!(value, "five");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_infinite_rating_fails_loudly() {
        let dir = TempDir::new().unwrap();
        write(&dir, "movies.csv", "movieId,movie_name,genre\n1,Alien,Horror\n2,Heat,Crime\n");

        for token in ["inf", "-inf", "infinity"] {
            write(
                &dir,
                "ratings.csv",
                &format!("userId,movieId,rating\n1,2,3\n2,1,{token}\n"),
            );

            let err = CsvDatasetSource::new(dir.path()).load_blocking().unwrap_err();
            match err {
                AppError::MalformedField {
                    line,
                    column,
                    value,
                    ..
                } => {
                    assert_eq!(line, 3);
                    assert_eq!(column, "rating");
                    assert_eq!(value, token);
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_null_tokens_are_missing() {
        let dir = TempDir::new().unwrap();
        write(&dir, "movies.csv", "movieId,movie_name,genre\n1,Alien,NaN\n2,Heat,Crime\n");
        write(&dir, "ratings.csv", "userId,movieId,rating\n1,1,4\n1,2,NA\n2,2,2\n");

        let dataset = CsvDatasetSource::new(dir.path()).load_blocking().unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.rows()[0].user_id, 2);
    }

    #[test]
    fn test_async_load_via_trait() {
        let dir = TempDir::new().unwrap();
        write(&dir, "movies.csv", "movieId,movie_name,genre\n1,Alien,Horror\n");
        write(&dir, "ratings.csv", "userId,movieId,rating\n1,1,4\n");

        let source = CsvDatasetSource::new(dir.path());
        let dataset = tokio_test::block_on(source.load()).unwrap();

        assert_eq!(dataset.len(), 1);
        assert_eq!(source.name(), "csv");
    }
}
