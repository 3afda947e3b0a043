//! MovieLens 100k conversion.
//!
//! Turns the raw `u.item` / `u.genre` / `u.data` files into the two CSV
//! tables the CSV dataset source reads:
//!
//! - `movies.csv` with header `movieId,movie_name,genre`, genres joined by `|`
//!   (or `Unknown` when no genre flag is set)
//! - `ratings.csv` with header `userId,movieId,rating`, timestamp dropped
//!
//! Raw files are Latin-1 encoded; output is UTF-8.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Serialize;

use crate::{
    error::{AppError, AppResult},
    models::UNKNOWN_GENRE,
};

pub const ITEM_FILE: &str = "u.item";
pub const GENRE_FILE: &str = "u.genre";
pub const DATA_FILE: &str = "u.data";

pub const MOVIES_OUTPUT: &str = "movies.csv";
pub const RATINGS_OUTPUT: &str = "ratings.csv";

/// Index of the first genre flag in a `u.item` line
const FIRST_GENRE_FLAG: usize = 5;

/// Where converted tables were written and how many rows each holds
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ConversionSummary {
    pub movies_path: PathBuf,
    pub movies: usize,
    pub ratings_path: PathBuf,
    pub ratings: usize,
}

/// Converts a MovieLens 100k directory into `movies.csv` and `ratings.csv`
///
/// `out_dir` is created when missing.
pub fn convert_dataset(input_dir: &Path, out_dir: &Path) -> AppResult<ConversionSummary> {
    if !input_dir.is_dir() {
        return Err(AppError::InvalidInput(format!(
            "MovieLens directory {} does not exist",
            input_dir.display()
        )));
    }
    fs::create_dir_all(out_dir)?;

    let movies_path = out_dir.join(MOVIES_OUTPUT);
    let ratings_path = out_dir.join(RATINGS_OUTPUT);

    let movies = convert_items(
        &input_dir.join(ITEM_FILE),
        &input_dir.join(GENRE_FILE),
        &movies_path,
    )?;
    tracing::info!(path = %movies_path.display(), rows = movies, "Wrote movies");

    let ratings = convert_ratings(&input_dir.join(DATA_FILE), &ratings_path)?;
    tracing::info!(path = %ratings_path.display(), rows = ratings, "Wrote ratings");

    Ok(ConversionSummary {
        movies_path,
        movies,
        ratings_path,
        ratings,
    })
}

/// Genre names from `u.genre` (`name|index` lines), in flag order
pub fn load_genres(genre_path: &Path) -> AppResult<Vec<String>> {
    Ok(read_latin1_lines(genre_path)?
        .iter()
        .filter_map(|line| {
            let parts: Vec<&str> = line.split('|').collect();
            (parts.len() >= 2).then(|| parts[0].to_string())
        })
        .collect())
}

/// Writes `movies.csv` from `u.item` and `u.genre`, returning the row count
pub fn convert_items(item_path: &Path, genre_path: &Path, out_path: &Path) -> AppResult<usize> {
    let genres = load_genres(genre_path)?;
    let file = display_name(item_path);

    let mut writer = ::csv::Writer::from_path(out_path)?;
    writer.write_record(["movieId", "movie_name", "genre"])?;

    let mut count = 0;
    for (index, line) in read_latin1_lines(item_path)?.iter().enumerate() {
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split('|').collect();
        if parts.len() < 2 {
            return Err(AppError::MalformedField {
                file: file.clone(),
                line: index as u64 + 1,
                column: "movie_name",
                value: line.clone(),
            });
        }

        let flags = parts.iter().skip(FIRST_GENRE_FLAG).take(genres.len());
        let movie_genres: Vec<&str> = genres
            .iter()
            .zip(flags)
            .filter(|(_, flag)| **flag == "1")
            .map(|(genre, _)| genre.as_str())
            .collect();

        let genre = if movie_genres.is_empty() {
            UNKNOWN_GENRE.to_string()
        } else {
            movie_genres.join("|")
        };

        writer.write_record([parts[0], parts[1], genre.as_str()])?;
        count += 1;
    }

    writer.flush()?;
    Ok(count)
}

/// Writes `ratings.csv` from tab-separated `u.data`, returning the row count
pub fn convert_ratings(data_path: &Path, out_path: &Path) -> AppResult<usize> {
    let file = display_name(data_path);

    let mut writer = ::csv::Writer::from_path(out_path)?;
    writer.write_record(["userId", "movieId", "rating"])?;

    let mut count = 0;
    for (index, line) in read_latin1_lines(data_path)?.iter().enumerate() {
        if line.is_empty() {
            continue;
        }

        // user \t item \t rating \t timestamp
        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() < 4 {
            return Err(AppError::MalformedField {
                file: file.clone(),
                line: index as u64 + 1,
                column: "rating",
                value: line.clone(),
            });
        }

        writer.write_record(&parts[..3])?;
        count += 1;
    }

    writer.flush()?;
    Ok(count)
}

/// Reads a Latin-1 file as trimmed lines
fn read_latin1_lines(path: &Path) -> AppResult<Vec<String>> {
    let bytes = fs::read(path)?;
    // Latin-1 maps each byte to the code point of the same value
    let text: String = bytes.iter().map(|&b| char::from(b)).collect();
    Ok(text.lines().map(|line| line.trim().to_string()).collect())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
