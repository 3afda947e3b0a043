use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::models::{MovieId, UserId};

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Unknown user: {0}")]
    UnknownUser(UserId),

    #[error("Duplicate observation for user {user_id} and movie {movie_id}")]
    DuplicateObservation { user_id: UserId, movie_id: MovieId },

    #[error("Dataset contains no rating observations")]
    EmptyDataset,

    #[error("Invalid rating {value} for user {user_id} and movie {movie_id}")]
    InvalidRating {
        user_id: UserId,
        movie_id: MovieId,
        value: f64,
    },

    #[error("No {kind} file found in {dir}. Tried: {tried:?}")]
    DatasetNotFound {
        kind: &'static str,
        dir: String,
        tried: Vec<String>,
    },

    #[error("{file}: missing column {column} (accepted headers: {accepted:?})")]
    MissingColumn {
        file: String,
        column: &'static str,
        accepted: &'static [&'static str],
    },

    #[error("{file}:{line}: malformed {column} value {value:?}")]
    MalformedField {
        file: String,
        line: u64,
        column: &'static str,
        value: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::UnknownUser(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicateObservation { .. }
            | AppError::EmptyDataset
            | AppError::InvalidRating { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::DatasetNotFound { .. }
            | AppError::MissingColumn { .. }
            | AppError::MalformedField { .. }
            | AppError::Io(_)
            | AppError::Csv(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
