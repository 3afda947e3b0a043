use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{GenreSortKey, GenreStat, MovieStat, Neighbor, RecommendedMovie, UserGenreStat, UserId},
    services::{
        recommendations::{describe, neighbors_for},
        recommend, top_genres, top_movies, user_genre_stats, DatasetSummary,
    },
};

use super::AppState;

const DEFAULT_TOP_MOVIES: usize = 10;
const DEFAULT_TOP_GENRES: usize = 10;
const DEFAULT_USER_GENRES: usize = 10;
const DEFAULT_RECOMMENDATIONS: usize = 5;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct TopMoviesQuery {
    pub n: Option<usize>,
    pub min_ratings: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub n: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct UserGenresQuery {
    pub n: Option<usize>,
    pub min_ratings: Option<usize>,
    pub sort_by: Option<GenreSortKey>,
}

#[derive(Debug, Deserialize)]
pub struct NeighborsQuery {
    pub k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct DatasetResponse {
    pub source: &'static str,
    pub generation: u64,
    #[serde(flatten)]
    pub summary: DatasetSummary,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Summary of the current dataset snapshot
pub async fn get_dataset(State(state): State<AppState>) -> Json<DatasetResponse> {
    let (dataset, generation) = {
        let inner = state.inner.read().await;
        (inner.dataset.clone(), inner.generation)
    };

    Json(DatasetResponse {
        source: state.source_name(),
        generation,
        summary: dataset.summary(),
    })
}

/// Reloads the dataset from its source and swaps the snapshot
pub async fn reload_dataset(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> AppResult<Json<DatasetResponse>> {
    tracing::info!(request_id = %request_id, source = state.source_name(), "Reloading dataset");

    let summary = state.reload().await?;
    Ok(Json(DatasetResponse {
        source: state.source_name(),
        generation: state.generation().await,
        summary,
    }))
}

/// Highest rated movies
pub async fn get_top_movies(
    State(state): State<AppState>,
    Query(params): Query<TopMoviesQuery>,
) -> Json<Vec<MovieStat>> {
    let n = params.n.unwrap_or(DEFAULT_TOP_MOVIES);
    let min_ratings = params
        .min_ratings
        .unwrap_or_else(|| state.min_ratings_per_movie());

    let dataset = state.dataset().await;
    let movies = top_movies(&dataset, n, min_ratings);

    tracing::info!(n, min_ratings, returned = movies.len(), "Top movies");
    Json(movies)
}

/// Highest rated genres
pub async fn get_top_genres(
    State(state): State<AppState>,
    Query(params): Query<LimitQuery>,
) -> Json<Vec<GenreStat>> {
    let n = params.n.unwrap_or(DEFAULT_TOP_GENRES);
    let dataset = state.dataset().await;
    let genres = top_genres(&dataset, n);

    tracing::info!(n, returned = genres.len(), "Top genres");
    Json(genres)
}

/// Every user id present in the snapshot, ascending
pub async fn get_users(State(state): State<AppState>) -> Json<Vec<UserId>> {
    Json(state.dataset().await.user_ids())
}

/// Genre breakdown of one user's ratings
pub async fn get_user_genres(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Query(params): Query<UserGenresQuery>,
) -> AppResult<Json<Vec<UserGenreStat>>> {
    let dataset = state.dataset().await;
    let stats = user_genre_stats(
        &dataset,
        user_id,
        params.min_ratings.unwrap_or(1),
        params.sort_by.unwrap_or_default(),
        params.n.unwrap_or(DEFAULT_USER_GENRES),
    )?;
    Ok(Json(stats))
}

/// Most similar users to `user_id`
pub async fn get_user_neighbors(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<UserId>,
    Query(params): Query<NeighborsQuery>,
) -> AppResult<Json<Vec<Neighbor>>> {
    let settings = state.settings();
    let k = params.k.unwrap_or(settings.neighbor_count);
    tracing::info!(request_id = %request_id, user_id, k, "Processing neighbor request");

    let dataset = state.dataset().await;
    let neighbors = run_blocking(move || neighbors_for(&dataset, user_id, k, &settings)).await?;
    Ok(Json(neighbors))
}

/// Collaborative-filtering recommendations for `user_id`
pub async fn get_recommendations(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<UserId>,
    Query(params): Query<LimitQuery>,
) -> AppResult<Json<Vec<RecommendedMovie>>> {
    let n = params.n.unwrap_or(DEFAULT_RECOMMENDATIONS);
    tracing::info!(request_id = %request_id, user_id, n, "Processing recommendation request");

    let settings = state.settings();
    let dataset = state.dataset().await;
    let movies = run_blocking(move || {
        let recommendations = recommend(&dataset, user_id, n, &settings)?;
        Ok(describe(&dataset, &recommendations))
    })
    .await?;

    Ok(Json(movies))
}

/// Runs a similarity computation off the async workers
async fn run_blocking<T, F>(task: F) -> AppResult<T>
where
    F: FnOnce() -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| AppError::Internal(format!("Query task failed: {}", e)))?
}
