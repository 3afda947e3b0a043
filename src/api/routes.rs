use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{make_span_with_request_id, request_id_middleware};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Dataset snapshot
        .route("/dataset", get(handlers::get_dataset))
        .route("/dataset/reload", post(handlers::reload_dataset))
        // Aggregate statistics
        .route("/movies/top", get(handlers::get_top_movies))
        .route("/genres/top", get(handlers::get_top_genres))
        // Per-user queries
        .route("/users", get(handlers::get_users))
        .route("/users/:user_id/genres", get(handlers::get_user_genres))
        .route("/users/:user_id/neighbors", get(handlers::get_user_neighbors))
        .route(
            "/users/:user_id/recommendations",
            get(handlers::get_recommendations),
        )
        // Request id is assigned before the trace span is made
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
