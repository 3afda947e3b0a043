use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};

use movie_recs::{
    api::{create_router, AppState},
    error::AppResult,
    models::RatingRow,
    services::{Dataset, DatasetSource, RecommenderSettings},
};

/// Serves a fixed list of datasets, advancing one per load
struct FixtureSource {
    datasets: Vec<Vec<RatingRow>>,
    loads: AtomicUsize,
}

impl FixtureSource {
    fn new(datasets: Vec<Vec<RatingRow>>) -> Self {
        Self {
            datasets,
            loads: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl DatasetSource for FixtureSource {
    async fn load(&self) -> AppResult<Dataset> {
        let index = self.loads.fetch_add(1, Ordering::SeqCst);
        let rows = self
            .datasets
            .get(index.min(self.datasets.len() - 1))
            .cloned()
            .unwrap_or_default();
        Ok(Dataset::from_rows(rows))
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}

fn row(user_id: i64, movie_id: i64, rating: f64) -> RatingRow {
    let (movie_name, genre) = match movie_id {
        1 => ("Toy Story (1995)", "Animation|Comedy"),
        2 => ("Heat (1995)", "Action|Crime"),
        3 => ("Casino (1995)", "Crime|Drama"),
        _ => ("Untitled", "Unknown"),
    };
    RatingRow {
        movie_id,
        movie_name: movie_name.to_string(),
        genre: genre.to_string(),
        user_id,
        rating,
    }
}

/// U1{M1:5,M2:3}, U2{M1:5,M2:3}, U3{M1:1}
fn scenario() -> Vec<RatingRow> {
    vec![
        row(1, 1, 5.0),
        row(1, 2, 3.0),
        row(2, 1, 5.0),
        row(2, 2, 3.0),
        row(3, 1, 1.0),
    ]
}

/// U1 rated only M1, so neighbors contribute M2 and M3
fn open_catalog() -> Vec<RatingRow> {
    vec![
        row(1, 1, 5.0),
        row(2, 1, 5.0),
        row(2, 2, 4.0),
        row(2, 3, 2.0),
        row(3, 1, 1.0),
        row(3, 3, 5.0),
    ]
}

async fn create_test_server(datasets: Vec<Vec<RatingRow>>) -> TestServer {
    let source = Arc::new(FixtureSource::new(datasets));
    let state = AppState::load(source, RecommenderSettings::default(), 1)
        .await
        .unwrap();
    TestServer::new(create_router(state)).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server(vec![scenario()]).await;
    let response = server.get("/health").await;
    response.assert_status_ok();
    response.assert_json(&json!({ "status": "healthy" }));
}

#[tokio::test]
async fn test_request_id_echoed_or_generated() {
    let server = create_test_server(vec![scenario()]).await;

    let response = server
        .get("/users")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("trace-abc"),
        )
        .await;
    assert_eq!(response.header("x-request-id"), "trace-abc");

    let response = server.get("/users").await;
    let generated = response.header("x-request-id");
    assert!(uuid::Uuid::parse_str(generated.to_str().unwrap()).is_ok());
}

#[tokio::test]
async fn test_dataset_summary() {
    let server = create_test_server(vec![scenario()]).await;

    let response = server.get("/dataset").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["source"], "fixture");
    assert_eq!(body["generation"], 1);
    assert_eq!(body["rows"], 5);
    assert_eq!(body["users"], 3);
    assert_eq!(body["movies"], 2);
}

#[tokio::test]
async fn test_users_listed_ascending() {
    let server =
        create_test_server(vec![vec![row(9, 1, 3.0), row(2, 1, 4.0), row(5, 2, 1.0)]]).await;
    server.get("/users").await.assert_json(&json!([2, 5, 9]));
}

#[tokio::test]
async fn test_identical_users_are_nearest_neighbors() {
    let server = create_test_server(vec![scenario()]).await;

    let response = server
        .get("/users/1/neighbors")
        .add_query_param("k", 2)
        .await;
    response.assert_status_ok();

    let neighbors: Vec<Value> = response.json();
    assert_eq!(neighbors.len(), 2);
    assert_eq!(neighbors[0]["user_id"], 2);
    assert_eq!(neighbors[0]["similarity"], 1.0);
    assert_eq!(neighbors[1]["user_id"], 3);
    let second = neighbors[1]["similarity"].as_f64().unwrap();
    assert!((second - 5.0 / 34f64.sqrt()).abs() < 1e-12);
}

#[tokio::test]
async fn test_no_unrated_candidates_gives_empty_recommendations() {
    let server = create_test_server(vec![scenario()]).await;

    let response = server.get("/users/1/recommendations").await;
    response.assert_status_ok();
    response.assert_json(&json!([]));
}

#[tokio::test]
async fn test_recommendations_ranked_and_described() {
    let server = create_test_server(vec![open_catalog()]).await;

    let response = server
        .get("/users/1/recommendations")
        .add_query_param("n", 5)
        .await;
    response.assert_status_ok();

    response.assert_json(&json!([
        {
            "movie_id": 2,
            "movie_name": "Heat (1995)",
            "genre": "Action|Crime",
            "score": 4.0
        },
        {
            "movie_id": 3,
            "movie_name": "Casino (1995)",
            "genre": "Crime|Drama",
            "score": 3.5
        }
    ]));

    let response = server
        .get("/users/1/recommendations")
        .add_query_param("n", 1)
        .await;
    let truncated: Vec<Value> = response.json();
    assert_eq!(truncated.len(), 1);
    assert_eq!(truncated[0]["movie_id"], 2);
}

#[tokio::test]
async fn test_unknown_user_is_not_found() {
    let server = create_test_server(vec![scenario()]).await;

    for path in [
        "/users/42/recommendations",
        "/users/42/neighbors",
        "/users/42/genres",
    ] {
        let response = server.get(path).await;
        response.assert_status(StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert!(body["error"].as_str().unwrap().contains("42"), "{path}");
    }
}

#[tokio::test]
async fn test_empty_dataset_returns_empty_lists() {
    let server = create_test_server(vec![Vec::new()]).await;

    server.get("/movies/top").await.assert_json(&json!([]));
    server.get("/genres/top").await.assert_json(&json!([]));
    server.get("/users").await.assert_json(&json!([]));
    server
        .get("/users/1/recommendations")
        .await
        .assert_json(&json!([]));
    server.get("/users/1/neighbors").await.assert_json(&json!([]));
    server.get("/users/1/genres").await.assert_json(&json!([]));
}

#[tokio::test]
async fn test_top_movies_and_genres() {
    let server = create_test_server(vec![open_catalog()]).await;

    let response = server.get("/movies/top").add_query_param("n", 2).await;
    response.assert_status_ok();
    let movies: Vec<Value> = response.json();
    assert_eq!(movies.len(), 2);
    // Casino: (2 + 5) / 2 = 3.5, Toy Story: (5 + 5 + 1) / 3, Heat: 4
    assert_eq!(movies[0]["movie_id"], 2);
    assert_eq!(movies[1]["movie_id"], 1);

    let response = server
        .get("/movies/top")
        .add_query_param("min_ratings", 2)
        .await;
    let movies: Vec<Value> = response.json();
    let ids: Vec<i64> = movies.iter().map(|m| m["movie_id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![1, 3]);

    let response = server.get("/genres/top").add_query_param("n", 1).await;
    let genres: Vec<Value> = response.json();
    assert_eq!(genres.len(), 1);
    // Action only holds the single 4.0 rating of Heat
    assert_eq!(genres[0]["genre"], "Action");
}

#[tokio::test]
async fn test_user_genres_sorted_by_count() {
    let server = create_test_server(vec![open_catalog()]).await;

    let response = server
        .get("/users/2/genres")
        .add_query_param("sort_by", "count_ratings")
        .await;
    response.assert_status_ok();
    let genres: Vec<Value> = response.json();

    // Crime is rated twice (Heat, Casino), every other genre once
    assert_eq!(genres[0]["genre"], "Crime");
    assert_eq!(genres[0]["count_ratings"], 2);
    assert_eq!(genres[0]["avg_rating"], 3.0);
}

#[tokio::test]
async fn test_invalid_sort_key_rejected() {
    let server = create_test_server(vec![open_catalog()]).await;

    let response = server
        .get("/users/2/genres")
        .add_query_param("sort_by", "popularity")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reload_swaps_dataset() {
    let server = create_test_server(vec![scenario(), open_catalog()]).await;

    server
        .get("/users/1/recommendations")
        .await
        .assert_json(&json!([]));

    let response = server.post("/dataset/reload").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["generation"], 2);
    assert_eq!(body["rows"], 6);

    let recommendations: Vec<Value> = server.get("/users/1/recommendations").await.json();
    assert_eq!(recommendations.len(), 2);
}
