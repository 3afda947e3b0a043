use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use movie_recs::{
    api::{create_router, AppState},
    config::Config,
    services::CsvDatasetSource,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "movie_recs=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        data_dir = %config.data_dir,
        neighbor_count = config.neighbor_count,
        similarity = ?config.similarity_policy,
        duplicates = ?config.duplicate_policy,
        "Configuration loaded"
    );

    let source = CsvDatasetSource::new(&config.data_dir)
        .with_files(config.movies_file.clone(), config.ratings_file.clone());
    let state = AppState::load(
        Arc::new(source),
        config.recommender_settings(),
        config.min_ratings_per_movie,
    )
    .await?;

    let app = create_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(address = %address, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
