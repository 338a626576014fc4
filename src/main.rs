mod api;
mod artifact_store;
mod config;
mod embedding;
mod error;
mod extract;
mod flatten;
mod indexer;
mod loader;
mod models;
mod samples;
mod schema;
mod tabulate;
mod vector_store;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use config::Config;
use tokio::sync::RwLock;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Document the pipeline endpoints fall back to when no path is given.
    pub current_document: Arc<RwLock<Option<PathBuf>>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "oas_catalog_api=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;
    artifact_store::ensure_dir(&config.data_root)
        .with_context(|| format!("Failed to create data root at {}", config.data_root.display()))?;

    info!(
        database = %config.database_path.display(),
        vectors = %config.vector_path.display(),
        collection = %config.collection,
        samples = %config.samples_dir.display(),
        "Pipeline storage configured"
    );

    let state = AppState {
        config: config.clone(),
        current_document: Arc::new(RwLock::new(None)),
    };

    let app = Router::new()
        .route("/healthz", get(api::healthz))
        .route("/v1/examples", get(api::list_examples))
        .route("/v1/documents", post(api::load_oas))
        .route("/v1/samples", post(api::generate))
        .route("/v1/tables", get(api::tables).post(api::tabulate))
        .route("/v1/tables/{name}/columns", get(api::table_columns))
        .route("/v1/search", post(api::search))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("oas-catalog-api listening on {}", config.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
