mod config;
mod db;
mod errors;
mod generation;
mod layout;
mod models;
mod narrative;
mod render;
mod repository;
mod resolver;
mod routes;
mod state;
mod storage;
#[cfg(test)]
mod test_support;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, StorageBackend};
use crate::db::create_pool;
use crate::generation::assembler::ResultGenerator;
use crate::render::fonts::FontLibrary;
use crate::repository::PgRepository;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::{DocumentStorage, LocalStorage, S3Storage};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting result documents API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    let repository = Arc::new(PgRepository::new(db));

    // Initialize document storage
    let storage: Arc<dyn DocumentStorage> = match &config.storage {
        StorageBackend::Local { root } => {
            info!("Local storage rooted at {}", root.display());
            Arc::new(LocalStorage::new(root.clone()))
        }
        StorageBackend::S3 {
            bucket,
            endpoint,
            region,
            access_key_id,
            secret_access_key,
        } => {
            let client =
                build_s3_client(endpoint, region, access_key_id, secret_access_key).await;
            info!("S3 storage initialized (bucket: {bucket})");
            Arc::new(S3Storage::new(client, bucket.clone()))
        }
    };

    // Load custom font faces once; missing ones fall back to standard faces
    let fonts = Arc::new(FontLibrary::load(&config.fonts_dir).await);

    let generator = ResultGenerator::new(
        repository.clone(),
        repository.clone(),
        repository,
        storage,
        fonts,
        config.result_category.clone(),
    );

    // Build app state
    let state = AppState {
        config: config.clone(),
        generator,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(
    endpoint: &str,
    region: &str,
    access_key_id: &str,
    secret_access_key: &str,
) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        access_key_id,
        secret_access_key,
        None,
        None,
        "result-documents-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .credentials_provider(credentials)
        .endpoint_url(endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
