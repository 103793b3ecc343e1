use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod app;
mod common;
mod config;
mod docs;
mod infrastructure;
mod modules;
mod routes;
mod state;

use config::settings::AppConfig;
use infrastructure::db::pool::{connect_to_db, run_migrations};
use infrastructure::media::{ffmpeg::FfmpegRemuxer, ffprobe::FfProbe};
use infrastructure::storage::s3::StorageService;
use modules::auth::JwtValidator;
use modules::video::repository::VideoRepository;
use modules::video::service::UploadOrchestrator;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tubely=info,tower_http=info")),
        )
        .init();

    info!("Starting server...");

    let config = AppConfig::new().context("Failed to load configuration")?;

    tokio::fs::create_dir_all(&config.upload_tmp_dir)
        .await
        .with_context(|| format!("Failed to create {}", config.upload_tmp_dir.display()))?;

    let db = connect_to_db(&config.database_url)
        .await
        .context("Failed to connect to PostgreSQL")?;
    run_migrations(&db).await.context("Failed to run migrations")?;

    let storage = StorageService::new(
        config.s3_endpoint.as_deref(),
        &config.s3_region,
        &config.s3_access_key,
        &config.s3_secret_key,
    );

    let uploads = UploadOrchestrator::new(
        config.upload_config(),
        Arc::new(JwtValidator::new(&config.jwt_secret)),
        Arc::new(VideoRepository::new(db)),
        Arc::new(storage),
        Arc::new(FfProbe::new(config.ffprobe_path.clone(), config.probe_timeout())),
        Arc::new(FfmpegRemuxer::new(config.ffmpeg_path.clone(), config.remux_timeout())),
    );

    let app = app::create_app(AppState::new(Arc::new(uploads)), config.max_upload_bytes);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running on http://{}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
