mod config;
mod db;
mod error;
mod feed;
mod http;
mod kafka;
mod models;
mod notice;
mod processor;
mod service;
mod storage;
#[cfg(test)]
mod testing;

use std::path::Path;
use std::sync::Arc;

use config::AppConfig;
use db::PgAlertStore;
use http::AppState;
use kafka::KafkaChangeStream;
use notice::TracingNotifier;
use service::AlertService;
use storage::LocalObjectStore;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load config
    let config = AppConfig::load()?;

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(&config.log_level)
        .init();

    info!("Starting Relief Alerts Service...");

    // Init DB
    let pool = db::init_pool(&config.database_url).await?;
    info!("Connected to database");
    let store = Arc::new(PgAlertStore::new(pool));

    // Init image storage
    let images = Arc::new(LocalObjectStore::new(&config.storage_dir, &config.storage_public_url).await?);
    info!("Storing images in {}", images.root().display());

    // Start the alert feed on the CDC stream
    let feed = feed::spawn_feed(
        store.clone(),
        Box::new(KafkaChangeStream::new(&config)),
        Arc::new(TracingNotifier),
    );

    let state = Arc::new(AppState {
        service: AlertService::new(store, images),
        feed: feed.view(),
    });
    let app = http::router(
        state,
        Path::new(&config.storage_dir),
        &config.cors_allowed_origins,
    );

    let served = http::start_server(config.http_port, app).await;

    feed.shutdown().await;
    served
}
