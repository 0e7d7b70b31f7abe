//! Application setup and initialization
//!
//! All initialization logic lives here rather than in main.rs: database
//! supervision, storage, the detection queue, and route construction.

pub mod routes;
pub mod server;

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use qrbox_core::Config;
use qrbox_db::{QrCodeRepository, UploadRepository};
use qrbox_storage::LocalStorage;
use qrbox_worker::DetectionQueue;

use crate::state::AppState;

/// Initialize the entire application.
///
/// Ordering matters: the database must be reachable and schema-current
/// before anything else is built, so no request can ever race an
/// unverified store.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    let pool = qrbox_db::connect_with_retry(&config).await?;
    qrbox_db::run_migrations(&pool).await?;

    let storage = LocalStorage::new(
        &config.upload_dir,
        format!("{}/uploads", config.public_base_url.trim_end_matches('/')),
    )
    .await
    .context("Failed to initialize upload storage")?;

    let uploads = UploadRepository::new(pool.clone());
    let qr_codes = QrCodeRepository::new(pool.clone());
    let queue = DetectionQueue::new(uploads.clone(), config.detection_max_workers);

    let state = Arc::new(AppState {
        config: config.clone(),
        pool,
        uploads,
        qr_codes,
        storage,
        queue,
        started_at: Instant::now(),
    });

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
