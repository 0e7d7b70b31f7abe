//! Application state, dependency-injected into every handler.
//!
//! The pool and repositories are owned here and handed out by clone; nothing
//! in the process reaches for a global handle.

use std::time::Instant;

use qrbox_core::Config;
use qrbox_db::{QrCodeRepository, UploadRepository};
use qrbox_storage::LocalStorage;
use qrbox_worker::DetectionQueue;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub pool: PgPool,
    pub uploads: UploadRepository,
    pub qr_codes: QrCodeRepository,
    pub storage: LocalStorage,
    pub queue: DetectionQueue,
    pub started_at: Instant,
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}
