//! QR code repository
//!
//! Read-only access to decoded codes. Rows are written by
//! `UploadRepository::complete_with_codes` (inside the terminal-state
//! transaction) and removed only through the parent cascade.

use qrbox_core::models::QrCode;
use qrbox_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

#[derive(Clone)]
pub struct QrCodeRepository {
    pool: PgPool,
}

impl QrCodeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Codes for one upload in strategy-run order.
    #[tracing::instrument(skip(self), fields(db.table = "qr_codes"))]
    pub async fn list_for_upload(&self, upload_id: Uuid) -> Result<Vec<QrCode>, AppError> {
        let codes = sqlx::query_as::<Postgres, QrCode>(
            "SELECT * FROM qr_codes WHERE upload_id = $1 ORDER BY ordinal ASC",
        )
        .bind(upload_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(codes)
    }
}
