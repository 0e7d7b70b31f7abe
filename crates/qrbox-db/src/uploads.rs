//! Upload repository
//!
//! Owns every read and write against the `uploads` table, including the
//! single terminal-state transition per upload. Terminal writes are guarded
//! with `WHERE processing_status = 'processing'` so a completed or failed
//! row can never be moved again, and completion inserts the decoded codes
//! and flips the status inside one transaction.

use qrbox_core::models::{NewQrCode, ProcessingStatus, Upload, UploadListItem};
use qrbox_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

#[derive(Clone)]
pub struct UploadRepository {
    pool: PgPool,
}

impl UploadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a freshly accepted upload in `processing` state.
    #[tracing::instrument(skip(self), fields(db.table = "uploads", db.operation = "insert"))]
    pub async fn create(
        &self,
        id: Uuid,
        filename: &str,
        original_name: &str,
        file_size: i64,
        mime_type: &str,
    ) -> Result<Upload, AppError> {
        let upload: Upload = sqlx::query_as::<Postgres, Upload>(
            r#"
            INSERT INTO uploads (id, filename, original_name, file_size, mime_type, processing_status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(filename)
        .bind(original_name)
        .bind(file_size)
        .bind(mime_type)
        .bind(ProcessingStatus::Processing)
        .fetch_one(&self.pool)
        .await?;

        Ok(upload)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Upload>, AppError> {
        let upload = sqlx::query_as::<Postgres, Upload>("SELECT * FROM uploads WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(upload)
    }

    /// Newest-first page of uploads with their decoded-code counts, plus the
    /// total row count for pagination.
    pub async fn list(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<UploadListItem>, i64), AppError> {
        let rows = sqlx::query_as::<Postgres, UploadListItem>(
            r#"
            SELECT
                u.id,
                u.original_name,
                u.file_size,
                u.uploaded_at AS upload_time,
                u.processing_status AS status,
                u.processing_time_ms,
                COUNT(q.id) AS qr_count
            FROM uploads u
            LEFT JOIN qr_codes q ON q.upload_id = u.id
            GROUP BY u.id
            ORDER BY u.uploaded_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM uploads")
            .fetch_one(&self.pool)
            .await?;

        Ok((rows, total))
    }

    /// Terminal transition to `completed`: persist the deduplicated codes and
    /// flip the status atomically. Returns false (and writes nothing) if the
    /// upload was not in `processing`, so a repeated or late completion can
    /// never clobber a terminal state.
    #[tracing::instrument(
        skip(self, codes),
        fields(db.table = "uploads", code_count = codes.len())
    )]
    pub async fn complete_with_codes(
        &self,
        id: Uuid,
        codes: &[NewQrCode],
        processing_time_ms: i64,
    ) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE uploads
            SET processing_status = $2, processing_time_ms = $3, error_message = NULL
            WHERE id = $1 AND processing_status = $4
            "#,
        )
        .bind(id)
        .bind(ProcessingStatus::Completed)
        .bind(processing_time_ms)
        .bind(ProcessingStatus::Processing)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        for (ordinal, code) in codes.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO qr_codes (id, upload_id, content, kind, position_x, position_y, confidence, ordinal)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(id)
            .bind(&code.content)
            .bind(code.kind)
            .bind(code.position_x)
            .bind(code.position_y)
            .bind(code.confidence)
            .bind(ordinal as i32)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    /// Terminal transition to `failed`. Same monotonicity guard as
    /// completion; no codes are ever written for a failed upload.
    #[tracing::instrument(skip(self, error_message), fields(db.table = "uploads"))]
    pub async fn mark_failed(&self, id: Uuid, error_message: &str) -> Result<bool, AppError> {
        let updated = sqlx::query(
            r#"
            UPDATE uploads
            SET processing_status = $2, error_message = $3
            WHERE id = $1 AND processing_status = $4
            "#,
        )
        .bind(id)
        .bind(ProcessingStatus::Failed)
        .bind(error_message)
        .bind(ProcessingStatus::Processing)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(updated > 0)
    }

    /// Delete an upload row; `qr_codes` rows go with it via the foreign-key
    /// cascade. Returns the deleted row so the caller can unlink its files.
    #[tracing::instrument(skip(self), fields(db.table = "uploads", db.operation = "delete"))]
    pub async fn delete(&self, id: Uuid) -> Result<Option<Upload>, AppError> {
        let deleted =
            sqlx::query_as::<Postgres, Upload>("DELETE FROM uploads WHERE id = $1 RETURNING *")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(deleted)
    }

    /// Record a generated QR artifact. Guarded on `qr_generated = FALSE`:
    /// returns false when another request got there first, in which case the
    /// caller re-reads and serves the winner's artifact.
    pub async fn set_generated_qr(&self, id: Uuid, artifact_path: &str) -> Result<bool, AppError> {
        let updated = sqlx::query(
            r#"
            UPDATE uploads
            SET qr_generated = TRUE, generated_qr_path = $2, qr_generated_at = now()
            WHERE id = $1 AND qr_generated = FALSE
            "#,
        )
        .bind(id)
        .bind(artifact_path)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(updated > 0)
    }
}
