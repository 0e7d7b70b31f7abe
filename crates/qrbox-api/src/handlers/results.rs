//! Polling endpoint: upload state plus decoded codes once terminal.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use qrbox_core::models::{ProcessingStatus, QrCodeResponse, ResultsResponse};
use qrbox_core::AppError;
use uuid::Uuid;

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

/// Get processing results for an upload.
///
/// A pure read over persisted state: polling mid-run observes `processing`
/// with an empty code list, never an error or a block on the running
/// detection.
#[utoipa::path(
    get,
    path = "/api/results/{upload_id}",
    tag = "uploads",
    params(("upload_id" = Uuid, Path, description = "Upload identifier")),
    responses(
        (status = 200, description = "Current state and any decoded codes", body = ResultsResponse),
        (status = 404, description = "Unknown upload ID", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn get_results(
    State(state): State<Arc<AppState>>,
    Path(upload_id): Path<Uuid>,
) -> Result<Json<ResultsResponse>, HttpAppError> {
    let upload = state
        .uploads
        .get(upload_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Upload not found".to_string()))?;

    // Codes exist only for completed uploads; skip the query otherwise.
    let qr_codes = if upload.processing_status == ProcessingStatus::Completed {
        state
            .qr_codes
            .list_for_upload(upload_id)
            .await?
            .into_iter()
            .map(QrCodeResponse::from)
            .collect()
    } else {
        Vec::new()
    };

    Ok(Json(ResultsResponse {
        success: true,
        upload_id: upload.id,
        status: upload.processing_status,
        processing_time_ms: upload.processing_time_ms,
        upload_time: upload.uploaded_at,
        original_name: upload.original_name,
        qr_codes,
        error: upload.error_message,
    }))
}
