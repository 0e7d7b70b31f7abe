//! Ingestion gateway: validate, persist, schedule detection, return 202.

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use qrbox_core::models::ProcessingStatus;
use qrbox_core::AppError;
use qrbox_processing::UploadValidator;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadAcceptedResponse {
    pub success: bool,
    pub upload_id: Uuid,
    pub status: ProcessingStatus,
    pub message: String,
    pub image_url: String,
}

/// Upload and process an image.
///
/// The response is returned before detection runs; callers poll
/// `/api/results/{uploadId}` until the status turns terminal.
#[utoipa::path(
    post,
    path = "/api/upload",
    tag = "uploads",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 202, description = "Upload accepted, detection scheduled", body = UploadAcceptedResponse),
        (status = 400, description = "Invalid or spoofed file", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "upload_image"))]
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<UploadAcceptedResponse>), HttpAppError> {
    let (original_name, content_type, data) = read_image_field(multipart).await?;

    let validator = UploadValidator::new(
        state.config.max_file_size_bytes,
        state.config.allowed_extensions.clone(),
        state.config.allowed_content_types.clone(),
    );
    let extension = validator.validate_all(&original_name, &content_type, &data)?;

    let id = Uuid::new_v4();
    let stored_filename = format!("{}.{}", id, extension);

    let image_path = state.storage.save(&stored_filename, &data).await?;

    let upload = match state
        .uploads
        .create(
            id,
            &stored_filename,
            &original_name,
            data.len() as i64,
            &content_type,
        )
        .await
    {
        Ok(upload) => upload,
        Err(e) => {
            // The row is the source of truth; without it the stored file is garbage.
            state.storage.delete_best_effort(&stored_filename).await;
            return Err(e.into());
        }
    };

    // Schedule detection out-of-band. The handler holds no completion
    // reference; a submit failure must not leave the row stuck in processing.
    if let Err(e) = state.queue.submit(upload.id, image_path) {
        tracing::error!(upload_id = %upload.id, error = %e, "Failed to schedule detection");
        let message = format!("Failed to schedule detection: {}", e);
        if let Err(mark_err) = state.uploads.mark_failed(upload.id, &message).await {
            tracing::error!(
                upload_id = %upload.id,
                error = %mark_err,
                "Failed to mark unscheduled upload as failed"
            );
        }
    }

    tracing::info!(
        upload_id = %upload.id,
        original_name = %upload.original_name,
        file_size = upload.file_size,
        "Upload accepted"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(UploadAcceptedResponse {
            success: true,
            upload_id: upload.id,
            status: ProcessingStatus::Processing,
            message: "Image uploaded successfully, processing QR codes...".to_string(),
            image_url: state.storage.url_for(&upload.filename),
        }),
    ))
}

/// Pull the first file field out of the multipart body.
async fn read_image_field(
    mut multipart: Multipart,
) -> Result<(String, String, Vec<u8>), HttpAppError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        HttpAppError(AppError::InvalidInput(format!(
            "Malformed multipart body: {}",
            e
        )))
    })? {
        if field.file_name().is_none() {
            continue;
        }

        let original_name = field
            .file_name()
            .unwrap_or("upload")
            .to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field.bytes().await.map_err(|e| {
            HttpAppError(AppError::InvalidInput(format!(
                "Failed to read file data: {}",
                e
            )))
        })?;

        return Ok((original_name, content_type, data.to_vec()));
    }

    Err(HttpAppError(AppError::InvalidInput(
        "No image file provided".to_string(),
    )))
}
