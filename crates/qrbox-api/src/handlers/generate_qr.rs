//! Shareable QR artifact for an upload: generated lazily on first request,
//! idempotent thereafter.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use qrbox_core::models::Upload;
use qrbox_core::AppError;
use qrbox_processing::generator;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedQrResponse {
    pub success: bool,
    pub message: String,
    pub upload_id: Uuid,
    pub qr_image_path: String,
    pub qr_image_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
}

fn artifact_response(state: &AppState, upload: &Upload, message: &str) -> GeneratedQrResponse {
    let path = upload.generated_qr_path.clone().unwrap_or_default();
    GeneratedQrResponse {
        success: true,
        message: message.to_string(),
        upload_id: upload.id,
        qr_image_url: state.storage.url_for(&path),
        qr_image_path: path,
        generated_at: upload.qr_generated_at,
    }
}

/// Generate the shareable QR image for an upload.
#[utoipa::path(
    post,
    path = "/api/generate-qr/{upload_id}",
    tag = "qr",
    params(("upload_id" = Uuid, Path, description = "Upload identifier")),
    responses(
        (status = 200, description = "Artifact generated or already present", body = GeneratedQrResponse),
        (status = 404, description = "Unknown upload ID", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn generate_qr(
    State(state): State<Arc<AppState>>,
    Path(upload_id): Path<Uuid>,
) -> Result<Json<GeneratedQrResponse>, HttpAppError> {
    let upload = state
        .uploads
        .get(upload_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Upload not found".to_string()))?;

    if upload.qr_generated && upload.generated_qr_path.is_some() {
        return Ok(Json(artifact_response(
            &state,
            &upload,
            "QR code already exists",
        )));
    }

    // Encode a descriptor of the upload rather than a bare link, so scanners
    // get enough context to render a preview.
    let descriptor = serde_json::json!({
        "type": "image_upload",
        "uploadId": upload.id,
        "imageUrl": state.storage.url_for(&upload.filename),
        "originalName": upload.original_name,
        "uploadTime": upload.uploaded_at,
    });

    let png = generator::render_qr_png(&descriptor.to_string())?;
    let artifact_key = format!("qr-{}.png", upload.id);
    state.storage.save(&artifact_key, &png).await?;

    let claimed = state.uploads.set_generated_qr(upload.id, &artifact_key).await?;
    if !claimed {
        // A concurrent request generated first; serve the winner's artifact.
        state.storage.delete_best_effort(&artifact_key).await;
        let current = state
            .uploads
            .get(upload_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Upload not found".to_string()))?;
        return Ok(Json(artifact_response(
            &state,
            &current,
            "QR code already exists",
        )));
    }

    tracing::info!(%upload_id, artifact = %artifact_key, "Generated QR artifact");

    let refreshed = state
        .uploads
        .get(upload_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Upload not found".to_string()))?;

    Ok(Json(artifact_response(
        &state,
        &refreshed,
        "QR code generated successfully",
    )))
}

/// Fetch the previously generated QR artifact for an upload.
#[utoipa::path(
    get,
    path = "/api/qr/{upload_id}",
    tag = "qr",
    params(("upload_id" = Uuid, Path, description = "Upload identifier")),
    responses(
        (status = 200, description = "Artifact metadata", body = GeneratedQrResponse),
        (status = 404, description = "Unknown upload or no artifact yet", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn get_generated_qr(
    State(state): State<Arc<AppState>>,
    Path(upload_id): Path<Uuid>,
) -> Result<Json<GeneratedQrResponse>, HttpAppError> {
    let upload = state
        .uploads
        .get(upload_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Upload not found".to_string()))?;

    if !upload.qr_generated || upload.generated_qr_path.is_none() {
        return Err(HttpAppError(AppError::NotFound(
            "QR code not found for this upload".to_string(),
        )));
    }

    Ok(Json(artifact_response(&state, &upload, "QR code found")))
}
