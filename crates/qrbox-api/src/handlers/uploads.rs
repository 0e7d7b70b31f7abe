//! Upload listing, detail, and deletion.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use qrbox_core::models::{Pagination, UploadListItem, UploadResponse};
use qrbox_core::AppError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadsPageResponse {
    pub success: bool,
    pub uploads: Vec<UploadListItem>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadDetailResponse {
    pub success: bool,
    pub upload: UploadResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

/// List uploads, newest first.
#[utoipa::path(
    get,
    path = "/api/uploads",
    tag = "uploads",
    params(
        ("limit" = Option<i64>, Query, description = "Page size, capped at 100 (default 50)"),
        ("offset" = Option<i64>, Query, description = "Rows to skip (default 0)")
    ),
    responses(
        (status = 200, description = "Page of uploads with code counts", body = UploadsPageResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn list_uploads(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<UploadsPageResponse>, HttpAppError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0).max(0);

    let (uploads, total) = state.uploads.list(limit, offset).await?;

    Ok(Json(UploadsPageResponse {
        success: true,
        uploads,
        pagination: Pagination::new(total, limit, offset),
    }))
}

/// Get a single upload's details.
#[utoipa::path(
    get,
    path = "/api/uploads/{upload_id}",
    tag = "uploads",
    params(("upload_id" = Uuid, Path, description = "Upload identifier")),
    responses(
        (status = 200, description = "Upload details", body = UploadDetailResponse),
        (status = 404, description = "Unknown upload ID", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn get_upload(
    State(state): State<Arc<AppState>>,
    Path(upload_id): Path<Uuid>,
) -> Result<Json<UploadDetailResponse>, HttpAppError> {
    let upload = state
        .uploads
        .get(upload_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Upload not found".to_string()))?;

    Ok(Json(UploadDetailResponse {
        success: true,
        upload: UploadResponse::from(upload),
    }))
}

/// Delete an upload, its stored files, and (via cascade) its decoded codes.
///
/// File removal is best-effort: the call succeeds even if the file was
/// already gone. A second delete of the same ID returns 404.
#[utoipa::path(
    delete,
    path = "/api/uploads/{upload_id}",
    tag = "uploads",
    params(("upload_id" = Uuid, Path, description = "Upload identifier")),
    responses(
        (status = 200, description = "Upload deleted", body = DeleteResponse),
        (status = 404, description = "Unknown upload ID", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn delete_upload(
    State(state): State<Arc<AppState>>,
    Path(upload_id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, HttpAppError> {
    let deleted = state
        .uploads
        .delete(upload_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Upload not found".to_string()))?;

    state.storage.delete_best_effort(&deleted.filename).await;
    if let Some(artifact) = deleted.generated_qr_path.as_deref() {
        state.storage.delete_best_effort(artifact).await;
    }

    tracing::info!(%upload_id, "Upload deleted");

    Ok(Json(DeleteResponse {
        success: true,
        message: "Upload deleted successfully".to_string(),
    }))
}
