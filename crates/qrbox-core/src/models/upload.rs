use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::qr_code::QrCodeResponse;

/// Per-upload processing state. Transitions are monotonic:
/// `Processing -> Completed` or `Processing -> Failed`, never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "processing_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Processing,
    Completed,
    Failed,
}

impl ProcessingStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessingStatus::Completed | ProcessingStatus::Failed)
    }
}

impl std::fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProcessingStatus::Processing => "processing",
            ProcessingStatus::Completed => "completed",
            ProcessingStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Upload record as stored in the `uploads` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Upload {
    pub id: Uuid,
    /// Stored (uuid-based) filename under the upload directory.
    pub filename: String,
    pub original_name: String,
    pub file_size: i64,
    pub mime_type: String,
    pub uploaded_at: DateTime<Utc>,
    pub processing_status: ProcessingStatus,
    pub processing_time_ms: Option<i64>,
    pub error_message: Option<String>,
    pub qr_generated: bool,
    pub generated_qr_path: Option<String>,
    pub qr_generated_at: Option<DateTime<Utc>>,
}

/// Upload detail DTO returned by `GET /api/uploads/{id}`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub id: Uuid,
    pub filename: String,
    pub original_name: String,
    pub file_size: i64,
    pub mime_type: String,
    pub upload_time: DateTime<Utc>,
    pub status: ProcessingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Upload> for UploadResponse {
    fn from(u: Upload) -> Self {
        Self {
            id: u.id,
            filename: u.filename,
            original_name: u.original_name,
            file_size: u.file_size,
            mime_type: u.mime_type,
            upload_time: u.uploaded_at,
            status: u.processing_status,
            processing_time_ms: u.processing_time_ms,
            error: u.error_message,
        }
    }
}

/// Row of the paginated upload listing, with the decoded-code count joined in.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadListItem {
    pub id: Uuid,
    pub original_name: String,
    pub file_size: i64,
    pub upload_time: DateTime<Utc>,
    pub status: ProcessingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<i64>,
    pub qr_count: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub has_more: bool,
}

impl Pagination {
    pub fn new(total: i64, limit: i64, offset: i64) -> Self {
        Self {
            total,
            limit,
            offset,
            has_more: offset + limit < total,
        }
    }
}

/// Polling payload returned by `GET /api/results/{id}`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResultsResponse {
    pub success: bool,
    pub upload_id: Uuid,
    pub status: ProcessingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<i64>,
    pub upload_time: DateTime<Utc>,
    pub original_name: String,
    pub qr_codes: Vec<QrCodeResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_terminality() {
        assert!(!ProcessingStatus::Processing.is_terminal());
        assert!(ProcessingStatus::Completed.is_terminal());
        assert!(ProcessingStatus::Failed.is_terminal());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ProcessingStatus::Processing).unwrap(),
            "\"processing\""
        );
        assert_eq!(
            serde_json::to_string(&ProcessingStatus::Completed).unwrap(),
            "\"completed\""
        );
    }

    #[test]
    fn pagination_has_more() {
        assert!(Pagination::new(100, 50, 0).has_more);
        assert!(Pagination::new(100, 50, 49).has_more);
        assert!(!Pagination::new(100, 50, 50).has_more);
        assert!(!Pagination::new(0, 50, 0).has_more);
    }
}
