use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Structural classification of a decoded payload. Annotation only; a code is
/// persisted whatever its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum QrContentKind {
    Url,
    Email,
    Phone,
    Wifi,
    Vcard,
    Geo,
    Sms,
    Text,
}

impl QrContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QrContentKind::Url => "url",
            QrContentKind::Email => "email",
            QrContentKind::Phone => "phone",
            QrContentKind::Wifi => "wifi",
            QrContentKind::Vcard => "vcard",
            QrContentKind::Geo => "geo",
            QrContentKind::Sms => "sms",
            QrContentKind::Text => "text",
        }
    }
}

/// Decoded QR payload as stored in the `qr_codes` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QrCode {
    pub id: Uuid,
    pub upload_id: Uuid,
    pub content: String,
    pub kind: QrContentKind,
    pub position_x: Option<i32>,
    pub position_y: Option<i32>,
    pub confidence: f64,
    /// Strategy-run order within the deduplicated result list.
    pub ordinal: i32,
    pub created_at: DateTime<Utc>,
}

/// A decoded payload produced by the detection engine, not yet persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewQrCode {
    pub content: String,
    pub kind: QrContentKind,
    pub position_x: Option<i32>,
    pub position_y: Option<i32>,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

/// QR code DTO embedded in results payloads.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QrCodeResponse {
    pub content: String,
    pub kind: QrContentKind,
    pub position: Position,
    pub confidence: f64,
}

impl From<QrCode> for QrCodeResponse {
    fn from(code: QrCode) -> Self {
        Self {
            content: code.content,
            kind: code.kind,
            position: Position {
                x: code.position_x.unwrap_or(0),
                y: code.position_y.unwrap_or(0),
            },
            confidence: code.confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&QrContentKind::Url).unwrap(), "\"url\"");
        assert_eq!(
            serde_json::to_string(&QrContentKind::Vcard).unwrap(),
            "\"vcard\""
        );
    }

    #[test]
    fn response_defaults_missing_position_to_origin() {
        let code = QrCode {
            id: Uuid::new_v4(),
            upload_id: Uuid::new_v4(),
            content: "hello".to_string(),
            kind: QrContentKind::Text,
            position_x: None,
            position_y: None,
            confidence: 1.0,
            ordinal: 0,
            created_at: Utc::now(),
        };
        let resp = QrCodeResponse::from(code);
        assert_eq!(resp.position.x, 0);
        assert_eq!(resp.position.y, 0);
    }
}
