//! Health endpoint with a full and a quick variant.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sysinfo::System;
use utoipa::ToSchema;

use crate::state::AppState;

const DB_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
pub struct HealthQuery {
    #[serde(default)]
    pub quick: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseHealth {
    pub connected: bool,
    pub tables_exist: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemoryHealth {
    pub used_mb: u64,
    pub total_mb: u64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub uptime_secs: u64,
    pub environment: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    pub database: DatabaseHealth,
    pub memory: MemoryHealth,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuickHealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub uptime_secs: u64,
    pub database: bool,
    pub memory_mb: u64,
}

fn memory_stats() -> MemoryHealth {
    let mut sys = System::new();
    sys.refresh_memory();
    MemoryHealth {
        used_mb: sys.used_memory() / 1024 / 1024,
        total_mb: sys.total_memory() / 1024 / 1024,
    }
}

async fn database_connected(state: &AppState) -> bool {
    matches!(
        tokio::time::timeout(DB_CHECK_TIMEOUT, qrbox_db::ping(&state.pool)).await,
        Ok(Ok(()))
    )
}

/// Service health.
///
/// `?quick=true` runs only the connectivity probe, for frequent polling.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    params(("quick" = Option<bool>, Query, description = "Lightweight variant for frequent polling")),
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse)
    )
)]
pub async fn health(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HealthQuery>,
) -> Response {
    let uptime_secs = state.started_at.elapsed().as_secs();
    let connected = database_connected(&state).await;
    let status_code = if connected {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    if query.quick {
        let memory = memory_stats();
        let body = QuickHealthResponse {
            status: if connected { "healthy" } else { "unhealthy" }.to_string(),
            timestamp: Utc::now(),
            uptime_secs,
            database: connected,
            memory_mb: memory.used_mb,
        };
        return (status_code, Json(body)).into_response();
    }

    let tables_exist = if connected {
        match tokio::time::timeout(DB_CHECK_TIMEOUT, qrbox_db::tables_exist(&state.pool)).await {
            Ok(Ok(exist)) => exist,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Table existence check failed");
                false
            }
            Err(_) => {
                tracing::warn!("Table existence check timed out");
                false
            }
        }
    } else {
        false
    };

    let body = HealthResponse {
        status: if connected { "healthy" } else { "unhealthy" }.to_string(),
        timestamp: Utc::now(),
        uptime_secs,
        environment: state.config.environment.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        hostname: hostname::get().ok().and_then(|h| h.into_string().ok()),
        database: DatabaseHealth {
            connected,
            tables_exist,
        },
        memory: memory_stats(),
    };

    (status_code, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_stats_are_plausible() {
        let memory = memory_stats();
        assert!(memory.total_mb > 0);
        assert!(memory.used_mb <= memory.total_mb);
    }

    #[test]
    fn health_response_shape() {
        let body = HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now(),
            uptime_secs: 42,
            environment: "development".to_string(),
            version: "0.1.0".to_string(),
            hostname: None,
            database: DatabaseHealth {
                connected: true,
                tables_exist: true,
            },
            memory: MemoryHealth {
                used_mb: 100,
                total_mb: 2000,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json.pointer("/database/connected"),
            Some(&serde_json::Value::Bool(true))
        );
        assert_eq!(
            json.pointer("/database/tablesExist"),
            Some(&serde_json::Value::Bool(true))
        );
        assert!(json.get("uptimeSecs").is_some());
        assert!(json.get("hostname").is_none());
    }
}
