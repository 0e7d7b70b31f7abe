//! Route configuration and setup

use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use qrbox_core::Config;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::api_doc::ApiDoc;
use crate::handlers;
use crate::state::AppState;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router> {
    let cors = setup_cors(config)?;

    // Slack above the validator's ceiling so oversize rejections come from
    // validation (with a precise message) rather than the transport layer.
    let body_limit = config.max_file_size_bytes + 1024 * 1024;

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/upload", post(handlers::upload::upload_image))
        .route("/api/results/{upload_id}", get(handlers::results::get_results))
        .route("/api/uploads", get(handlers::uploads::list_uploads))
        .route(
            "/api/uploads/{upload_id}",
            get(handlers::uploads::get_upload).delete(handlers::uploads::delete_upload),
        )
        .route(
            "/api/generate-qr/{upload_id}",
            post(handlers::generate_qr::generate_qr),
        )
        .route("/api/qr/{upload_id}", get(handlers::generate_qr::get_generated_qr))
        .route(
            "/api/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .nest_service("/uploads", ServeDir::new(&config.upload_dir))
        .nest(
            "/docs",
            utoipa_rapidoc::RapiDoc::new("/api/openapi.json")
                .path("/docs")
                .into(),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(ConcurrencyLimitLayer::new(1024))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer> {
    let cors = if config.cors_origins.contains(&"*".to_string()) {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let origins: Result<Vec<HeaderValue>, _> =
            config.cors_origins.iter().map(|o| o.parse()).collect();

        CorsLayer::new()
            .allow_origin(origins.unwrap_or_default())
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers(Any)
    };
    Ok(cors)
}
