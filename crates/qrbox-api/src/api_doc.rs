//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use qrbox_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "qrbox API",
        description = "Image ingestion and QR extraction service: upload an image, poll for decoded codes.",
        version = "0.1.0"
    ),
    paths(
        handlers::upload::upload_image,
        handlers::results::get_results,
        handlers::uploads::list_uploads,
        handlers::uploads::get_upload,
        handlers::uploads::delete_upload,
        handlers::generate_qr::generate_qr,
        handlers::generate_qr::get_generated_qr,
        handlers::health::health,
    ),
    components(schemas(
        error::ErrorResponse,
        handlers::upload::UploadAcceptedResponse,
        handlers::uploads::UploadsPageResponse,
        handlers::uploads::UploadDetailResponse,
        handlers::uploads::DeleteResponse,
        handlers::generate_qr::GeneratedQrResponse,
        handlers::health::HealthResponse,
        handlers::health::QuickHealthResponse,
        models::ProcessingStatus,
        models::QrContentKind,
        models::QrCodeResponse,
        models::Position,
        models::ResultsResponse,
        models::UploadResponse,
        models::UploadListItem,
        models::Pagination,
    )),
    tags(
        (name = "uploads", description = "Upload ingestion, polling, listing, deletion"),
        (name = "qr", description = "Generated QR artifacts"),
        (name = "health", description = "Service health"),
    )
)]
pub struct ApiDoc;
