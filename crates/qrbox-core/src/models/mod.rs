pub mod qr_code;
pub mod upload;

pub use qr_code::{NewQrCode, Position, QrCode, QrCodeResponse, QrContentKind};
pub use upload::{
    Pagination, ProcessingStatus, ResultsResponse, Upload, UploadListItem, UploadResponse,
};
