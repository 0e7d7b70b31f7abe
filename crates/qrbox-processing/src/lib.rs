//! Image-side processing: upload validation (size, type, magic bytes), the
//! QR detection engine, payload classification, and QR image generation.

pub mod classifier;
pub mod decoder;
pub mod generator;
pub mod signature;
pub mod validator;

pub use classifier::classify;
pub use decoder::{detect_codes, detect_in_raster, ProcessingError};
pub use generator::{render_qr_png, GenerationError};
pub use signature::{sniff, ImageSignature};
pub use validator::{UploadValidator, ValidationError};
