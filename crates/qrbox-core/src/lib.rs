//! Core types shared across the qrbox workspace: configuration, the error
//! taxonomy, and the domain models for uploads and decoded QR codes.

pub mod config;
pub mod error;
pub mod models;

pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
