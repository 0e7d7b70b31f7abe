use std::path::Path;

use crate::signature;

/// Validation errors for uploaded files
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Invalid file extension: {extension} (allowed: {allowed:?})")]
    InvalidExtension {
        extension: String,
        allowed: Vec<String>,
    },

    #[error("Invalid content type: {content_type} (allowed: {allowed:?})")]
    InvalidContentType {
        content_type: String,
        allowed: Vec<String>,
    },

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Unrecognized image data (no known signature)")]
    UnrecognizedSignature,

    #[error("File signature ({detected}) does not match declared type {declared}")]
    SignatureMismatch { detected: String, declared: String },

    #[error("Empty file")]
    EmptyFile,
}

/// Upload validator
///
/// Checks size, declared content type, extension, and the leading-byte
/// signature of the actual data. Nothing is persisted for a file that fails
/// any of these checks.
pub struct UploadValidator {
    max_file_size: usize,
    allowed_extensions: Vec<String>,
    allowed_content_types: Vec<String>,
}

impl UploadValidator {
    pub fn new(
        max_file_size: usize,
        allowed_extensions: Vec<String>,
        allowed_content_types: Vec<String>,
    ) -> Self {
        Self {
            max_file_size,
            allowed_extensions,
            allowed_content_types,
        }
    }

    /// Validate file size
    pub fn validate_file_size(&self, size: usize) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    /// Validate file extension
    pub fn validate_extension(&self, filename: &str) -> Result<String, ValidationError> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .ok_or_else(|| ValidationError::InvalidFilename(filename.to_string()))?;

        if !self.allowed_extensions.contains(&extension) {
            return Err(ValidationError::InvalidExtension {
                extension,
                allowed: self.allowed_extensions.clone(),
            });
        }

        Ok(extension)
    }

    /// Validate declared content type
    pub fn validate_content_type(&self, content_type: &str) -> Result<(), ValidationError> {
        let normalized = content_type.to_lowercase();

        if !self
            .allowed_content_types
            .iter()
            .any(|ct| ct == &normalized)
        {
            return Err(ValidationError::InvalidContentType {
                content_type: content_type.to_string(),
                allowed: self.allowed_content_types.clone(),
            });
        }

        Ok(())
    }

    /// Validate that the leading bytes carry a known image signature and that
    /// the signature agrees with the declared Content-Type. This rejects
    /// spoofed uploads such as a JPEG renamed to `.png` and declared as
    /// `image/png`.
    pub fn validate_signature(
        &self,
        data: &[u8],
        declared_content_type: &str,
    ) -> Result<(), ValidationError> {
        let detected =
            signature::sniff(data).ok_or(ValidationError::UnrecognizedSignature)?;

        if !detected.matches_content_type(declared_content_type) {
            return Err(ValidationError::SignatureMismatch {
                detected: detected.mime_type().to_string(),
                declared: declared_content_type.to_string(),
            });
        }

        Ok(())
    }

    /// Validate all aspects of an upload. Returns the normalized extension
    /// for building the stored filename.
    pub fn validate_all(
        &self,
        filename: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<String, ValidationError> {
        self.validate_file_size(data.len())?;
        self.validate_content_type(content_type)?;
        let extension = self.validate_extension(filename)?;
        self.validate_signature(data, content_type)?;
        Ok(extension)
    }
}
