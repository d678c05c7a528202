//! Central error handling for the auto-exposure pipeline
//!
//! Provides a unified ExposureError enum with consistent categorization
//! across device setup, validation, encoding and readback.

/// Centralized error type for all exposure operations
#[derive(thiserror::Error, Debug)]
pub enum ExposureError {
    #[error("Device error: {0}")]
    Device(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Readback error: {0}")]
    Readback(String),
}

impl ExposureError {
    /// Convenience constructors for common error types
    pub fn device<T: ToString>(msg: T) -> Self {
        ExposureError::Device(msg.to_string())
    }

    pub fn validation<T: ToString>(msg: T) -> Self {
        ExposureError::Validation(msg.to_string())
    }

    pub fn readback<T: ToString>(msg: T) -> Self {
        ExposureError::Readback(msg.to_string())
    }
}

/// Result type alias for exposure operations
pub type ExposureResult<T> = Result<T, ExposureError>;
