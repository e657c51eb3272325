//! Error types for Keepsake

use thiserror::Error;

/// Main error type for Keepsake operations
#[derive(Error, Debug)]
pub enum KeepsakeError {
    /// A candidate has no usable timestamp; the whole classification
    /// call is aborted rather than silently misclassifying.
    #[error("Invalid timestamp for candidate '{0}': no date available")]
    InvalidTimestamp(String),

    /// Calendar arithmetic left the representable date range
    #[error("Calendar computation failed for date {0}: out of range")]
    Calendar(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Keepsake operations
pub type Result<T> = std::result::Result<T, KeepsakeError>;
