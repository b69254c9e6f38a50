//! Error types for gtvox.

use thiserror::Error;

/// The main error type for gtvox operations.
#[derive(Error, Debug)]
pub enum GtError {
    /// A raw sensor buffer does not have the size its header promises.
    #[error("{what} buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSize {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A stage received (or produced) no points where at least one is required.
    #[error("empty point set in {0}")]
    EmptyPointSet(&'static str),

    /// Calibration matrices that cannot be used for reprojection.
    #[error("invalid calibration for sensor '{sensor}' at frame {frame}: {reason}")]
    InvalidCalibration {
        sensor: String,
        frame: u64,
        reason: String,
    },

    /// A depth sample that is NaN or infinite.
    #[error("non-finite depth for sensor '{sensor}' at frame {frame}, pixel ({}, {})", .pixel.0, .pixel.1)]
    InvalidDepth {
        sensor: String,
        frame: u64,
        pixel: (u32, u32),
    },

    /// A configuration value outside its valid domain.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Data size mismatch.
    #[error("data size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for gtvox operations.
pub type Result<T> = std::result::Result<T, GtError>;
