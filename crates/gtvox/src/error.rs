//! Error types for the gtvox facade.

use gtvox_core::GtError;
use thiserror::Error;

use crate::sensor::SensorId;

/// Error type for artifact export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Array archive error: {0}")]
    Npz(#[from] ndarray_npy::WriteNpzError),

    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("Invalid image data")]
    InvalidImageData,
}

/// The main error type of the facade.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] GtError),

    #[error(transparent)]
    Export(#[from] ExportError),

    /// The producer side of a sensor stream is gone.
    #[error("sensor stream '{0}' disconnected")]
    SensorDisconnected(SensorId),

    /// The simulation collaborator failed or was driven out of order.
    #[error("simulator error: {0}")]
    Simulator(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Core(GtError::Io(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Core(GtError::Json(err))
    }
}

/// A specialized Result type for facade operations.
pub type Result<T> = std::result::Result<T, Error>;
