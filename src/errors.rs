use std::path::PathBuf;

use thiserror::Error;

/// Error type covering every failure the inpainting pipeline can surface.
///
/// Each stage either completes fully or returns exactly one of these
/// variants; there is no partial recovery and no internal retry. Variants
/// carry the context (stage, shapes, paths) needed to diagnose a failure
/// without parsing error strings.
#[derive(Error, Debug)]
pub enum InpaintError {
    /// Model artifact could not be fetched or parsed into a session.
    #[error("model load failed: {operation}")]
    ModelLoad {
        operation: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Model artifact could not be downloaded from its URL.
    #[error("model download failed for {url}")]
    ModelDownload {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Backend threw while executing the graph.
    #[error("inference failed: {operation}")]
    Inference {
        operation: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Tensor or buffer dimensions do not match what was declared.
    #[error("shape mismatch in {context}: expected {expected}, got {actual}")]
    Shape {
        context: String,
        expected: String,
        actual: String,
    },

    /// Caller-supplied inputs are inconsistent with each other.
    #[error("validation failed: {reason}")]
    Validation { reason: String },

    /// Degenerate input that no stage can operate on.
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    /// Decoding or encoding an image failed.
    #[error("image processing failed: {operation} ({path})")]
    ImageProcessing {
        path: String,
        operation: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Filesystem access failed.
    #[error("filesystem error: {operation} failed for {path:?}")]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, InpaintError>;

impl InpaintError {
    pub(crate) fn shape(
        context: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::Shape {
            context: context.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

/// ONNX Runtime errors outside of session construction are execution
/// failures. Load paths wrap their errors as `ModelLoad` explicitly.
impl From<ort::Error> for InpaintError {
    fn from(err: ort::Error) -> Self {
        Self::Inference {
            operation: "ort execution".to_string(),
            source: Box::new(err),
        }
    }
}

impl From<ndarray::ShapeError> for InpaintError {
    fn from(err: ndarray::ShapeError) -> Self {
        Self::Shape {
            context: "tensor reshape".to_string(),
            expected: "4-dimensional".to_string(),
            actual: err.to_string(),
        }
    }
}

impl From<image::ImageError> for InpaintError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageProcessing {
            path: "unknown".to_string(),
            operation: "image processing".to_string(),
            source: Box::new(err),
        }
    }
}

impl From<std::io::Error> for InpaintError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from("unknown"),
            operation: "unknown".to_string(),
            source: err,
        }
    }
}
