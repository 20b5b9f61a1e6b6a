use ndarray::prelude::*;

use crate::errors::Result;

/// Abstraction over the inpainting model backend.
///
/// The pipeline is generic over this trait so tests can substitute a mock
/// and so alternative backends can be plugged in without touching the
/// orchestration. Implementations must be safe to share across threads;
/// whether concurrent `predict` calls actually run in parallel is up to
/// the implementation (the ONNX session serializes through a lock).
pub trait InpaintModel: Send + Sync {
    /// Side length of the square input canvas the model expects.
    fn input_size(&self) -> u32;

    /// Run inference on an image tensor `[1, 3, S, S]` and a mask tensor
    /// `[1, 1, S, S]`, returning the inpainted image tensor `[1, 3, S, S]`.
    fn predict(&self, image: ArrayView4<f32>, mask: ArrayView4<f32>) -> Result<Array4<f32>>;
}
