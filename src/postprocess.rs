//! Reconstruction of displayable pixels from the raw inference output.

use image::RgbaImage;
use ndarray::prelude::*;

use crate::errors::Result;
use crate::tensor;

/// Output reconstruction quality.
///
/// Both modes currently run the identical denormalization; callers select
/// one explicitly, and the switch is kept so the enhanced path can diverge
/// without touching call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostprocessMode {
    #[default]
    Basic,
    Enhanced,
}

impl PostprocessMode {
    pub fn from_flag(enhanced: bool) -> Self {
        if enhanced {
            Self::Enhanced
        } else {
            Self::Basic
        }
    }
}

/// Convert the model output tensor `[1, 3, H, W]` into an opaque RGBA
/// buffer at fixed-canvas resolution.
pub fn reconstruct(output: ArrayView4<f32>, mode: PostprocessMode) -> Result<RgbaImage> {
    match mode {
        PostprocessMode::Basic => tensor::decode_image(output),
        PostprocessMode::Enhanced => tensor::decode_image(output),
    }
}
