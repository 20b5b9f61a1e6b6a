//! Aspect-preserving placement of arbitrary-size images onto the fixed
//! square canvas the model requires.

use image::{imageops, imageops::FilterType, Rgba, RgbaImage};

use crate::errors::{InpaintError, Result};
use crate::rasterops::{centered_offset, fill_and_overlay};

/// Canvas fill for the area the scaled content does not cover.
const CANVAS_FILL: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// A `side x side` canvas plus the placement used to produce it.
///
/// The scale and offsets are enough to project canvas coordinates back to
/// the source image if a caller ever needs original-resolution output.
#[derive(Debug, Clone)]
pub struct FixedCanvas {
    pub canvas: RgbaImage,
    pub scale: f32,
    pub dx: u32,
    pub dy: u32,
    pub scaled_w: u32,
    pub scaled_h: u32,
}

impl FixedCanvas {
    pub fn side(&self) -> u32 {
        self.canvas.width()
    }
}

/// Fit `image` into a `side x side` canvas: scale by
/// `min(side/w, side/h)` with bilinear resampling, center, and pad the
/// rest with black. The same source dimensions always produce the same
/// placement, so an image and its mask resampled separately stay aligned.
pub fn fit_to_canvas(image: &RgbaImage, side: u32) -> Result<FixedCanvas> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(InpaintError::InvalidInput {
            reason: format!("cannot resample a {width}x{height} image"),
        });
    }
    if side == 0 {
        return Err(InpaintError::InvalidInput {
            reason: "target canvas side is zero".to_string(),
        });
    }

    let scale = (side as f32 / width as f32).min(side as f32 / height as f32);
    let scaled_w = ((width as f32 * scale).round() as u32).clamp(1, side);
    let scaled_h = ((height as f32 * scale).round() as u32).clamp(1, side);

    // centered_offset cannot fail here: scaled dims are clamped to side
    let dx = centered_offset(side, scaled_w).expect("scaled width fits canvas");
    let dy = centered_offset(side, scaled_h).expect("scaled height fits canvas");

    let resized = imageops::resize(image, scaled_w, scaled_h, FilterType::Triangle);
    let canvas = fill_and_overlay(&resized, side, side, dx, dy, CANVAS_FILL);

    Ok(FixedCanvas {
        canvas,
        scale,
        dx,
        dy,
        scaled_w,
        scaled_h,
    })
}
