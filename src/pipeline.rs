//! End-to-end object-removal orchestration.
//!
//! A strict sequential pipeline: decode, validate, resample, encode,
//! infer, reconstruct, encode output. Any stage failure aborts the call
//! with a single typed error; nothing is retried and no partial result is
//! returned.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine};
use clap::ValueEnum;
use image::{DynamicImage, ImageFormat, RgbaImage};

use crate::errors::{InpaintError, Result};
use crate::postprocess::{self, PostprocessMode};
use crate::rasterops::force_opaque;
use crate::resampler::fit_to_canvas;
use crate::tensor;
use crate::traits::InpaintModel;

/// High-resolution handling strategy.
///
/// Accepted for forward compatibility; the current algorithm always runs
/// the whole canvas through the model, so every variant behaves as
/// `Original`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum HdStrategy {
    #[default]
    Original,
    Tile,
    Crop,
}

/// Options recognized by [`Inpainter::remove_object`].
#[derive(Debug, Clone)]
pub struct RemoveOptions {
    /// Reserved; accepted but currently inert.
    pub hd_strategy: HdStrategy,
    /// Reserved; accepted but currently inert.
    pub strength: f32,
    /// Selects the enhanced reconstruction path.
    pub postprocessing: bool,
}

impl Default for RemoveOptions {
    fn default() -> Self {
        Self {
            hd_strategy: HdStrategy::Original,
            strength: 1.0,
            postprocessing: false,
        }
    }
}

/// The object-removal pipeline, generic over the model seam.
///
/// Holds no mutable state of its own; one `Inpainter` can serve
/// concurrent callers, with inference serialization handled inside the
/// model implementation.
pub struct Inpainter<M: InpaintModel> {
    model: M,
}

impl<M: InpaintModel> Inpainter<M> {
    pub const fn new(model: M) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Remove the masked region from an encoded image, returning PNG
    /// bytes at fixed-canvas resolution.
    ///
    /// The mask must match the source image's dimensions; bright pixels
    /// (RGB average above 128) mark the region to remove.
    pub fn remove_object(
        &self,
        image_bytes: &[u8],
        mask: &RgbaImage,
        options: &RemoveOptions,
    ) -> Result<Vec<u8>> {
        let image = image::load_from_memory(image_bytes)
            .map_err(|e| InpaintError::ImageProcessing {
                path: "in-memory image".to_string(),
                operation: "decode source image".to_string(),
                source: Box::new(e),
            })?
            .into_rgba8();

        let result = self.remove_object_image(&image, mask, options)?;
        encode_png(&result)
    }

    /// Same as [`remove_object`](Self::remove_object), with the PNG
    /// wrapped as a `data:image/png;base64,` URL.
    pub fn remove_object_data_url(
        &self,
        image_bytes: &[u8],
        mask: &RgbaImage,
        options: &RemoveOptions,
    ) -> Result<String> {
        let png = self.remove_object(image_bytes, mask, options)?;
        Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
    }

    /// Pipeline core over already-decoded pixels.
    pub fn remove_object_image(
        &self,
        image: &RgbaImage,
        mask: &RgbaImage,
        options: &RemoveOptions,
    ) -> Result<RgbaImage> {
        let (width, height) = image.dimensions();
        let (mask_w, mask_h) = mask.dimensions();
        if (width, height) != (mask_w, mask_h) {
            tracing::warn!(
                stage = "validation",
                image = %format!("{width}x{height}"),
                mask = %format!("{mask_w}x{mask_h}"),
                "rejecting mismatched inputs"
            );
            return Err(InpaintError::Validation {
                reason: format!(
                    "image is {width}x{height} but mask is {mask_w}x{mask_h}"
                ),
            });
        }

        let side = self.model.input_size();
        tracing::debug!(width, height, side, "resampling inputs");

        let image_canvas = fit_to_canvas(image, side)?;

        // alpha plays no part in mask decisions; force it opaque so the
        // resample blend cannot dilute brush strokes
        let mut opaque_mask = mask.clone();
        force_opaque(&mut opaque_mask);
        let mask_canvas = fit_to_canvas(&opaque_mask, side)?;

        let image_tensor = tensor::encode_image(&image_canvas.canvas, side)?;
        let mask_tensor = tensor::encode_mask(&mask_canvas.canvas, side)?;

        tracing::debug!("running inference");
        let output = self
            .model
            .predict(image_tensor.view(), mask_tensor.view())
            .inspect_err(|e| tracing::error!(stage = "inference", error = %e, "pipeline failed"))?;

        let mode = PostprocessMode::from_flag(options.postprocessing);
        // output stays at fixed-canvas resolution; no re-projection to
        // the source dimensions is performed
        postprocess::reconstruct(output.view(), mode)
    }
}

fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(image.clone())
        .write_to(&mut bytes, ImageFormat::Png)
        .map_err(|e| InpaintError::ImageProcessing {
            path: "in-memory image".to_string(),
            operation: "encode PNG output".to_string(),
            source: Box::new(e),
        })?;
    Ok(bytes.into_inner())
}
