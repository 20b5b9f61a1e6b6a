//! Conversions between RGBA pixel buffers and the channel-planar float
//! tensors the model exchanges.
//!
//! The model contract is `[-1, 1]`-normalized RGB in `[1, 3, H, W]` order
//! for images and a binary `[1, 1, H, W]` plane for masks. Alpha never
//! crosses the tensor boundary: it is dropped on encode and forced to 255
//! on decode.

use image::{DynamicImage, RgbaImage};
use ndarray::prelude::*;
use nshare::AsNdarray3;

use crate::errors::{InpaintError, Result};

/// Channel average above which a mask pixel counts as "remove this".
const MASK_THRESHOLD: f32 = 128.0;

fn check_dims(context: &str, image: &RgbaImage, side: u32) -> Result<()> {
    let (w, h) = image.dimensions();
    if (w, h) != (side, side) {
        return Err(InpaintError::shape(
            context,
            format!("{side}x{side}"),
            format!("{w}x{h}"),
        ));
    }
    Ok(())
}

/// Encode an RGBA buffer of exactly `side x side` into an image tensor
/// `[1, 3, side, side]`, mapping each channel byte to `v / 127.5 - 1`.
pub fn encode_image(image: &RgbaImage, side: u32) -> Result<Array4<f32>> {
    check_dims("encode_image", image, side)?;

    let rgb = DynamicImage::ImageRgba8(image.clone()).into_rgb8();
    let tensor = rgb
        .as_ndarray3()
        .slice_move(s![NewAxis, .., .., ..])
        .map(|v| f32::from(*v) / 127.5 - 1.0);
    Ok(tensor)
}

/// Encode an RGBA buffer of exactly `side x side` into a mask tensor
/// `[1, 1, side, side]`: 1.0 where the RGB average exceeds the threshold,
/// 0.0 elsewhere.
pub fn encode_mask(image: &RgbaImage, side: u32) -> Result<Array4<f32>> {
    check_dims("encode_mask", image, side)?;

    let side = side as usize;
    let mut tensor = Array4::<f32>::zeros((1, 1, side, side));
    for (x, y, pixel) in image.enumerate_pixels() {
        let [r, g, b, _] = pixel.0;
        let avg = (f32::from(r) + f32::from(g) + f32::from(b)) / 3.0;
        if avg > MASK_THRESHOLD {
            tensor[[0, 0, y as usize, x as usize]] = 1.0;
        }
    }
    Ok(tensor)
}

/// Decode an image tensor `[1, 3, H, W]` back into interleaved RGBA.
///
/// The inverse mapping is `round((v + 1) * 127.5)` clamped to `[0, 255]`;
/// clamping (rather than a raw integer cast) keeps floating-point noise
/// outside the nominal range from wrapping. Alpha is 255 everywhere.
pub fn decode_image(tensor: ArrayView4<f32>) -> Result<RgbaImage> {
    let shape = tensor.shape();
    if shape[0] != 1 || shape[1] != 3 {
        return Err(InpaintError::shape(
            "decode_image",
            "[1, 3, H, W]",
            format!("{shape:?}"),
        ));
    }
    let (height, width) = (shape[2], shape[3]);

    let mut image = RgbaImage::new(width as u32, height as u32);
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let (xi, yi) = (x as usize, y as usize);
        let r = denormalize(tensor[[0, 0, yi, xi]]);
        let g = denormalize(tensor[[0, 1, yi, xi]]);
        let b = denormalize(tensor[[0, 2, yi, xi]]);
        pixel.0 = [r, g, b, 255];
    }
    Ok(image)
}

#[inline]
fn denormalize(value: f32) -> u8 {
    ((value + 1.0) * 127.5).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn image_round_trip_within_one() -> Result<()> {
        let mut image = RgbaImage::new(16, 16);
        for (x, y, pixel) in image.enumerate_pixels_mut() {
            pixel.0 = [x as u8 * 16, y as u8 * 16, (x + y) as u8 * 8, 255];
        }

        let tensor = encode_image(&image, 16)?;
        let decoded = decode_image(tensor.view())?;

        for (a, b) in image.pixels().zip(decoded.pixels()) {
            for c in 0..3 {
                let diff = i16::from(a.0[c]).abs_diff(i16::from(b.0[c]));
                assert!(diff <= 1, "channel {c} diverged: {} vs {}", a.0[c], b.0[c]);
            }
            assert_eq!(b.0[3], 255);
        }
        Ok(())
    }

    #[test]
    fn image_tensor_is_channel_planar() -> Result<()> {
        let mut image = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]));
        image.put_pixel(1, 0, Rgba([255, 0, 0, 255]));

        let tensor = encode_image(&image, 2)?;
        assert_eq!(tensor.shape(), &[1, 3, 2, 2]);
        // red channel plane holds the hot pixel, green/blue stay at -1
        assert_eq!(tensor[[0, 0, 0, 1]], 1.0);
        assert_eq!(tensor[[0, 1, 0, 1]], -1.0);
        assert_eq!(tensor[[0, 2, 0, 1]], -1.0);
        Ok(())
    }

    #[test]
    fn mask_all_white_is_all_ones() -> Result<()> {
        let mask = RgbaImage::from_pixel(8, 8, Rgba([255, 255, 255, 255]));
        let tensor = encode_mask(&mask, 8)?;
        assert_eq!(tensor.shape(), &[1, 1, 8, 8]);
        assert!(tensor.iter().all(|&v| v == 1.0));
        Ok(())
    }

    #[test]
    fn mask_all_black_is_all_zeros() -> Result<()> {
        let mask = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 255]));
        let tensor = encode_mask(&mask, 8)?;
        assert!(tensor.iter().all(|&v| v == 0.0));
        Ok(())
    }

    #[test]
    fn mask_binarization_is_idempotent() -> Result<()> {
        let mut mask = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        mask.put_pixel(2, 1, Rgba([255, 255, 255, 255]));
        mask.put_pixel(3, 3, Rgba([255, 255, 255, 255]));

        let first = encode_mask(&mask, 4)?;

        // re-binarize: rebuild a 0/255 buffer from the tensor and encode again
        let mut rebuilt = RgbaImage::new(4, 4);
        for (x, y, pixel) in rebuilt.enumerate_pixels_mut() {
            let v = if first[[0, 0, y as usize, x as usize]] > 0.5 {
                255
            } else {
                0
            };
            pixel.0 = [v, v, v, 255];
        }
        let second = encode_mask(&rebuilt, 4)?;

        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn mask_threshold_is_exclusive() -> Result<()> {
        // exactly 128 averages to 128.0, which is not strictly above the
        // threshold and must stay inactive
        let at = RgbaImage::from_pixel(1, 1, Rgba([128, 128, 128, 255]));
        let above = RgbaImage::from_pixel(1, 1, Rgba([129, 129, 129, 255]));
        assert_eq!(encode_mask(&at, 1)?[[0, 0, 0, 0]], 0.0);
        assert_eq!(encode_mask(&above, 1)?[[0, 0, 0, 0]], 1.0);
        Ok(())
    }

    #[test]
    fn mismatched_dims_fail_with_shape_error() {
        let image = RgbaImage::new(4, 8);
        let err = encode_image(&image, 8).unwrap_err();
        assert!(matches!(err, InpaintError::Shape { .. }));

        let err = encode_mask(&image, 8).unwrap_err();
        assert!(matches!(err, InpaintError::Shape { .. }));
    }

    #[test]
    fn decode_rejects_wrong_channel_count() {
        let tensor = Array4::<f32>::zeros((1, 1, 4, 4));
        let err = decode_image(tensor.view()).unwrap_err();
        assert!(matches!(err, InpaintError::Shape { .. }));
    }

    #[test]
    fn denormalize_clamps_noise() {
        assert_eq!(denormalize(-1.2), 0);
        assert_eq!(denormalize(1.2), 255);
        assert_eq!(denormalize(0.0), 128);
    }
}
