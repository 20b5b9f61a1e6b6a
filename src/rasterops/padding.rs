use image::{imageops, GenericImageView, ImageBuffer, Pixel, Primitive};
use num_traits::AsPrimitive;

/// Offset that centers a span of `inner` inside a span of `outer`.
///
/// Returns `None` when the content does not fit.
pub fn centered_offset(outer: u32, inner: u32) -> Option<u32> {
    if inner > outer {
        return None;
    }
    Some((outer - inner) / 2)
}

/// Paint a `width x height` canvas with `fill`, then overlay `image` at
/// `(x, y)`. The overlay is clipped by the canvas bounds, so placement
/// computed via [`centered_offset`] never writes out of range.
pub fn fill_and_overlay<I, P, S>(
    image: &I,
    width: u32,
    height: u32,
    x: u32,
    y: u32,
    fill: P,
) -> ImageBuffer<P, Vec<S>>
where
    I: GenericImageView<Pixel = P>,
    P: Pixel<Subpixel = S>,
    S: Primitive,
    u32: AsPrimitive<i64>,
{
    let mut canvas = ImageBuffer::from_pixel(width, height, fill);
    imageops::overlay(&mut canvas, image, x.as_(), y.as_());
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn centered_offset_splits_remainder() {
        assert_eq!(centered_offset(512, 256), Some(128));
        assert_eq!(centered_offset(512, 512), Some(0));
        assert_eq!(centered_offset(512, 513), None);
    }

    #[test]
    fn overlay_keeps_fill_outside_content() {
        let content = RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 255]));
        let canvas = fill_and_overlay(&content, 4, 4, 1, 1, Rgba([0, 0, 0, 255]));
        assert_eq!(canvas.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
        assert_eq!(canvas.get_pixel(1, 1), &Rgba([255, 255, 255, 255]));
        assert_eq!(canvas.get_pixel(2, 2), &Rgba([255, 255, 255, 255]));
        assert_eq!(canvas.get_pixel(3, 3), &Rgba([0, 0, 0, 255]));
    }
}
