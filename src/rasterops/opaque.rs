use image::RgbaImage;

/// Force every pixel fully opaque in place.
///
/// Mask semantics ignore alpha; forcing it on construction keeps later
/// stages from having to special-case translucent brush strokes.
pub fn force_opaque(image: &mut RgbaImage) {
    for pixel in image.pixels_mut() {
        pixel.0[3] = 255;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn alpha_is_rewritten() {
        let mut image = RgbaImage::from_pixel(3, 3, Rgba([200, 200, 200, 17]));
        force_opaque(&mut image);
        assert!(image.pixels().all(|p| p.0[3] == 255));
    }
}
