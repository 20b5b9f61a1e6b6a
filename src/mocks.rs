//! Mock model for exercising the pipeline without an ONNX artifact.

use std::sync::atomic::{AtomicUsize, Ordering};

use ndarray::prelude::*;

use crate::errors::{InpaintError, Result};
use crate::traits::InpaintModel;

/// A model that returns its image input untouched.
///
/// With an all-zero mask this makes the whole pipeline an identity
/// transform (up to codec rounding), which is the fixed-point scenario the
/// integration tests assert. The call counter lets tests verify that
/// validation failures never reach inference.
#[derive(Debug, Default)]
pub struct IdentityModel {
    input_size: u32,
    calls: AtomicUsize,
}

impl IdentityModel {
    pub const fn new(input_size: u32) -> Self {
        Self {
            input_size,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl InpaintModel for IdentityModel {
    fn input_size(&self) -> u32 {
        self.input_size
    }

    fn predict(&self, image: ArrayView4<f32>, mask: ArrayView4<f32>) -> Result<Array4<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let side = self.input_size as usize;
        if image.shape() != [1, 3, side, side] {
            return Err(InpaintError::shape(
                "mock image input",
                format!("[1, 3, {side}, {side}]"),
                format!("{:?}", image.shape()),
            ));
        }
        if mask.shape() != [1, 1, side, side] {
            return Err(InpaintError::shape(
                "mock mask input",
                format!("[1, 1, {side}, {side}]"),
                format!("{:?}", mask.shape()),
            ));
        }

        Ok(image.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_passes_image_through() -> Result<()> {
        let model = IdentityModel::new(8);
        let image = Array4::<f32>::from_elem((1, 3, 8, 8), 0.25);
        let mask = Array4::<f32>::zeros((1, 1, 8, 8));

        let output = model.predict(image.view(), mask.view())?;
        assert_eq!(output, image);
        assert_eq!(model.call_count(), 1);
        Ok(())
    }

    #[test]
    fn wrong_shapes_are_rejected() {
        let model = IdentityModel::new(8);
        let image = Array4::<f32>::zeros((1, 3, 4, 4));
        let mask = Array4::<f32>::zeros((1, 1, 8, 8));
        assert!(model.predict(image.view(), mask.view()).is_err());
    }
}
