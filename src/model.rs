//! ONNX Runtime session wrapper implementing the model contract.
//!
//! The inpainting artifact declares two inputs, `image` as
//! `float32[1, 3, S, S]` and `mask` as `float32[1, 1, S, S]`, and one
//! output of the image shape. `S` is read from the graph where it is
//! static, otherwise the 512 default of the stock LaMa export applies.

use std::path::Path;

use ndarray::prelude::*;
use ort::value::TensorRef;
use ort::{
    execution_providers::{CUDAExecutionProvider, TensorRTExecutionProvider},
    session::{
        builder::{GraphOptimizationLevel, SessionBuilder},
        Session,
    },
};
use parking_lot::Mutex;

use crate::errors::{InpaintError, Result};
use crate::fetch::ModelSource;
use crate::traits::InpaintModel;

/// Input side of the stock LaMa fp32 export, used when the graph
/// declares a dynamic spatial dimension.
pub const DEFAULT_INPUT_SIZE: u32 = 512;

const IMAGE_INPUT: &str = "image";
const MASK_INPUT: &str = "mask";

fn model_load(operation: impl Into<String>, source: impl std::error::Error + Send + Sync + 'static) -> InpaintError {
    InpaintError::ModelLoad {
        operation: operation.into(),
        source: Box::new(source),
    }
}

/// A loaded inference session.
///
/// ONNX Runtime's `run` takes `&mut self` and concurrent-call safety is
/// not documented, so the session sits behind a mutex and concurrent
/// `predict` calls serialize. The session is meant to be loaded once and
/// shared; callers own its lifecycle explicitly (no global singleton).
pub struct ModelSession {
    input_size: u32,
    output_name: String,
    session: Mutex<Session>,
}

impl ModelSession {
    /// Load a model from a local file and warm it up.
    pub fn new(model_path: &Path, intra_threads: usize, device_id: i32) -> Result<Self> {
        let session = SessionBuilder::new()
            .map_err(|e| model_load("session builder init", e))?
            .with_execution_providers([
                TensorRTExecutionProvider::default()
                    .with_device_id(device_id)
                    .build(),
                CUDAExecutionProvider::default()
                    .with_device_id(device_id)
                    .build(),
            ])
            .map_err(|e| model_load("execution provider setup", e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| model_load("graph optimization setup", e))?
            .with_intra_threads(intra_threads.max(1))
            .map_err(|e| model_load("intra-op thread setup", e))?
            .with_memory_pattern(true)
            .map_err(|e| model_load("memory pattern setup", e))?
            .commit_from_file(model_path)
            .map_err(|e| {
                model_load(format!("reading model file: {}", model_path.display()), e)
            })?;

        Self::from_session(session)
    }

    /// Load a model from a path or URL (URLs download into the cache).
    pub fn from_source(source: &ModelSource, intra_threads: usize, device_id: i32) -> Result<Self> {
        let path = source.resolve()?;
        Self::new(&path, intra_threads, device_id)
    }

    fn from_session(session: Session) -> Result<Self> {
        for name in [IMAGE_INPUT, MASK_INPUT] {
            if !session.inputs.iter().any(|input| input.name == name) {
                return Err(model_load(
                    format!("graph does not declare input '{name}'"),
                    std::io::Error::new(std::io::ErrorKind::InvalidData, "unexpected model signature"),
                ));
            }
        }

        let output_name = session
            .outputs
            .first()
            .map(|output| output.name.clone())
            .ok_or_else(|| {
                model_load(
                    "graph declares no outputs",
                    std::io::Error::new(std::io::ErrorKind::InvalidData, "unexpected model signature"),
                )
            })?;

        let input_size = declared_input_size(&session).unwrap_or(DEFAULT_INPUT_SIZE);

        let this = Self {
            input_size,
            output_name,
            session: Mutex::new(session),
        };

        this.warm_up()?;
        Ok(this)
    }

    /// One zero-tensor run after load. Catches a graph whose runtime
    /// behavior does not match its declared signature at load time rather
    /// than on the first user call, and pre-allocates backend buffers.
    fn warm_up(&self) -> Result<()> {
        let side = self.input_size as usize;
        let image = Array4::<f32>::zeros((1, 3, side, side));
        let mask = Array4::<f32>::zeros((1, 1, side, side));

        let output = self
            .run_inference(image.view(), mask.view())
            .map_err(|e| model_load("warm-up run", e))?;

        let shape = output.shape();
        if shape[1] != 3 {
            return Err(model_load(
                format!("warm-up output has shape {shape:?}, expected [1, 3, S, S]"),
                std::io::Error::new(std::io::ErrorKind::InvalidData, "unexpected model output"),
            ));
        }

        tracing::debug!(input_size = self.input_size, "model session ready");
        Ok(())
    }

    fn run_inference(
        &self,
        image: ArrayView4<f32>,
        mask: ArrayView4<f32>,
    ) -> Result<Array4<f32>> {
        let mut session = self.session.lock();
        let outputs = session.run(ort::inputs![
            IMAGE_INPUT => TensorRef::from_array_view(&image.as_standard_layout())?,
            MASK_INPUT => TensorRef::from_array_view(&mask.as_standard_layout())?
        ])?;
        Ok(outputs[self.output_name.as_str()]
            .try_extract_array::<f32>()?
            .into_dimensionality::<Ix4>()?
            .to_owned())
    }
}

impl InpaintModel for ModelSession {
    fn input_size(&self) -> u32 {
        self.input_size
    }

    fn predict(&self, image: ArrayView4<f32>, mask: ArrayView4<f32>) -> Result<Array4<f32>> {
        let side = self.input_size as usize;
        let expected_image = [1, 3, side, side];
        let expected_mask = [1, 1, side, side];

        // fail fast before binding anything to the backend
        if image.shape() != expected_image {
            return Err(InpaintError::shape(
                "model image input",
                format!("{expected_image:?}"),
                format!("{:?}", image.shape()),
            ));
        }
        if mask.shape() != expected_mask {
            return Err(InpaintError::shape(
                "model mask input",
                format!("{expected_mask:?}"),
                format!("{:?}", mask.shape()),
            ));
        }

        self.run_inference(image, mask)
    }
}

/// Spatial side declared by the graph's `image` input, if static.
fn declared_input_size(session: &Session) -> Option<u32> {
    let input = session.inputs.iter().find(|i| i.name == IMAGE_INPUT)?;
    let shape = input.input_type.tensor_shape()?;
    if shape.len() != 4 {
        return None;
    }
    let side = shape[2];
    (side > 0).then_some(side as u32)
}
