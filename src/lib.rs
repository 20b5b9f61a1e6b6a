pub mod config;
pub mod errors;
pub mod fetch;
pub mod model;
pub mod pipeline;
pub mod postprocess;
pub mod rasterops;
pub mod resampler;
pub mod tensor;
pub mod traits;

pub mod mocks;

use std::fs;
use std::path::{Path, PathBuf};

use image::ImageFormat;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use walkdir::WalkDir;

pub use config::Config;
pub use errors::{InpaintError, Result};
pub use fetch::ModelSource;
pub use model::{ModelSession, DEFAULT_INPUT_SIZE};
pub use pipeline::{HdStrategy, Inpainter, RemoveOptions};
pub use postprocess::PostprocessMode;
pub use resampler::{fit_to_canvas, FixedCanvas};
pub use traits::InpaintModel;

/// Directory-mode driver: pairs every image under the input directory
/// with a same-stem mask and runs the pipeline over the pairs in
/// parallel. Inference itself serializes inside the shared session; the
/// decode, resample, and encode stages run concurrently across workers.
pub struct BatchProcessor<M: InpaintModel> {
    inpainter: Inpainter<M>,
    config: Config,
}

impl<M: InpaintModel> BatchProcessor<M> {
    pub const fn new(model: M, config: Config) -> Self {
        Self {
            inpainter: Inpainter::new(model),
            config,
        }
    }

    pub fn process_directory(&self) -> Result<()> {
        let input_dir = &self.config.input;
        let mask_dir = &self.config.mask;
        let output_dir = &self.config.output;

        for (dir, what) in [(input_dir, "input"), (mask_dir, "mask")] {
            if !dir.is_dir() {
                return Err(InpaintError::FileSystem {
                    path: dir.clone(),
                    operation: format!("{what} directory lookup"),
                    source: std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "directory does not exist",
                    ),
                });
            }
        }

        fs::create_dir_all(output_dir).map_err(|e| InpaintError::FileSystem {
            path: output_dir.clone(),
            operation: "create output directory".to_string(),
            source: e,
        })?;

        let image_files = self.collect_image_files(input_dir);
        if image_files.is_empty() {
            tracing::info!("no images found under {}", input_dir.display());
            return Ok(());
        }

        let pb = ProgressBar::new(image_files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
                )
                .unwrap()
                .progress_chars("#>-"),
        );

        image_files
            .par_iter()
            .try_for_each(|input_file| -> Result<()> {
                self.process_single_image(input_file)?;
                pb.inc(1);
                Ok(())
            })?;

        pb.finish();
        tracing::info!("processed {} images", image_files.len());
        Ok(())
    }

    fn collect_image_files(&self, input_dir: &Path) -> Vec<PathBuf> {
        WalkDir::new(input_dir)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|e| e.path().is_file() && is_supported_image(e.path()))
            .map(walkdir::DirEntry::into_path)
            .collect()
    }

    /// A mask pairs with an image by file stem, with any decodable
    /// extension (`photo.jpg` pairs with `photo.png`).
    fn find_mask_for(&self, input_file: &Path) -> Result<PathBuf> {
        let relative = self.relative_path(input_file)?;
        let stem_path = self.config.mask.join(&relative);

        let candidates = stem_path
            .parent()
            .map(|dir| {
                ImageFormat::all()
                    .flat_map(image::ImageFormat::extensions_str)
                    .map(|ext| dir.join(stem_path.file_stem().unwrap_or_default()).with_extension(ext))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        candidates
            .into_iter()
            .find(|p| p.is_file())
            .ok_or_else(|| InpaintError::Validation {
                reason: format!("no mask found for {}", input_file.display()),
            })
    }

    fn process_single_image(&self, input_file: &Path) -> Result<()> {
        let image = image::open(input_file)
            .map_err(|e| InpaintError::ImageProcessing {
                path: input_file.display().to_string(),
                operation: "open source image".to_string(),
                source: Box::new(e),
            })?
            .into_rgba8();

        let mask_file = self.find_mask_for(input_file)?;
        let mask = image::open(&mask_file)
            .map_err(|e| InpaintError::ImageProcessing {
                path: mask_file.display().to_string(),
                operation: "open mask image".to_string(),
                source: Box::new(e),
            })?
            .into_rgba8();

        let result =
            self.inpainter
                .remove_object_image(&image, &mask, &self.config.remove_options())?;

        let output_file = self
            .config
            .output
            .join(self.relative_path(input_file)?)
            .with_extension(&self.config.format);

        if let Some(parent) = output_file.parent() {
            fs::create_dir_all(parent).map_err(|e| InpaintError::FileSystem {
                path: parent.to_path_buf(),
                operation: "create output subdirectory".to_string(),
                source: e,
            })?;
        }

        result
            .save(&output_file)
            .map_err(|e| InpaintError::ImageProcessing {
                path: output_file.display().to_string(),
                operation: "save result".to_string(),
                source: Box::new(e),
            })?;

        Ok(())
    }

    fn relative_path(&self, input_file: &Path) -> Result<PathBuf> {
        input_file
            .strip_prefix(&self.config.input)
            .map(Path::to_path_buf)
            .map_err(|_| InpaintError::FileSystem {
                path: input_file.to_path_buf(),
                operation: "relative path computation".to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "file is outside the input directory",
                ),
            })
    }
}

impl BatchProcessor<ModelSession> {
    pub fn with_onnx_model(config: Config) -> Result<Self> {
        let source = ModelSource::parse(&config.model);
        let model = ModelSession::from_source(&source, config.num_threads, config.device_id)?;
        Ok(Self::new(model, config))
    }
}

pub fn is_supported_image(path: &Path) -> bool {
    ImageFormat::from_path(path).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn test_config(input: PathBuf, mask: PathBuf, output: PathBuf) -> Config {
        Config::parse_from([
            "inpaint-rs",
            input.to_str().unwrap(),
            mask.to_str().unwrap(),
            output.to_str().unwrap(),
            "--model",
            "model.onnx",
        ])
    }

    #[test]
    fn supported_formats() {
        assert!(is_supported_image(Path::new("test.jpg")));
        assert!(is_supported_image(Path::new("test.png")));
        assert!(!is_supported_image(Path::new("test.txt")));
        assert!(!is_supported_image(Path::new("test")));
    }

    #[test]
    fn mask_pairing_crosses_extensions() -> Result<()> {
        use crate::mocks::IdentityModel;
        use tempfile::TempDir;

        let temp_dir = TempDir::new()?;
        let input_dir = temp_dir.path().join("input");
        let mask_dir = temp_dir.path().join("masks");
        fs::create_dir_all(&input_dir)?;
        fs::create_dir_all(&mask_dir)?;

        fs::write(input_dir.join("photo.jpg"), b"")?;
        fs::write(mask_dir.join("photo.png"), b"")?;

        let config = test_config(
            input_dir.clone(),
            mask_dir.clone(),
            temp_dir.path().join("out"),
        );
        let processor = BatchProcessor::new(IdentityModel::new(64), config);

        let mask = processor.find_mask_for(&input_dir.join("photo.jpg"))?;
        assert_eq!(mask, mask_dir.join("photo.png"));
        Ok(())
    }

    #[test]
    fn missing_mask_is_a_validation_error() -> Result<()> {
        use crate::mocks::IdentityModel;
        use tempfile::TempDir;

        let temp_dir = TempDir::new()?;
        let input_dir = temp_dir.path().join("input");
        let mask_dir = temp_dir.path().join("masks");
        fs::create_dir_all(&input_dir)?;
        fs::create_dir_all(&mask_dir)?;
        fs::write(input_dir.join("photo.jpg"), b"")?;

        let config = test_config(input_dir.clone(), mask_dir, temp_dir.path().join("out"));
        let processor = BatchProcessor::new(IdentityModel::new(64), config);

        let err = processor
            .find_mask_for(&input_dir.join("photo.jpg"))
            .unwrap_err();
        assert!(matches!(err, InpaintError::Validation { .. }));
        Ok(())
    }

    #[test]
    fn relative_path_calculation() -> Result<()> {
        use crate::mocks::IdentityModel;
        use tempfile::TempDir;

        let temp_dir = TempDir::new()?;
        let input_dir = temp_dir.path().join("input");
        let subdir = input_dir.join("subdir");
        fs::create_dir_all(&subdir)?;

        let config = test_config(
            input_dir.clone(),
            temp_dir.path().join("masks"),
            temp_dir.path().join("out"),
        );
        let processor = BatchProcessor::new(IdentityModel::new(64), config);

        let relative = processor.relative_path(&subdir.join("test.jpg"))?;
        assert_eq!(relative, Path::new("subdir/test.jpg"));
        Ok(())
    }
}
