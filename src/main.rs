use std::fs;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use inpaint_rs::{BatchProcessor, Config, Inpainter, ModelSession, ModelSource};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "inpaint_rs=info".into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = Config::parse();

    ensure!(config.input.exists(), "Input path does not exist");
    ensure!(config.mask.exists(), "Mask path does not exist");

    if config.input.is_dir() {
        ensure!(
            config.mask.is_dir(),
            "Mask must be a directory when input is a directory"
        );
        let processor = BatchProcessor::with_onnx_model(config)?;
        processor.process_directory()?;
        return Ok(());
    }

    process_single(&config)
}

fn process_single(config: &Config) -> Result<()> {
    let source = ModelSource::parse(&config.model);
    let model = ModelSession::from_source(&source, config.num_threads, config.device_id)?;
    let inpainter = Inpainter::new(model);

    let image = image::open(&config.input)
        .with_context(|| format!("Failed to open image: {}", config.input.display()))?
        .into_rgba8();
    let mask = image::open(&config.mask)
        .with_context(|| format!("Failed to open mask: {}", config.mask.display()))?
        .into_rgba8();

    let result = inpainter.remove_object_image(&image, &mask, &config.remove_options())?;

    let output = if config.output.extension().is_some() {
        config.output.clone()
    } else {
        fs::create_dir_all(&config.output).with_context(|| {
            format!("Failed to create output directory: {}", config.output.display())
        })?;
        config
            .output
            .join(config.input.file_name().unwrap_or_default())
            .with_extension(&config.format)
    };

    result
        .save(&output)
        .with_context(|| format!("Failed to save result: {}", output.display()))?;

    tracing::info!("wrote {}", output.display());
    Ok(())
}
