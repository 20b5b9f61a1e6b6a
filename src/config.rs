use std::path::PathBuf;
use std::thread;

use clap::Parser;
use image::ImageFormat;

use crate::pipeline::{HdStrategy, RemoveOptions};

#[derive(Parser, Clone, Debug)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Source image file, or a directory of images.
    pub input: PathBuf,

    /// Mask file matching the source, or a directory of masks paired with
    /// the input images by file stem. Bright pixels mark the region to
    /// remove.
    pub mask: PathBuf,

    /// Output file or directory.
    #[arg(default_value = "output")]
    pub output: PathBuf,

    /// Model artifact: a local .onnx path or an http(s) URL.
    #[arg(short, long)]
    pub model: String,

    #[arg(short, long, default_value = "png", value_parser = check_format)]
    pub format: String,

    #[arg(short, long, default_value_t = 0)]
    pub device_id: i32,

    #[arg(
        short, long, default_value_t = thread::available_parallelism().unwrap().get()
    )]
    pub num_threads: usize,

    /// Use the enhanced reconstruction path.
    #[arg(long)]
    pub postprocessing: bool,

    /// Reserved; accepted but currently inert.
    #[arg(long, value_enum, default_value_t = HdStrategy::Original)]
    pub hd_strategy: HdStrategy,

    /// Reserved; accepted but currently inert.
    #[arg(long, default_value_t = 1.0)]
    pub strength: f32,
}

impl Config {
    pub fn remove_options(&self) -> RemoveOptions {
        RemoveOptions {
            hd_strategy: self.hd_strategy,
            strength: self.strength,
            postprocessing: self.postprocessing,
        }
    }
}

fn check_format(s: &str) -> Result<String, String> {
    let supported: Vec<_> = ImageFormat::all()
        .filter(|f| f.writing_enabled())
        .flat_map(|f| f.extensions_str())
        .map(|s| format!("`{}`", s))
        .collect();
    let supported_message = format!("Supported formats: {}", supported.join(", "));

    let format = ImageFormat::from_extension(s)
        .ok_or(format!("{} is not supported. {}", s, supported_message))?;
    if !format.writing_enabled() {
        return Err(format!("{} is not supported. {}", s, supported_message));
    }

    Ok(s.to_string())
}
