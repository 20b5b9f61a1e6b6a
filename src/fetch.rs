//! Model artifact retrieval.
//!
//! The model path handed to the CLI or library may be a local file or an
//! `http(s)` URL. URLs are downloaded once into the user cache directory
//! and loaded from disk afterwards; the session loader only ever sees a
//! local path.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};

use crate::errors::{InpaintError, Result};

/// Where a model artifact comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    File(PathBuf),
    Url(String),
}

impl ModelSource {
    /// Classify a user-supplied model string. Anything that does not look
    /// like an HTTP URL is treated as a filesystem path.
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            Self::Url(location.to_string())
        } else {
            Self::File(PathBuf::from(location))
        }
    }

    /// Resolve to a local file, downloading into the cache if needed.
    pub fn resolve(&self) -> Result<PathBuf> {
        match self {
            Self::File(path) => {
                if !path.exists() {
                    return Err(InpaintError::FileSystem {
                        path: path.clone(),
                        operation: "model file lookup".to_string(),
                        source: std::io::Error::new(
                            std::io::ErrorKind::NotFound,
                            "model file does not exist",
                        ),
                    });
                }
                Ok(path.clone())
            }
            Self::Url(url) => {
                let cached = cache_path(url)?;
                if !cached.exists() {
                    download_file(url, &cached)?;
                }
                Ok(cached)
            }
        }
    }
}

fn cache_dir() -> Result<PathBuf> {
    let base = dirs::cache_dir().unwrap_or_else(|| PathBuf::from("."));
    let dir = base.join("inpaint-rs").join("models");
    fs::create_dir_all(&dir).map_err(|source| InpaintError::FileSystem {
        path: dir.clone(),
        operation: "create cache directory".to_string(),
        source,
    })?;
    Ok(dir)
}

fn cache_path(url: &str) -> Result<PathBuf> {
    let name = url
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("model.onnx");
    Ok(cache_dir()?.join(name))
}

/// Download `url` to `path` with progress indication.
///
/// Writes to a sibling temp file first and renames, so an interrupted
/// download never leaves a truncated artifact in the cache.
fn download_file(url: &str, path: &Path) -> Result<()> {
    tracing::info!("downloading model from {url}");

    let response = reqwest::blocking::Client::new()
        .get(url)
        .send()
        .and_then(reqwest::blocking::Response::error_for_status)
        .map_err(|source| InpaintError::ModelDownload {
            url: url.to_string(),
            source: Box::new(source),
        })?;

    let total_size = response.content_length().unwrap_or(0);
    let pb = ProgressBar::new(total_size);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            .expect("valid template")
            .progress_chars("#>-"),
    );

    let temp_path = path.with_extension("tmp");
    let mut file = fs::File::create(&temp_path).map_err(|source| InpaintError::FileSystem {
        path: temp_path.clone(),
        operation: "create temp download file".to_string(),
        source,
    })?;

    let mut downloaded = 0u64;
    let mut reader = response;
    loop {
        let mut buffer = [0u8; 8192];
        let bytes_read = std::io::Read::read(&mut reader, &mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        file.write_all(&buffer[..bytes_read])?;
        downloaded += bytes_read as u64;
        pb.set_position(downloaded);
    }
    pb.finish_and_clear();

    fs::rename(&temp_path, path).map_err(|source| InpaintError::FileSystem {
        path: path.to_path_buf(),
        operation: "finalize downloaded model".to_string(),
        source,
    })?;

    tracing::info!("model cached at {}", path.display());
    Ok(())
}
