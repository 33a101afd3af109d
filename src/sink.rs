//! Destinations for Image-field crops
//!
//! Decoders never write files. The scanner hands every crop with content to
//! a [`CropSink`]; pick [`DirectorySink`] to keep them as PNGs next to the
//! other scan output, or [`NullSink`] to drop them.

use std::path::{Path, PathBuf};

use image::RgbImage;

use crate::decode::ImageCapture;
use crate::error::{Result, ScanError};

/// Receives crops of Image fields that contain writing
pub trait CropSink {
    fn save(&mut self, capture: &ImageCapture) -> Result<()>;
}

/// Writes each crop to `<dir>/<file_name>`
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    /// Create the sink, creating `dir` if needed
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl CropSink for DirectorySink {
    fn save(&mut self, capture: &ImageCapture) -> Result<()> {
        let path = self.dir.join(&capture.file_name);
        save_png(&capture.image, &path)?;
        tracing::info!(field = %capture.field_id, path = %path.display(), "saved image crop");
        Ok(())
    }
}

/// Discards every crop
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl CropSink for NullSink {
    fn save(&mut self, _capture: &ImageCapture) -> Result<()> {
        Ok(())
    }
}

/// Save an RGB image as PNG
pub fn save_png(image: &RgbImage, path: &Path) -> Result<()> {
    image
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| ScanError::Output {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}
