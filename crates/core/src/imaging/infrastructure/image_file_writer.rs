use std::path::Path;

use image::RgbImage;

use crate::imaging::domain::image_io_error::ImageIoError;
use crate::imaging::domain::image_writer::ImageWriter;

/// Writes an RGB image to a file using the `image` crate.
///
/// Missing parent directories are created.
pub struct ImageFileWriter;

impl ImageFileWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageWriter for ImageFileWriter {
    fn write(&self, path: &Path, image: &RgbImage) -> Result<(), ImageIoError> {
        let write_err = |source: Box<dyn std::error::Error + Send + Sync>| ImageIoError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| write_err(e.into()))?;
        }

        image.save(path).map_err(|e| write_err(e.into()))?;
        log::debug!(
            "Wrote {}x{} image to {}",
            image.width(),
            image.height(),
            path.display()
        );
        Ok(())
    }
}
