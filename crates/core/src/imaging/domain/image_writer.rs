use std::path::Path;

use image::RgbImage;

use crate::imaging::domain::image_io_error::ImageIoError;

/// Writes a display image to a file.
pub trait ImageWriter: Send {
    /// Writes the image to the given path; the format follows the extension.
    fn write(&self, path: &Path, image: &RgbImage) -> Result<(), ImageIoError>;
}
