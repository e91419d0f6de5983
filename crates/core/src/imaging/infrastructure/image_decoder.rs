use std::path::Path;

use crate::imaging::domain::image_io_error::ImageIoError;
use crate::shared::frame::Frame;

/// Decodes encoded image bytes (any format the `image` crate recognises)
/// into an RGB frame.
///
/// Alpha is dropped and grayscale sources are expanded to three channels.
pub fn decode_image(bytes: &[u8]) -> Result<Frame, ImageIoError> {
    let img = image::load_from_memory(bytes).map_err(ImageIoError::Decode)?;
    let frame = Frame::from_rgb_image(img.to_rgb8());
    log::debug!("Decoded {}x{} image", frame.width(), frame.height());
    Ok(frame)
}

/// Reads and decodes an image file.
pub fn read_image(path: &Path) -> Result<Frame, ImageIoError> {
    let bytes = std::fs::read(path).map_err(|source| ImageIoError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    decode_image(&bytes)
}
