use image::codecs::jpeg::JpegEncoder as ImageJpegEncoder;
use image::ExtendedColorType;

use crate::imaging::domain::image_encoder::ImageEncoder;
use crate::imaging::domain::image_io_error::ImageIoError;
use crate::shared::constants::{JPEG_QUALITY, OUTPUT_MIME};
use crate::shared::frame::Frame;

/// Baseline JPEG encoder over the `image` crate.
pub struct JpegEncoder {
    quality: u8,
}

impl JpegEncoder {
    /// `quality` is clamped to 1..=100.
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }
}

impl Default for JpegEncoder {
    fn default() -> Self {
        Self::new(JPEG_QUALITY)
    }
}

impl ImageEncoder for JpegEncoder {
    fn encode(&self, frame: &Frame) -> Result<Vec<u8>, ImageIoError> {
        let expected = frame.width() as usize * frame.height() as usize * 3;
        if frame.channels() != 3 || frame.data().len() != expected {
            return Err(ImageIoError::invalid_frame(frame));
        }

        let mut buf = Vec::new();
        ImageJpegEncoder::new_with_quality(&mut buf, self.quality)
            .encode(
                frame.data(),
                frame.width(),
                frame.height(),
                ExtendedColorType::Rgb8,
            )
            .map_err(ImageIoError::Encode)?;
        Ok(buf)
    }

    fn mime_type(&self) -> &'static str {
        OUTPUT_MIME
    }
}
