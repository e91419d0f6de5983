use std::path::PathBuf;

use thiserror::Error;

/// Failures at the image I/O boundary.
#[derive(Error, Debug)]
pub enum ImageIoError {
    #[error("failed to read image file {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("failed to write image to {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("frame is not a {width}x{height} 3-channel image ({len} bytes, {channels} channels)")]
    InvalidFrame {
        width: u32,
        height: u32,
        channels: u8,
        len: usize,
    },
}

impl ImageIoError {
    pub(crate) fn invalid_frame(frame: &crate::shared::frame::Frame) -> Self {
        Self::InvalidFrame {
            width: frame.width(),
            height: frame.height(),
            channels: frame.channels(),
            len: frame.data().len(),
        }
    }
}
