use crate::imaging::domain::image_io_error::ImageIoError;
use crate::shared::frame::Frame;

/// Encodes a frame into an in-memory download artifact.
pub trait ImageEncoder: Send + Sync {
    fn encode(&self, frame: &Frame) -> Result<Vec<u8>, ImageIoError>;

    /// MIME type of the bytes produced by [`encode`](Self::encode).
    fn mime_type(&self) -> &'static str;
}
