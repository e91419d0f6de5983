use crate::annotation::domain::annotation_style::Rgb;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Domain interface for drawing detection outlines onto a frame.
///
/// Implementations modify the frame in-place and must not touch pixels
/// outside the given regions.
pub trait FrameAnnotator: Send + Sync {
    fn outline(&self, frame: &mut Frame, regions: &[Region], color: Rgb, stroke_width: u32);
}
