use image::GrayImage;

use crate::detection::domain::detection_params::DetectionParams;
use crate::shared::region::Region;

/// Domain interface for multiscale object detection on a grayscale image.
///
/// Returned regions are in the coordinates of `gray`. Order is whatever the
/// implementation produces and callers must not re-sort it.
pub trait ObjectDetector: Send + Sync {
    fn detect(&self, gray: &GrayImage, params: &DetectionParams) -> Vec<Region>;
}
