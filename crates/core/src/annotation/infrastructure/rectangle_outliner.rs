use ndarray::{s, Axis};

use crate::annotation::domain::annotation_style::Rgb;
use crate::annotation::domain::frame_annotator::FrameAnnotator;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Draws hollow rectangles directly into the frame's pixel buffer.
///
/// The stroke grows inward from the region's edges so an outline never
/// leaves the region it marks. Regions are clipped to the frame first and
/// a stroke of 0 is drawn as 1.
#[derive(Default)]
pub struct RectangleOutliner;

impl RectangleOutliner {
    pub fn new() -> Self {
        Self
    }
}

impl FrameAnnotator for RectangleOutliner {
    fn outline(&self, frame: &mut Frame, regions: &[Region], color: Rgb, stroke_width: u32) {
        let stroke = stroke_width.max(1) as usize;
        let bounds = Region::full(frame.width(), frame.height());
        let channels = (frame.channels() as usize).min(3);
        let mut pixels = frame.as_ndarray_mut();

        for region in regions {
            let r = region.clip_to(&bounds);
            if r.is_empty() {
                continue;
            }
            let (x0, y0) = (r.x as usize, r.y as usize);
            let (x1, y1) = (r.right() as usize, r.bottom() as usize);
            let t = stroke.min(r.width as usize).min(r.height as usize);

            let bands = [
                (y0, y0 + t, x0, x1),
                (y1 - t, y1, x0, x1),
                (y0, y1, x0, x0 + t),
                (y0, y1, x1 - t, x1),
            ];
            for (ya, yb, xa, xb) in bands {
                let mut band = pixels.slice_mut(s![ya..yb, xa..xb, ..]);
                for c in 0..channels {
                    band.index_axis_mut(Axis(2), c).fill(color.0[c]);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgb = Rgb([255, 0, 0]);

    fn make_frame(width: u32, height: u32, value: u8) -> Frame {
        Frame::new(vec![value; (width * height * 3) as usize], width, height, 3)
    }

    fn pixel(frame: &Frame, x: usize, y: usize) -> [u8; 3] {
        let idx = (y * frame.width() as usize + x) * 3;
        let d = frame.data();
        [d[idx], d[idx + 1], d[idx + 2]]
    }

    #[test]
    fn test_no_regions_frame_unchanged() {
        let mut frame = make_frame(20, 20, 7);
        let original = frame.clone();
        RectangleOutliner::new().outline(&mut frame, &[], RED, 2);
        assert_eq!(frame, original);
    }

    #[test]
    fn test_outline_edges_and_interior() {
        let mut frame = make_frame(30, 30, 0);
        RectangleOutliner::new().outline(&mut frame, &[Region::new(5, 5, 10, 10)], RED, 2);

        // Outer and inner stroke rows
        assert_eq!(pixel(&frame, 5, 5), [255, 0, 0]);
        assert_eq!(pixel(&frame, 6, 6), [255, 0, 0]);
        assert_eq!(pixel(&frame, 14, 14), [255, 0, 0]);
        assert_eq!(pixel(&frame, 13, 10), [255, 0, 0]);
        // Interior untouched
        assert_eq!(pixel(&frame, 7, 7), [0, 0, 0]);
        assert_eq!(pixel(&frame, 10, 10), [0, 0, 0]);
        // Outside untouched
        assert_eq!(pixel(&frame, 4, 5), [0, 0, 0]);
        assert_eq!(pixel(&frame, 15, 15), [0, 0, 0]);
    }

    #[test]
    fn test_pixels_outside_region_unchanged() {
        let mut frame = make_frame(40, 40, 90);
        let region = Region::new(10, 12, 15, 8);
        RectangleOutliner::new().outline(&mut frame, &[region], RED, 2);
        for y in 0..40 {
            for x in 0..40 {
                let inside = region.contains(&Region::new(x, y, 1, 1));
                if !inside {
                    assert_eq!(pixel(&frame, x as usize, y as usize), [90, 90, 90]);
                }
            }
        }
    }

    #[test]
    fn test_region_clipped_to_frame() {
        let mut frame = make_frame(10, 10, 0);
        RectangleOutliner::new().outline(&mut frame, &[Region::new(-5, -5, 10, 10)], RED, 2);
        assert_eq!(pixel(&frame, 4, 0), [255, 0, 0]);
        assert_eq!(pixel(&frame, 0, 4), [255, 0, 0]);
        assert_eq!(pixel(&frame, 5, 5), [0, 0, 0]);
    }

    #[test]
    fn test_tiny_region_filled() {
        let mut frame = make_frame(10, 10, 0);
        RectangleOutliner::new().outline(&mut frame, &[Region::new(3, 3, 1, 3)], RED, 2);
        for y in 3..6 {
            assert_eq!(pixel(&frame, 3, y), [255, 0, 0]);
        }
    }

    #[test]
    fn test_zero_stroke_draws_one_pixel() {
        let mut frame = make_frame(10, 10, 0);
        RectangleOutliner::new().outline(&mut frame, &[Region::new(2, 2, 6, 6)], RED, 0);
        assert_eq!(pixel(&frame, 2, 2), [255, 0, 0]);
        assert_eq!(pixel(&frame, 3, 3), [0, 0, 0]);
    }

    #[test]
    fn test_empty_region_skipped() {
        let mut frame = make_frame(10, 10, 0);
        let original = frame.clone();
        RectangleOutliner::new().outline(&mut frame, &[Region::new(3, 3, 0, 5)], RED, 2);
        assert_eq!(frame, original);
    }
}
