//! Boosted Haar cascade evaluation (Viola-Jones with Lienhart's rotated
//! features), following the semantics of OpenCV's `detectMultiScale`.
use std::borrow::Cow;

use image::imageops::{self, FilterType};
use image::GrayImage;
use thiserror::Error;

use crate::detection::domain::detection_params::DetectionParams;
use crate::detection::domain::object_detector::ObjectDetector;
use crate::shared::region::Region;

use super::integral_image::IntegralImage;
use super::rect_grouper::{group_rectangles, GROUP_EPS};

/// Slack subtracted from stage thresholds before rejecting a window.
const STAGE_THRESHOLD_EPS: f64 = 1e-5;

/// Pyramid levels up to this factor are scanned with a 2-pixel stride.
const COARSE_STEP_MAX_FACTOR: f64 = 2.0;

/// Windows whose `1 / stddev` reaches this value (stddev of 10 gray levels
/// or less) are too flat to evaluate.
const MIN_CONTRAST_RATIO: f64 = 0.1;

#[derive(Error, Debug)]
pub enum CascadeError {
    #[error("read error: {0}")]
    Io(#[from] std::io::Error),
    #[error("XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("missing <{0}> element")]
    MissingElement(&'static str),
    #[error("legacy cascade format is not supported")]
    LegacyFormat,
    #[error("unsupported stage type '{0}' (expected BOOST)")]
    UnsupportedStageType(String),
    #[error("unsupported feature type '{0}' (expected HAAR)")]
    UnsupportedFeatureType(String),
    #[error("invalid number '{value}' in <{field}>")]
    Number { field: &'static str, value: String },
    #[error("inconsistent cascade: {0}")]
    Inconsistent(String),
}

/// One weighted rectangle of a Haar feature, in window coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightedRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub weight: f64,
}

/// A Haar-like feature: weighted sum of two or three rectangle sums.
///
/// Tilted features use 45°-rotated rectangles whose `(x, y)` is the top
/// corner.
#[derive(Clone, Debug, PartialEq)]
pub struct HaarFeature {
    pub rects: Vec<WeightedRect>,
    pub tilted: bool,
}

/// Internal node of a weak classifier tree.
///
/// Child indices `> 0` point at another node of the same tree; `<= 0`
/// selects leaf `-child`.
#[derive(Clone, Debug, PartialEq)]
pub struct TreeNode {
    pub left: i32,
    pub right: i32,
    pub feature: usize,
    pub threshold: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WeakTree {
    pub nodes: Vec<TreeNode>,
    pub leaves: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Stage {
    pub threshold: f64,
    pub trees: Vec<WeakTree>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Verdict {
    Accepted,
    /// Skipped before any stage ran: the window has too little contrast.
    Flat,
    /// Rejected by the stage at this index.
    Rejected(usize),
}

/// An immutable, validated Haar cascade.
#[derive(Debug)]
pub struct HaarCascade {
    window_width: u32,
    window_height: u32,
    stages: Vec<Stage>,
    features: Vec<HaarFeature>,
    has_tilted: bool,
}

impl HaarCascade {
    /// Builds a cascade after checking that every index and rectangle is
    /// in range, so evaluation can never read out of bounds or loop.
    pub fn new(
        window_width: u32,
        window_height: u32,
        stages: Vec<Stage>,
        features: Vec<HaarFeature>,
    ) -> Result<Self, CascadeError> {
        if window_width == 0 || window_height == 0 {
            return Err(CascadeError::Inconsistent(format!(
                "window size {window_width}x{window_height} must be positive"
            )));
        }
        if stages.is_empty() {
            return Err(CascadeError::Inconsistent("cascade has no stages".into()));
        }
        for (fi, feature) in features.iter().enumerate() {
            validate_feature(fi, feature, window_width as i32, window_height as i32)?;
        }
        for (si, stage) in stages.iter().enumerate() {
            if stage.trees.is_empty() {
                return Err(CascadeError::Inconsistent(format!(
                    "stage {si} has no weak classifiers"
                )));
            }
            for (ti, tree) in stage.trees.iter().enumerate() {
                validate_tree(tree, features.len()).map_err(|msg| {
                    CascadeError::Inconsistent(format!("stage {si}, tree {ti}: {msg}"))
                })?;
            }
        }

        let has_tilted = features.iter().any(|f| f.tilted);
        Ok(Self {
            window_width,
            window_height,
            stages,
            features,
            has_tilted,
        })
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    pub fn has_tilted_features(&self) -> bool {
        self.has_tilted
    }

    /// Scans `gray` at every pyramid scale and groups the accepted windows.
    ///
    /// Each level shrinks the image by another `scale_factor` while the
    /// cascade window stays fixed, so hits at level `factor` map back to
    /// windows of `round(window * factor)` pixels in `gray`.
    pub fn detect_multi_scale(&self, gray: &GrayImage, params: &DetectionParams) -> Vec<Region> {
        let (img_w, img_h) = gray.dimensions();
        let bounds = Region::full(img_w, img_h);
        let mut raw = Vec::new();
        let mut factor = 1.0f64;

        loop {
            let scaled_w = (self.window_width as f64 * factor).round() as u32;
            let scaled_h = (self.window_height as f64 * factor).round() as u32;
            if scaled_w > img_w || scaled_h > img_h {
                break;
            }
            let level_w = (img_w as f64 / factor).round() as u32;
            let level_h = (img_h as f64 / factor).round() as u32;
            if level_w < self.window_width || level_h < self.window_height {
                break;
            }

            let level: Cow<'_, GrayImage> = if level_w == img_w && level_h == img_h {
                Cow::Borrowed(gray)
            } else {
                Cow::Owned(imageops::resize(gray, level_w, level_h, FilterType::Triangle))
            };
            let integral = IntegralImage::new(&level, self.has_tilted);
            let step = if factor > COARSE_STEP_MAX_FACTOR { 1 } else { 2 };

            let before = raw.len();
            self.scan_level(&integral, step, |x, y| {
                let hit = Region::new(
                    (x as f64 * factor).round() as i32,
                    (y as f64 * factor).round() as i32,
                    scaled_w as i32,
                    scaled_h as i32,
                );
                raw.push(hit.clip_to(&bounds));
            });
            log::trace!(
                "level factor={factor:.3} size={level_w}x{level_h}: {} windows accepted",
                raw.len() - before
            );

            factor *= params.scale_factor();
        }

        let grouped = group_rectangles(&raw, params.min_neighbors(), GROUP_EPS);
        log::debug!(
            "cascade {}x{}: {} raw windows, {} after grouping (min_neighbors={})",
            self.window_width,
            self.window_height,
            raw.len(),
            grouped.len(),
            params.min_neighbors()
        );
        grouped
    }

    fn scan_level(
        &self,
        integral: &IntegralImage,
        step: usize,
        mut on_hit: impl FnMut(usize, usize),
    ) {
        let win_w = self.window_width as usize;
        let win_h = self.window_height as usize;
        if integral.width() < win_w || integral.height() < win_h {
            return;
        }
        let max_x = integral.width() - win_w;
        let max_y = integral.height() - win_h;

        let mut y = 0;
        while y <= max_y {
            let mut x = 0;
            while x <= max_x {
                match self.evaluate_window(integral, x, y) {
                    Verdict::Accepted => on_hit(x, y),
                    // Rejected outright: the neighbouring window almost
                    // certainly fails too.
                    Verdict::Rejected(0) => x += step,
                    Verdict::Rejected(_) | Verdict::Flat => {}
                }
                x += step;
            }
            y += step;
        }
    }

    fn evaluate_window(&self, integral: &IntegralImage, x: usize, y: usize) -> Verdict {
        let Some(inv_norm) = self.inverse_norm_factor(integral, x, y) else {
            return Verdict::Flat;
        };

        for (si, stage) in self.stages.iter().enumerate() {
            let mut stage_sum = 0.0;
            for tree in &stage.trees {
                let mut idx = 0i32;
                loop {
                    let node = &tree.nodes[idx as usize];
                    let value = self.feature_value(node.feature, integral, x, y) * inv_norm;
                    idx = if value < node.threshold {
                        node.left
                    } else {
                        node.right
                    };
                    if idx <= 0 {
                        break;
                    }
                }
                stage_sum += tree.leaves[(-idx) as usize];
            }
            if stage_sum < stage.threshold - STAGE_THRESHOLD_EPS {
                return Verdict::Rejected(si);
            }
        }
        Verdict::Accepted
    }

    /// `1 / (area * stddev)` over the window inset by one pixel.
    ///
    /// `None` when the window has no variance or its stddev is at most
    /// 10 gray levels; such windows are never evaluated.
    fn inverse_norm_factor(&self, integral: &IntegralImage, x: usize, y: usize) -> Option<f64> {
        let (w, h) = (self.window_width as usize, self.window_height as usize);
        let (nx, ny, nw, nh) = if w > 2 && h > 2 {
            (x + 1, y + 1, w - 2, h - 2)
        } else {
            (x, y, w, h)
        };
        let area = (nw * nh) as f64;
        let sum = integral.rect_sum(nx, ny, nw, nh) as f64;
        let sq_sum = integral.rect_sq_sum(nx, ny, nw, nh) as f64;
        let nf = area * sq_sum - sum * sum;
        if nf <= 0.0 {
            return None;
        }
        let nf = nf.sqrt();
        (area / nf < MIN_CONTRAST_RATIO).then(|| 1.0 / nf)
    }

    fn feature_value(&self, index: usize, integral: &IntegralImage, x: usize, y: usize) -> f64 {
        let feature = &self.features[index];
        if feature.tilted {
            feature
                .rects
                .iter()
                .map(|r| {
                    r.weight
                        * integral.tilted_sum(
                            x as i64 + r.x as i64,
                            y as i64 + r.y as i64,
                            r.width as i64,
                            r.height as i64,
                        ) as f64
                })
                .sum()
        } else {
            feature
                .rects
                .iter()
                .map(|r| {
                    r.weight
                        * integral.rect_sum(
                            x + r.x as usize,
                            y + r.y as usize,
                            r.width as usize,
                            r.height as usize,
                        ) as f64
                })
                .sum()
        }
    }
}

impl ObjectDetector for HaarCascade {
    fn detect(&self, gray: &GrayImage, params: &DetectionParams) -> Vec<Region> {
        self.detect_multi_scale(gray, params)
    }
}

fn validate_feature(
    index: usize,
    feature: &HaarFeature,
    win_w: i32,
    win_h: i32,
) -> Result<(), CascadeError> {
    if feature.rects.is_empty() || feature.rects.len() > 3 {
        return Err(CascadeError::Inconsistent(format!(
            "feature {index} has {} rectangles (expected 1-3)",
            feature.rects.len()
        )));
    }
    for r in &feature.rects {
        let inside = if feature.tilted {
            r.width >= 0
                && r.height >= 0
                && r.y >= 0
                && r.x - r.height >= 0
                && r.x + r.width <= win_w
                && r.y + r.width + r.height <= win_h
        } else {
            r.x >= 0
                && r.y >= 0
                && r.width >= 0
                && r.height >= 0
                && r.x + r.width <= win_w
                && r.y + r.height <= win_h
        };
        if !inside {
            return Err(CascadeError::Inconsistent(format!(
                "feature {index} rectangle ({}, {}, {}, {}) lies outside the {win_w}x{win_h} window",
                r.x, r.y, r.width, r.height
            )));
        }
    }
    Ok(())
}

fn validate_tree(tree: &WeakTree, feature_count: usize) -> Result<(), String> {
    if tree.nodes.is_empty() {
        return Err("tree has no nodes".into());
    }
    for (ni, node) in tree.nodes.iter().enumerate() {
        if node.feature >= feature_count {
            return Err(format!(
                "node {ni} references feature {} of {feature_count}",
                node.feature
            ));
        }
        for child in [node.left, node.right] {
            if child > 0 {
                // Forward-only links keep the walk acyclic.
                if child as usize <= ni || child as usize >= tree.nodes.len() {
                    return Err(format!("node {ni} has invalid child {child}"));
                }
            } else if (-child) as usize >= tree.leaves.len() {
                return Err(format!("node {ni} references missing leaf {}", -child));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rstest::rstest;

    /// 24x24 cascade firing on a dark 8x8 square centred in the window.
    pub(crate) fn dark_square_cascade() -> HaarCascade {
        let feature = HaarFeature {
            rects: vec![
                WeightedRect {
                    x: 2,
                    y: 2,
                    width: 20,
                    height: 20,
                    weight: -1.0,
                },
                WeightedRect {
                    x: 8,
                    y: 8,
                    width: 8,
                    height: 8,
                    weight: 6.25,
                },
            ],
            tilted: false,
        };
        let stage = Stage {
            threshold: 0.0,
            trees: vec![stump(0, -0.1, 1.0, -1.0)],
        };
        HaarCascade::new(24, 24, vec![stage], vec![feature]).unwrap()
    }

    fn stump(feature: usize, threshold: f64, left: f64, right: f64) -> WeakTree {
        WeakTree {
            nodes: vec![TreeNode {
                left: 0,
                right: -1,
                feature,
                threshold,
            }],
            leaves: vec![left, right],
        }
    }

    fn rect(x: i32, y: i32, width: i32, height: i32, weight: f64) -> WeightedRect {
        WeightedRect {
            x,
            y,
            width,
            height,
            weight,
        }
    }

    pub(crate) fn square_on_background(
        size: u32,
        x: u32,
        y: u32,
        side: u32,
        bg: u8,
        fg: u8,
    ) -> GrayImage {
        GrayImage::from_fn(size, size, |px, py| {
            let inside = px >= x && px < x + side && py >= y && py < y + side;
            image::Luma([if inside { fg } else { bg }])
        })
    }

    #[test]
    fn test_constant_image_has_no_detections() {
        let cascade = dark_square_cascade();
        let gray = GrayImage::from_pixel(60, 60, image::Luma([180]));
        let params = DetectionParams::new(1.2, 0).unwrap();
        assert!(cascade.detect(&gray, &params).is_empty());
    }

    #[test]
    fn test_image_smaller_than_window() {
        let cascade = dark_square_cascade();
        let gray = GrayImage::new(20, 30);
        let params = DetectionParams::new(1.1, 0).unwrap();
        assert!(cascade.detect(&gray, &params).is_empty());
    }

    #[test]
    fn test_single_pattern_detected_at_known_position() {
        let cascade = dark_square_cascade();
        // Window aligned with the square starts at (8, 8).
        let gray = square_on_background(40, 16, 16, 8, 200, 20);
        let params = DetectionParams::new(2.0, 3).unwrap();
        let found = cascade.detect(&gray, &params);
        assert_eq!(found.len(), 1, "found {found:?}");
        let r = found[0];
        assert!((6..=10).contains(&r.x), "x={}", r.x);
        assert!((6..=10).contains(&r.y), "y={}", r.y);
        assert_eq!((r.width, r.height), (24, 24));
    }

    #[test]
    fn test_raw_windows_inside_image() {
        let cascade = dark_square_cascade();
        let gray = square_on_background(90, 40, 30, 12, 220, 10);
        let params = DetectionParams::new(1.1, 0).unwrap();
        let bounds = Region::full(90, 90);
        let found = cascade.detect(&gray, &params);
        assert!(!found.is_empty());
        assert!(found.iter().all(|r| bounds.contains(r)));
    }

    #[test]
    fn test_min_neighbors_never_increases_count() {
        let cascade = dark_square_cascade();
        let mut gray = square_on_background(120, 20, 20, 8, 210, 30);
        for (x, y, v) in [(70u32, 25u32, 120u8), (40, 80, 60), (90, 90, 160)] {
            for py in y..y + 8 {
                for px in x..x + 8 {
                    gray.put_pixel(px, py, image::Luma([v]));
                }
            }
        }
        let mut previous = usize::MAX;
        for n in 1..=10 {
            let params = DetectionParams::new(1.3, n).unwrap();
            let count = cascade.detect(&gray, &params).len();
            assert!(count <= previous, "count rose to {count} at min_neighbors={n}");
            previous = count;
        }
    }

    #[test]
    fn test_tilted_cascade_evaluates() {
        let feature = HaarFeature {
            rects: vec![rect(12, 0, 6, 6, -1.0), rect(12, 4, 2, 2, 9.0)],
            tilted: true,
        };
        let stage = Stage {
            threshold: 0.0,
            trees: vec![stump(0, 0.0, -1.0, 1.0)],
        };
        let cascade = HaarCascade::new(24, 24, vec![stage], vec![feature]).unwrap();
        assert!(cascade.has_tilted_features());
        let gray = square_on_background(48, 10, 10, 12, 50, 250);
        let params = DetectionParams::new(1.5, 0).unwrap();
        let bounds = Region::full(48, 48);
        assert!(cascade.detect(&gray, &params).iter().all(|r| bounds.contains(r)));
    }

    #[test]
    fn test_rejects_empty_stages() {
        let err = HaarCascade::new(24, 24, vec![], vec![]).unwrap_err();
        assert!(matches!(err, CascadeError::Inconsistent(_)));
    }

    #[test]
    fn test_rejects_zero_window() {
        let stage = Stage {
            threshold: 0.0,
            trees: vec![stump(0, 0.0, 1.0, -1.0)],
        };
        let feature = HaarFeature {
            rects: vec![rect(0, 0, 1, 1, 1.0)],
            tilted: false,
        };
        assert!(HaarCascade::new(0, 24, vec![stage], vec![feature]).is_err());
    }

    #[test]
    fn test_rejects_missing_feature() {
        let stage = Stage {
            threshold: 0.0,
            trees: vec![stump(3, 0.0, 1.0, -1.0)],
        };
        let feature = HaarFeature {
            rects: vec![rect(0, 0, 4, 4, 1.0)],
            tilted: false,
        };
        let err = HaarCascade::new(24, 24, vec![stage], vec![feature]).unwrap_err();
        assert!(err.to_string().contains("feature 3"));
    }

    #[test]
    fn test_rejects_missing_leaf() {
        let mut tree = stump(0, 0.0, 1.0, -1.0);
        tree.leaves.truncate(1);
        let stage = Stage {
            threshold: 0.0,
            trees: vec![tree],
        };
        let feature = HaarFeature {
            rects: vec![rect(0, 0, 4, 4, 1.0)],
            tilted: false,
        };
        assert!(HaarCascade::new(24, 24, vec![stage], vec![feature]).is_err());
    }

    #[test]
    fn test_rejects_backward_child() {
        let tree = WeakTree {
            nodes: vec![
                TreeNode {
                    left: 1,
                    right: -1,
                    feature: 0,
                    threshold: 0.0,
                },
                TreeNode {
                    left: 1,
                    right: 0,
                    feature: 0,
                    threshold: 0.0,
                },
            ],
            leaves: vec![1.0, -1.0],
        };
        let stage = Stage {
            threshold: 0.0,
            trees: vec![tree],
        };
        let feature = HaarFeature {
            rects: vec![rect(0, 0, 4, 4, 1.0)],
            tilted: false,
        };
        assert!(HaarCascade::new(24, 24, vec![stage], vec![feature]).is_err());
    }

    #[test]
    fn test_rejects_rect_outside_window() {
        let stage = Stage {
            threshold: 0.0,
            trees: vec![stump(0, 0.0, 1.0, -1.0)],
        };
        let feature = HaarFeature {
            rects: vec![rect(20, 0, 8, 4, 1.0)],
            tilted: false,
        };
        assert!(HaarCascade::new(24, 24, vec![stage], vec![feature]).is_err());
    }

    /// Cascade whose single stump accepts whatever the feature value is.
    fn accept_all_cascade() -> HaarCascade {
        let stage = Stage {
            threshold: 0.0,
            trees: vec![stump(0, 0.0, 1.0, 1.0)],
        };
        let feature = HaarFeature {
            rects: vec![rect(0, 0, 24, 24, 1.0)],
            tilted: false,
        };
        HaarCascade::new(24, 24, vec![stage], vec![feature]).unwrap()
    }

    fn checkerboard(size: u32, dark: u8, light: u8) -> GrayImage {
        GrayImage::from_fn(size, size, |x, y| {
            image::Luma([if (x + y) % 2 == 0 { dark } else { light }])
        })
    }

    #[test]
    fn test_flat_window_never_evaluated() {
        let gray = GrayImage::from_pixel(24, 24, image::Luma([100]));
        let params = DetectionParams::new(1.5, 0).unwrap();
        assert!(accept_all_cascade().detect(&gray, &params).is_empty());
    }

    #[test]
    fn test_low_contrast_window_never_evaluated() {
        // stddev 2
        let gray = checkerboard(24, 126, 130);
        let params = DetectionParams::new(1.5, 0).unwrap();
        assert!(accept_all_cascade().detect(&gray, &params).is_empty());
    }

    #[test]
    fn test_textured_window_evaluated() {
        // stddev 100
        let gray = checkerboard(24, 0, 200);
        let params = DetectionParams::new(1.5, 0).unwrap();
        assert_eq!(
            accept_all_cascade().detect(&gray, &params),
            vec![Region::new(0, 0, 24, 24)]
        );
    }

    // Feature value on the 0/200 checkerboard is about +/-57600 / (484 * 100).
    #[rstest]
    #[case::right_then_left(1.0, vec![Region::new(0, 0, 24, 24)])]
    #[case::left_leaf(-1.0, vec![])]
    fn test_two_level_tree_walk(#[case] weight: f64, #[case] expected: Vec<Region>) {
        // Root splits at -1; its right child splits again.
        let feature = HaarFeature {
            rects: vec![rect(0, 0, 24, 24, weight)],
            tilted: false,
        };
        let tree = WeakTree {
            nodes: vec![
                TreeNode {
                    left: 0,
                    right: 1,
                    feature: 0,
                    threshold: -1.0,
                },
                TreeNode {
                    left: -1,
                    right: -2,
                    feature: 0,
                    threshold: 1e12,
                },
            ],
            leaves: vec![-1.0, 1.0, -1.0],
        };
        let stage = Stage {
            threshold: 0.0,
            trees: vec![tree],
        };
        let cascade = HaarCascade::new(24, 24, vec![stage], vec![feature]).unwrap();
        let gray = checkerboard(24, 0, 200);
        let params = DetectionParams::new(1.5, 0).unwrap();
        assert_eq!(cascade.detect(&gray, &params), expected);
    }
}
