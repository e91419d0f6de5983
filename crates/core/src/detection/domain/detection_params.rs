use thiserror::Error;

use crate::shared::constants::{
    DEFAULT_FACE_MIN_NEIGHBORS, DEFAULT_FACE_SCALE_FACTOR, EYES_MIN_NEIGHBORS, EYES_SCALE_FACTOR,
    SMILE_MIN_NEIGHBORS, SMILE_SCALE_FACTOR,
};

#[derive(Error, Debug, PartialEq)]
pub enum ParamsError {
    #[error("scale factor must be a finite number greater than 1.0, got {0}")]
    ScaleFactor(f64),
}

/// Multiscale search settings for one cascade run.
///
/// `scale_factor` is the pyramid ratio between successive window sizes.
/// `min_neighbors` is how many raw windows a group needs (strictly more
/// than this value) to be reported; 0 disables grouping entirely.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectionParams {
    scale_factor: f64,
    min_neighbors: u32,
}

impl DetectionParams {
    pub fn new(scale_factor: f64, min_neighbors: u32) -> Result<Self, ParamsError> {
        if !scale_factor.is_finite() || scale_factor <= 1.0 {
            return Err(ParamsError::ScaleFactor(scale_factor));
        }
        Ok(Self {
            scale_factor,
            min_neighbors,
        })
    }

    /// Fixed eye-cascade settings.
    pub fn eyes() -> Self {
        Self {
            scale_factor: EYES_SCALE_FACTOR,
            min_neighbors: EYES_MIN_NEIGHBORS,
        }
    }

    /// Fixed smile-cascade settings.
    pub fn smile() -> Self {
        Self {
            scale_factor: SMILE_SCALE_FACTOR,
            min_neighbors: SMILE_MIN_NEIGHBORS,
        }
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    pub fn min_neighbors(&self) -> u32 {
        self.min_neighbors
    }
}

impl Default for DetectionParams {
    /// Default user-tunable face settings.
    fn default() -> Self {
        Self {
            scale_factor: DEFAULT_FACE_SCALE_FACTOR,
            min_neighbors: DEFAULT_FACE_MIN_NEIGHBORS,
        }
    }
}
