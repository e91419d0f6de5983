use std::fmt;

use image::RgbImage;

use crate::imaging::domain::image_encoder::ImageEncoder;
use crate::imaging::infrastructure::jpeg_encoder::JpegEncoder;
use crate::pipeline::annotate_image_use_case::AnnotateError;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Zero / one / many classification of a detection run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetectionStatus {
    NoFace,
    SingleFace,
    MultipleFaces(usize),
}

impl DetectionStatus {
    pub fn from_count(count: usize) -> Self {
        match count {
            0 => Self::NoFace,
            1 => Self::SingleFace,
            n => Self::MultipleFaces(n),
        }
    }

    pub fn face_count(&self) -> usize {
        match self {
            Self::NoFace => 0,
            Self::SingleFace => 1,
            Self::MultipleFaces(n) => *n,
        }
    }

    /// User-facing status line.
    pub fn message(&self) -> String {
        match self {
            Self::NoFace => "No face detected.".to_string(),
            Self::SingleFace => "1 face detected.".to_string(),
            Self::MultipleFaces(n) => format!("{n} faces detected."),
        }
    }
}

impl fmt::Display for DetectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// One detected face with the eyes and smiles found inside it, all in
/// full-image coordinates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FaceAnnotation {
    pub face: Region,
    pub eyes: Vec<Region>,
    pub smiles: Vec<Region>,
}

/// Output of one pipeline run: the annotated image plus what was found.
#[derive(Clone, Debug)]
pub struct AnnotationResult {
    frame: Frame,
    faces: Vec<FaceAnnotation>,
    status: DetectionStatus,
}

impl AnnotationResult {
    pub fn new(frame: Frame, faces: Vec<FaceAnnotation>) -> Self {
        let status = DetectionStatus::from_count(faces.len());
        Self {
            frame,
            faces,
            status,
        }
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn into_frame(self) -> Frame {
        self.frame
    }

    /// Faces in detector order.
    pub fn faces(&self) -> &[FaceAnnotation] {
        &self.faces
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn status(&self) -> DetectionStatus {
        self.status
    }

    /// Encodes the annotated image as the JPEG download artifact.
    pub fn to_jpeg(&self) -> Result<Vec<u8>, AnnotateError> {
        JpegEncoder::default()
            .encode(&self.frame)
            .map_err(AnnotateError::Encode)
    }

    /// RGB copy of the annotated image for on-screen display.
    ///
    /// `None` only if the frame handed to the pipeline was not 3-channel.
    pub fn display_image(&self) -> Option<RgbImage> {
        self.frame.to_rgb_image()
    }
}
