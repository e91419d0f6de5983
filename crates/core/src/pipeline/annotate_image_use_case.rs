use std::time::Instant;

use image::GrayImage;
use thiserror::Error;

use crate::annotation::domain::annotation_style::AnnotationStyle;
use crate::annotation::domain::frame_annotator::FrameAnnotator;
use crate::detection::domain::cascade_set::CascadeSet;
use crate::detection::domain::classifier_role::ClassifierRole;
use crate::detection::domain::detection_params::DetectionParams;
use crate::imaging::domain::image_io_error::ImageIoError;
use crate::imaging::infrastructure::image_decoder::decode_image;
use crate::pipeline::annotation_result::{AnnotationResult, FaceAnnotation};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Per-request failures surfaced to the user.
#[derive(Error, Debug)]
pub enum AnnotateError {
    #[error("could not decode the submitted image: {0}")]
    Decode(#[source] ImageIoError),

    #[error("could not encode the annotated image: {0}")]
    Encode(#[source] ImageIoError),
}

/// Single-image pipeline: gray → detect faces → per face, outline it and
/// look for eyes and a smile inside it.
pub struct AnnotateImageUseCase {
    cascades: CascadeSet,
    annotator: Box<dyn FrameAnnotator>,
    logger: Box<dyn PipelineLogger>,
}

impl AnnotateImageUseCase {
    pub fn new(
        cascades: CascadeSet,
        annotator: Box<dyn FrameAnnotator>,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            cascades,
            annotator,
            logger,
        }
    }

    /// Decodes `bytes` and annotates the result.
    pub fn execute_bytes(
        &mut self,
        bytes: &[u8],
        face_params: &DetectionParams,
        style: &AnnotationStyle,
    ) -> Result<AnnotationResult, AnnotateError> {
        let frame = decode_image(bytes).map_err(AnnotateError::Decode)?;
        Ok(self.execute(frame, face_params, style))
    }

    /// Annotates an RGB frame in place and reports what was found.
    ///
    /// Faces are processed in detector order. Eye and smile hits are
    /// translated into image coordinates and clipped to their face.
    pub fn execute(
        &mut self,
        mut frame: Frame,
        face_params: &DetectionParams,
        style: &AnnotationStyle,
    ) -> AnnotationResult {
        let start = Instant::now();
        let gray = frame.to_gray();
        self.logger.timing("gray", elapsed_ms(start));

        let start = Instant::now();
        let faces = self
            .cascades
            .get(ClassifierRole::Face)
            .detect(&gray, face_params);
        self.logger.timing("detect_faces", elapsed_ms(start));
        self.logger.metric("faces", faces.len() as f64);

        let bounds = Region::full(gray.width(), gray.height());
        let mut annotations = Vec::with_capacity(faces.len());
        let mut detect_ms = 0.0;
        let mut annotate_ms = 0.0;

        for (i, face) in faces.iter().enumerate() {
            self.logger.progress(i + 1, faces.len());

            let start = Instant::now();
            self.annotator
                .outline(&mut frame, &[*face], style.face_color, style.stroke_width);
            annotate_ms += elapsed_ms(start);

            let visible = face.clip_to(&bounds);
            if face.is_empty() || visible.is_empty() {
                log::debug!("Skipping feature search in empty face {face:?}");
                annotations.push(FaceAnnotation {
                    face: *face,
                    eyes: Vec::new(),
                    smiles: Vec::new(),
                });
                continue;
            }

            let start = Instant::now();
            let roi = crop(&gray, &visible);
            let eyes = self.detect_in_face(ClassifierRole::Eyes, &roi, &visible, face);
            let smiles = self.detect_in_face(ClassifierRole::Smile, &roi, &visible, face);
            detect_ms += elapsed_ms(start);

            let start = Instant::now();
            self.annotator
                .outline(&mut frame, &eyes, style.eyes_color, style.stroke_width);
            self.annotator
                .outline(&mut frame, &smiles, style.smile_color, style.stroke_width);
            annotate_ms += elapsed_ms(start);

            self.logger.metric("eyes", eyes.len() as f64);
            self.logger.metric("smiles", smiles.len() as f64);
            annotations.push(FaceAnnotation {
                face: *face,
                eyes,
                smiles,
            });
        }

        if !faces.is_empty() {
            self.logger.timing("detect_features", detect_ms);
            self.logger.timing("annotate", annotate_ms);
        }

        let result = AnnotationResult::new(frame, annotations);
        self.logger.info(&result.status().message());
        result
    }

    /// Encodes the annotated image of `result` as the JPEG download
    /// artifact, recording the `encode` stage.
    pub fn encode_jpeg(&mut self, result: &AnnotationResult) -> Result<Vec<u8>, AnnotateError> {
        let start = Instant::now();
        let bytes = result.to_jpeg()?;
        self.logger.timing("encode", elapsed_ms(start));
        Ok(bytes)
    }

    pub fn logger(&self) -> &dyn PipelineLogger {
        self.logger.as_ref()
    }

    fn detect_in_face(
        &self,
        role: ClassifierRole,
        roi: &GrayImage,
        origin: &Region,
        face: &Region,
    ) -> Vec<Region> {
        let params = match role {
            ClassifierRole::Smile => DetectionParams::smile(),
            _ => DetectionParams::eyes(),
        };
        self.cascades
            .get(role)
            .detect(roi, &params)
            .into_iter()
            .map(|r| r.translate(origin.x, origin.y).clip_to(face))
            .filter(|r| !r.is_empty())
            .collect()
    }
}

/// Owned grayscale copy of `region`, which must lie inside the image.
fn crop(gray: &GrayImage, region: &Region) -> GrayImage {
    image::imageops::crop_imm(
        gray,
        region.x as u32,
        region.y as u32,
        region.width as u32,
        region.height as u32,
    )
    .to_image()
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
