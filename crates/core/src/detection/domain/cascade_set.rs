use crate::detection::domain::classifier_role::ClassifierRole;
use crate::detection::domain::object_detector::ObjectDetector;

/// The three detectors the annotation pipeline runs, one per role.
///
/// Built once (normally by the cascade loader) and handed to the pipeline;
/// immutable afterwards.
pub struct CascadeSet {
    face: Box<dyn ObjectDetector>,
    eyes: Box<dyn ObjectDetector>,
    smile: Box<dyn ObjectDetector>,
}

impl CascadeSet {
    pub fn new(
        face: Box<dyn ObjectDetector>,
        eyes: Box<dyn ObjectDetector>,
        smile: Box<dyn ObjectDetector>,
    ) -> Self {
        Self { face, eyes, smile }
    }

    pub fn get(&self, role: ClassifierRole) -> &dyn ObjectDetector {
        match role {
            ClassifierRole::Face => self.face.as_ref(),
            ClassifierRole::Eyes => self.eyes.as_ref(),
            ClassifierRole::Smile => self.smile.as_ref(),
        }
    }
}
