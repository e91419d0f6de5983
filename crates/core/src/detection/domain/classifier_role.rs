use std::fmt;

use crate::shared::constants::{EYES_CASCADE_NAME, FACE_CASCADE_NAME, SMILE_CASCADE_NAME};

/// Which pretrained cascade a classifier plays in the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClassifierRole {
    Face,
    Eyes,
    Smile,
}

impl ClassifierRole {
    /// Load order. The face cascade comes first so nothing else is
    /// attempted without it.
    pub const ALL: [ClassifierRole; 3] = [
        ClassifierRole::Face,
        ClassifierRole::Eyes,
        ClassifierRole::Smile,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            ClassifierRole::Face => FACE_CASCADE_NAME,
            ClassifierRole::Eyes => EYES_CASCADE_NAME,
            ClassifierRole::Smile => SMILE_CASCADE_NAME,
        }
    }
}

impl fmt::Display for ClassifierRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifierRole::Face => write!(f, "face"),
            ClassifierRole::Eyes => write!(f, "eyes"),
            ClassifierRole::Smile => write!(f, "smile"),
        }
    }
}
