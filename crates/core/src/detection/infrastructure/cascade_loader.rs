use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::detection::domain::cascade_set::CascadeSet;
use crate::detection::domain::classifier_role::ClassifierRole;

use super::cascade_reader::parse_cascade;
use super::haar_cascade::{CascadeError, HaarCascade};

#[derive(Error, Debug)]
pub enum CascadeLoadError {
    #[error("missing {role} classifier file: {}", .path.display())]
    MissingResource { role: ClassifierRole, path: PathBuf },
    #[error("failed to load {role} classifier from {}: {source}", .path.display())]
    InvalidClassifier {
        role: ClassifierRole,
        path: PathBuf,
        #[source]
        source: CascadeError,
    },
}

impl CascadeLoadError {
    pub fn role(&self) -> ClassifierRole {
        match self {
            CascadeLoadError::MissingResource { role, .. } => *role,
            CascadeLoadError::InvalidClassifier { role, .. } => *role,
        }
    }
}

/// Loads the face, eye and smile cascades from `dir`.
///
/// Roles are processed in [`ClassifierRole::ALL`] order and the first
/// failure aborts the load: no partial set is ever returned.
pub fn load_cascades(dir: &Path) -> Result<CascadeSet, CascadeLoadError> {
    let face = load_role(dir, ClassifierRole::Face)?;
    let eyes = load_role(dir, ClassifierRole::Eyes)?;
    let smile = load_role(dir, ClassifierRole::Smile)?;
    Ok(CascadeSet::new(Box::new(face), Box::new(eyes), Box::new(smile)))
}

/// Resolves and parses the cascade file for one role.
pub fn load_role(dir: &Path, role: ClassifierRole) -> Result<HaarCascade, CascadeLoadError> {
    let path = dir.join(role.file_name());
    if !path.is_file() {
        return Err(CascadeLoadError::MissingResource { role, path });
    }

    let cascade = fs::read_to_string(&path)
        .map_err(CascadeError::from)
        .and_then(|xml| parse_cascade(&xml))
        .map_err(|source| CascadeLoadError::InvalidClassifier {
            role,
            path: path.clone(),
            source,
        })?;

    let (w, h) = cascade.window_size();
    log::info!(
        "Loaded {role} cascade from {} ({w}x{h} window, {} stages, {} features)",
        path.display(),
        cascade.stage_count(),
        cascade.feature_count()
    );
    Ok(cascade)
}
