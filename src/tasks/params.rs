//! User input for starting operations, validated before any network call.

use crate::console::ConsoleError;
use crate::hub::ImageFile;
use std::path::PathBuf;

/// Labeled images to upload for one object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadParams {
    pub object_name: String,
    pub files: Vec<PathBuf>,
}

/// Files accepted for upload, plus how many were skipped as non-images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSelection {
    pub object_name: String,
    pub images: Vec<ImageFile>,
    pub skipped: usize,
}

impl UploadParams {
    pub fn new(object_name: impl Into<String>, files: Vec<PathBuf>) -> Self {
        Self {
            object_name: object_name.into(),
            files,
        }
    }

    /// Check required fields and keep only image files.
    pub fn validate(&self) -> Result<UploadSelection, ConsoleError> {
        let object_name = require_name(&self.object_name)?;

        if self.files.is_empty() {
            return Err(ConsoleError::validation(
                "files",
                "no files selected: please select images to upload",
            ));
        }

        let images: Vec<ImageFile> = self
            .files
            .iter()
            .filter_map(|p| ImageFile::from_path(p.clone()))
            .collect();
        let skipped = self.files.len() - images.len();

        if images.is_empty() {
            return Err(ConsoleError::validation(
                "files",
                "no image files in selection: only image files are allowed",
            ));
        }

        Ok(UploadSelection {
            object_name,
            images,
            skipped,
        })
    }
}

/// Training run for one object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingParams {
    pub object_name: String,
}

impl TrainingParams {
    pub fn new(object_name: impl Into<String>) -> Self {
        Self {
            object_name: object_name.into(),
        }
    }

    /// Returns the trimmed object name.
    pub fn validate(&self) -> Result<String, ConsoleError> {
        require_name(&self.object_name)
    }
}

/// Deployment of a trained model to the edge device.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeploymentParams {
    /// `None` uses the configured default
    pub model_type: Option<String>,
}

impl DeploymentParams {
    /// Resolve the model type against `default`.
    pub fn validate(&self, default: &str) -> Result<String, ConsoleError> {
        let model_type = self.model_type.as_deref().unwrap_or(default).trim();
        if model_type.is_empty() {
            return Err(ConsoleError::validation(
                "model_type",
                "Please enter model type",
            ));
        }
        Ok(model_type.to_string())
    }
}

fn require_name(name: &str) -> Result<String, ConsoleError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ConsoleError::validation(
            "object_name",
            "Please enter object name",
        ));
    }
    Ok(name.to_string())
}
