//! Model manifest
//!
//! A JSON file stored next to the weights that pins the contract between a
//! weights artifact and this build: the architecture, its width, the input
//! resolution and the exact ordered class-label list the output layer was
//! trained against.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::classes::{CLASS_LABELS, NUM_CLASSES};
use crate::model::resnet::{ResNet9Config, ARCHITECTURE, INPUT_SIZE};
use crate::utils::error::{PlantDocError, Result};

/// Version of the manifest layout written by this build
pub const MANIFEST_FORMAT_VERSION: u32 = 1;

/// Suffix replacing the weights file extension
const MANIFEST_EXTENSION: &str = "manifest.json";

/// Metadata describing a weights artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelManifest {
    pub format_version: u32,
    pub architecture: String,
    pub num_classes: usize,
    pub input_size: usize,
    pub base_width: usize,
    /// Output-layer order of the weights
    pub class_labels: Vec<String>,
    /// RFC 3339 creation time
    pub created_at: String,
}

impl ModelManifest {
    /// Manifest for weights produced from `config` against the compiled label list
    pub fn for_config(config: &ResNet9Config) -> Self {
        Self {
            format_version: MANIFEST_FORMAT_VERSION,
            architecture: ARCHITECTURE.to_string(),
            num_classes: config.num_classes,
            input_size: INPUT_SIZE,
            base_width: config.base_width,
            class_labels: CLASS_LABELS.iter().map(|l| l.to_string()).collect(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Location of the manifest belonging to a weights path.
    ///
    /// `models/resnet9` and `models/resnet9.mpk` both map to
    /// `models/resnet9.manifest.json`.
    pub fn path_for(weights: &Path) -> PathBuf {
        weights.with_extension(MANIFEST_EXTENSION)
    }

    /// Network configuration described by this manifest
    pub fn model_config(&self) -> ResNet9Config {
        ResNet9Config::new()
            .with_num_classes(self.num_classes)
            .with_base_width(self.base_width)
    }

    /// Check the manifest against this build's architecture and label list
    pub fn verify(&self) -> Result<()> {
        if self.format_version != MANIFEST_FORMAT_VERSION {
            return Err(PlantDocError::Manifest(format!(
                "format version {} is not supported (expected {})",
                self.format_version, MANIFEST_FORMAT_VERSION
            )));
        }

        if self.architecture != ARCHITECTURE {
            return Err(PlantDocError::Manifest(format!(
                "architecture '{}' does not match '{}'",
                self.architecture, ARCHITECTURE
            )));
        }

        if self.input_size != INPUT_SIZE {
            return Err(PlantDocError::Manifest(format!(
                "input size {} does not match {}",
                self.input_size, INPUT_SIZE
            )));
        }

        if self.base_width == 0 {
            return Err(PlantDocError::Manifest("base width must be positive".to_string()));
        }

        if self.num_classes != NUM_CLASSES || self.class_labels.len() != NUM_CLASSES {
            return Err(PlantDocError::Manifest(format!(
                "expected {} classes, manifest declares {} with {} labels",
                NUM_CLASSES,
                self.num_classes,
                self.class_labels.len()
            )));
        }

        if let Some((index, (found, expected))) = self
            .class_labels
            .iter()
            .zip(CLASS_LABELS.iter())
            .enumerate()
            .find(|(_, (found, expected))| found.as_str() != **expected)
        {
            return Err(PlantDocError::Manifest(format!(
                "class {} is '{}' in the manifest but '{}' in this build",
                index, found, expected
            )));
        }

        debug!("Manifest verified: {} {}x", self.architecture, self.base_width);
        Ok(())
    }

    /// Save manifest to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;

        info!("Manifest saved to {:?}", path);
        Ok(())
    }

    /// Load manifest from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PlantDocError::Manifest(format!(
                "no manifest found at {:?}",
                path
            )));
        }

        let json = fs::read_to_string(path)?;
        let manifest: ModelManifest = serde_json::from_str(&json)
            .map_err(|e| PlantDocError::Manifest(format!("failed to parse {:?}: {}", path, e)))?;

        info!("Manifest loaded from {:?}", path);
        Ok(manifest)
    }
}
