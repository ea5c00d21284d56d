//! Model module: the ResNet9 classifier and its on-disk artifact
//!
//! A model artifact is two files sharing a stem:
//! - `<stem>.mpk`: weights written by Burn's `CompactRecorder`
//! - `<stem>.manifest.json`: the [`ModelManifest`] describing them

pub mod manifest;
pub mod resnet;

use std::fs;
use std::path::Path;

use burn::{module::Module, record::CompactRecorder, tensor::backend::Backend};
use tracing::info;

use crate::utils::error::{PlantDocError, Result};

// Re-export main types for convenience
pub use manifest::ModelManifest;
pub use resnet::{ResNet9, ResNet9Config, INPUT_SIZE};

/// Write weights and a matching manifest for `model`
pub fn save_model<B: Backend>(
    model: ResNet9<B>,
    config: &ResNet9Config,
    weights: &Path,
) -> Result<ModelManifest> {
    if let Some(parent) = weights.parent() {
        fs::create_dir_all(parent)?;
    }

    model
        .save_file(weights.to_path_buf(), &CompactRecorder::new())
        .map_err(|e| PlantDocError::Serialization(format!("Failed to save weights: {:?}", e)))?;

    let manifest = ModelManifest::for_config(config);
    manifest.save(&ModelManifest::path_for(weights))?;

    info!("Model saved to {:?}", weights);
    Ok(manifest)
}

/// Load a model artifact, verifying its manifest before touching the weights
pub fn load_model<B: Backend>(
    weights: &Path,
    device: &B::Device,
) -> Result<(ResNet9<B>, ModelManifest)> {
    let manifest = ModelManifest::load(&ModelManifest::path_for(weights))?;
    manifest.verify()?;

    let model = manifest
        .model_config()
        .init::<B>(device)
        .load_file(weights.to_path_buf(), &CompactRecorder::new(), device)
        .map_err(|e| PlantDocError::ModelLoad {
            path: weights.to_path_buf(),
            reason: format!("{:?}", e),
        })?;

    info!(
        "Loaded {} (base width {}, {} parameters) from {:?}",
        manifest.architecture,
        manifest.base_width,
        model.num_params(),
        weights
    );

    Ok((model, manifest))
}

#[cfg(all(test, feature = "ndarray"))]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;
    use tempfile::TempDir;

    type TestBackend = NdArray;

    #[test]
    fn test_save_load_round_trip() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let weights = temp_dir.path().join("models").join("resnet9");
        let device = Default::default();

        let config = ResNet9Config::new().with_base_width(4);
        let model: ResNet9<TestBackend> = config.init(&device);
        let saved = save_model(model, &config, &weights)?;

        assert!(ModelManifest::path_for(&weights).exists());

        let (loaded, manifest) = load_model::<TestBackend>(&weights, &device)?;
        assert_eq!(manifest, saved);
        assert_eq!(loaded.num_classes(), 38);
        Ok(())
    }

    #[test]
    fn test_missing_weights_is_a_load_failure() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let weights = temp_dir.path().join("resnet9");

        // Manifest present, weights absent
        let config = ResNet9Config::new().with_base_width(4);
        ModelManifest::for_config(&config).save(&ModelManifest::path_for(&weights))?;

        let device = Default::default();
        let result = load_model::<TestBackend>(&weights, &device);
        assert!(matches!(result, Err(PlantDocError::ModelLoad { .. })));
        Ok(())
    }

    #[test]
    fn test_missing_manifest_is_a_load_failure() {
        let temp_dir = TempDir::new().unwrap();
        let device = Default::default();
        let result = load_model::<TestBackend>(&temp_dir.path().join("resnet9"), &device);
        assert!(matches!(result, Err(PlantDocError::Manifest(_))));
    }
}
