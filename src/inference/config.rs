//! Predictor configuration
//!
//! Loaded from JSON so a deployment can tune presentation and resampling
//! without a rebuild. The network resolution itself is not configurable; it
//! comes from the model manifest.

use std::path::Path;

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

use crate::classes::NUM_CLASSES;
use crate::utils::error::{PlantDocError, Result};

/// Resampling filter used when resizing uploads to the network resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl ResizeFilter {
    pub fn to_filter_type(self) -> FilterType {
        match self {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Configuration for the predictor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    /// Number of ranked classes reported with each prediction
    pub top_k: usize,

    /// Filter used to resize uploads
    pub resize_filter: ResizeFilter,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            resize_filter: ResizeFilter::Lanczos3,
        }
    }
}

impl PredictorConfig {
    /// Configure the number of ranked classes
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Configure the resize filter
    pub fn with_resize_filter(mut self, filter: ResizeFilter) -> Self {
        self.resize_filter = filter;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 || self.top_k > NUM_CLASSES {
            return Err(PlantDocError::Config(format!(
                "top_k must be in 1..={}, got {}",
                NUM_CLASSES, self.top_k
            )));
        }
        Ok(())
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load configuration from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: PredictorConfig = serde_json::from_str(&json)
            .map_err(|e| PlantDocError::Config(format!("failed to parse {:?}: {}", path, e)))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = PredictorConfig::default();
        assert_eq!(config.top_k, 5);
        assert_eq!(config.resize_filter, ResizeFilter::Lanczos3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_top_k_bounds() {
        assert!(PredictorConfig::default().with_top_k(0).validate().is_err());
        assert!(PredictorConfig::default().with_top_k(38).validate().is_ok());
        assert!(PredictorConfig::default().with_top_k(39).validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: PredictorConfig = serde_json::from_str(r#"{"top_k": 3}"#).unwrap();
        assert_eq!(config.top_k, 3);
        assert_eq!(config.resize_filter, ResizeFilter::Lanczos3);

        let config: PredictorConfig =
            serde_json::from_str(r#"{"resize_filter": "catmull_rom"}"#).unwrap();
        assert_eq!(config.resize_filter, ResizeFilter::CatmullRom);
    }

    #[test]
    fn test_save_load() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("predictor.json");

        let original = PredictorConfig::default()
            .with_top_k(3)
            .with_resize_filter(ResizeFilter::Triangle);
        original.save(&path)?;

        assert_eq!(PredictorConfig::load(&path)?, original);
        Ok(())
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("predictor.json");
        std::fs::write(&path, r#"{"top_k": 100}"#).unwrap();

        assert!(matches!(
            PredictorConfig::load(&path),
            Err(PlantDocError::Config(_))
        ));
    }
}
