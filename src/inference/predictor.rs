//! Inference Predictor Module
//!
//! The [`Predictor`] owns the loaded classifier and its device. It is built
//! once, never mutated afterwards, and every request only borrows it.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use burn::tensor::{backend::Backend, Tensor, TensorData};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::classes::{class_name, NUM_CLASSES};
use crate::inference::config::PredictorConfig;
use crate::inference::preprocess::{decode_image, image_to_chw, open_image};
use crate::model::{load_model, ModelManifest, ResNet9, INPUT_SIZE};
use crate::utils::error::{PlantDocError, Result};

/// Index of the largest value; the lowest index wins exact ties
pub fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        if best.map_or(true, |(_, b)| v > b) {
            best = Some((i, v));
        }
    }
    best.map(|(i, _)| i)
}

/// Numerically stable softmax over a logits vector
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.iter().map(|&e| e / sum).collect()
}

/// Result of a single prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    /// Path to the input image (if applicable)
    pub image_path: Option<PathBuf>,

    /// Predicted class index
    pub class_index: usize,

    /// Predicted class label
    pub label: String,

    /// Softmax probability of the predicted class
    pub confidence: f32,

    /// Full probability distribution over all classes
    pub probabilities: Vec<f32>,

    /// Top-k predictions with their probabilities
    pub top_k: Vec<(usize, String, f32)>,

    /// Inference time in milliseconds
    pub inference_time_ms: f64,
}

impl Prediction {
    /// Build a prediction from raw logits
    pub fn from_logits(logits: &[f32], top_k: usize, inference_time: Duration) -> Result<Self> {
        if logits.len() != NUM_CLASSES {
            return Err(PlantDocError::Inference(format!(
                "expected {} logits, got {}",
                NUM_CLASSES,
                logits.len()
            )));
        }

        let class_index = argmax(logits)
            .ok_or_else(|| PlantDocError::Inference("logits contain no finite value".to_string()))?;
        let label = class_name(class_index).ok_or(PlantDocError::UnknownClass(class_index))?;

        let probabilities = softmax(logits);
        let confidence = probabilities[class_index];

        let mut indexed: Vec<(usize, f32)> = probabilities.iter().cloned().enumerate().collect();
        // Stable sort keeps lower indices first among equal probabilities
        indexed.sort_by(|a, b| b.1.total_cmp(&a.1));

        let top_k = indexed
            .into_iter()
            .take(top_k)
            .filter_map(|(idx, prob)| class_name(idx).map(|name| (idx, name.to_string(), prob)))
            .collect();

        Ok(Self {
            image_path: None,
            class_index,
            label: label.to_string(),
            confidence,
            probabilities,
            top_k,
            inference_time_ms: inference_time.as_secs_f64() * 1000.0,
        })
    }

    /// Margin between the top-1 and top-2 probabilities
    pub fn margin(&self) -> f32 {
        if self.top_k.len() >= 2 {
            self.top_k[0].2 - self.top_k[1].2
        } else {
            self.confidence
        }
    }
}

impl std::fmt::Display for Prediction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(path) = &self.image_path {
            writeln!(f, "Image: {:?}", path)?;
        }
        writeln!(f, "Prediction: {} (class {})", self.label, self.class_index)?;
        writeln!(f, "Confidence: {:.2}%", self.confidence * 100.0)?;
        writeln!(f, "Inference time: {:.2} ms", self.inference_time_ms)?;
        writeln!(f, "Top-{} predictions:", self.top_k.len())?;
        for (i, (idx, name, prob)) in self.top_k.iter().enumerate() {
            writeln!(f, "  {}. {} (class {}) - {:.2}%", i + 1, name, idx, prob * 100.0)?;
        }
        Ok(())
    }
}

/// Loaded classifier plus everything needed to run it
pub struct Predictor<B: Backend> {
    model: ResNet9<B>,
    manifest: ModelManifest,
    device: B::Device,
    config: PredictorConfig,
}

impl<B: Backend> Predictor<B> {
    /// Wrap an already constructed model
    pub fn new(
        model: ResNet9<B>,
        manifest: ModelManifest,
        device: B::Device,
        config: PredictorConfig,
    ) -> Result<Self> {
        manifest.verify()?;
        config.validate()?;

        if model.num_classes() != NUM_CLASSES {
            return Err(PlantDocError::Manifest(format!(
                "model has {} outputs, expected {}",
                model.num_classes(),
                NUM_CLASSES
            )));
        }

        Ok(Self {
            model,
            manifest,
            device,
            config,
        })
    }

    /// Load weights and manifest from disk. Any failure here is fatal for the
    /// caller: no request can be served without a model.
    pub fn load(weights: &Path, device: &B::Device, config: PredictorConfig) -> Result<Self> {
        let (model, manifest) = load_model::<B>(weights, device)?;
        Self::new(model, manifest, device.clone(), config)
    }

    pub fn manifest(&self) -> &ModelManifest {
        &self.manifest
    }

    pub fn config(&self) -> &PredictorConfig {
        &self.config
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    /// Convert a decoded image into a `[1, 3, 256, 256]` input tensor
    pub fn image_to_tensor(&self, image: &DynamicImage) -> Tensor<B, 4> {
        let size = INPUT_SIZE;
        let data = image_to_chw(image, size as u32, self.config.resize_filter.to_filter_type());
        Tensor::<B, 4>::from_floats(TensorData::new(data, [1, 3, size, size]), &self.device)
    }

    /// Run the forward pass on a single-image tensor and return its logits
    pub fn logits(&self, input: Tensor<B, 4>) -> Result<Vec<f32>> {
        let dims = input.dims();
        if dims != [1, 3, INPUT_SIZE, INPUT_SIZE] {
            return Err(PlantDocError::InvalidInput(format!(
                "expected input shape [1, 3, {}, {}], got {:?}",
                INPUT_SIZE, INPUT_SIZE, dims
            )));
        }

        let output = self.model.forward(input);
        output
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| PlantDocError::Inference(format!("failed to read logits: {:?}", e)))
    }

    /// Predicted class index for an image
    pub fn classify(&self, image: &DynamicImage) -> Result<usize> {
        let logits = self.logits(self.image_to_tensor(image))?;
        argmax(&logits)
            .ok_or_else(|| PlantDocError::Inference("logits contain no finite value".to_string()))
    }

    /// Full prediction for a decoded image
    pub fn predict(&self, image: &DynamicImage) -> Result<Prediction> {
        let input = self.image_to_tensor(image);

        let start = Instant::now();
        let logits = self.logits(input)?;
        let elapsed = start.elapsed();

        let prediction = Prediction::from_logits(&logits, self.config.top_k, elapsed)?;
        debug!(
            "Predicted {} ({:.2}%) in {:.2} ms",
            prediction.label,
            prediction.confidence * 100.0,
            prediction.inference_time_ms
        );
        Ok(prediction)
    }

    /// Decode an in-memory upload and predict on it
    pub fn predict_bytes(&self, bytes: &[u8]) -> Result<Prediction> {
        let image = decode_image(bytes)?;
        self.predict(&image)
    }

    /// Read an image file and predict on it
    pub fn predict_file(&self, path: &Path) -> Result<Prediction> {
        let image = open_image(path)?;
        let mut prediction = self.predict(&image)?;
        prediction.image_path = Some(path.to_path_buf());

        info!(
            "{:?}: {} ({:.2}%)",
            path,
            prediction.label,
            prediction.confidence * 100.0
        );
        Ok(prediction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax_picks_largest() {
        assert_eq!(argmax(&[0.1, 0.7, 0.2]), Some(1));
        assert_eq!(argmax(&[-3.0, -1.0, -2.0]), Some(1));
    }

    #[test]
    fn test_argmax_ties_go_to_lowest_index() {
        assert_eq!(argmax(&[0.5, 0.9, 0.9, 0.1]), Some(1));
    }

    #[test]
    fn test_argmax_skips_nan_and_handles_empty() {
        assert_eq!(argmax(&[f32::NAN, 0.3, 0.1]), Some(1));
        assert_eq!(argmax(&[]), None);
        assert_eq!(argmax(&[f32::NAN]), None);
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&[1.0, 2.0, 3.0, 1000.0]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(probs.iter().all(|p| p.is_finite()));
        assert_eq!(argmax(&probs), Some(3));
    }

    #[test]
    fn test_prediction_from_logits() {
        let mut logits = vec![0.0; 38];
        logits[5] = 8.0;
        logits[10] = 6.0;
        logits[3] = 4.0;

        let result = Prediction::from_logits(&logits, 5, Duration::from_millis(50)).unwrap();

        assert_eq!(result.class_index, 5);
        assert_eq!(result.label, "Cherry_(including_sour)___Powdery_mildew");
        assert_eq!(result.top_k.len(), 5);
        assert_eq!(result.top_k[0].0, 5);
        assert_eq!(result.top_k[1].0, 10);
        assert_eq!(result.top_k[2].0, 3);
        assert!(result.confidence > 0.8);
        assert!(result.margin() > 0.0);
        assert!((result.inference_time_ms - 50.0).abs() < 1e-6);
    }

    #[test]
    fn test_prediction_rejects_wrong_length() {
        let result = Prediction::from_logits(&[0.0; 39], 5, Duration::ZERO);
        assert!(matches!(result, Err(PlantDocError::Inference(_))));
    }

    #[test]
    fn test_prediction_display() {
        let mut logits = vec![0.0; 38];
        logits[37] = 5.0;
        let result = Prediction::from_logits(&logits, 3, Duration::from_millis(5)).unwrap();
        let text = result.to_string();
        assert!(text.contains("Tomato___healthy"));
        assert!(text.contains("Top-3 predictions"));
    }
}
