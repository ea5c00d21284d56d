//! Diagnosis service: classify a leaf image and attach its reference record.

use std::path::Path;

use burn::tensor::backend::Backend;
use image::DynamicImage;
use serde::Serialize;
use tracing::warn;

use crate::classes::normalize_label;
use crate::disease::{DiseaseRecord, DiseaseTable};
use crate::inference::{Prediction, Predictor};
use crate::utils::error::Result;

/// Outcome of one diagnosis request
#[derive(Debug, Clone, Serialize)]
pub struct Diagnosis {
    pub prediction: Prediction,
    /// Normalized key derived from the predicted label
    pub lookup_key: String,
    /// `None` when the table has no entry for `lookup_key`
    pub record: Option<DiseaseRecord>,
}

impl Diagnosis {
    pub fn is_known(&self) -> bool {
        self.record.is_some()
    }
}

/// Predictor and reference table, both immutable once built
pub struct Diagnoser<B: Backend> {
    predictor: Predictor<B>,
    table: DiseaseTable,
}

impl<B: Backend> Diagnoser<B> {
    pub fn new(predictor: Predictor<B>, table: DiseaseTable) -> Self {
        Self { predictor, table }
    }

    pub fn predictor(&self) -> &Predictor<B> {
        &self.predictor
    }

    pub fn table(&self) -> &DiseaseTable {
        &self.table
    }

    /// Resolve a predicted label against the table. A miss is reported and
    /// turned into `None`; it never fails the request.
    pub fn lookup(&self, label: &str) -> (String, Option<DiseaseRecord>) {
        let key = normalize_label(label);
        match self.table.lookup(&key) {
            Ok(record) => (key, Some(record.clone())),
            Err(e) => {
                warn!("No reference information for {}: {}", label, e);
                (key, None)
            }
        }
    }

    pub fn diagnose_image(&self, image: &DynamicImage) -> Result<Diagnosis> {
        let prediction = self.predictor.predict(image)?;
        Ok(self.attach(prediction))
    }

    pub fn diagnose_path(&self, path: &Path) -> Result<Diagnosis> {
        let prediction = self.predictor.predict_file(path)?;
        Ok(self.attach(prediction))
    }

    pub fn diagnose_bytes(&self, bytes: &[u8]) -> Result<Diagnosis> {
        let prediction = self.predictor.predict_bytes(bytes)?;
        Ok(self.attach(prediction))
    }

    fn attach(&self, prediction: Prediction) -> Diagnosis {
        let (lookup_key, record) = self.lookup(&prediction.label);
        Diagnosis {
            prediction,
            lookup_key,
            record,
        }
    }
}

#[cfg(all(test, feature = "ndarray"))]
mod tests {
    use super::*;
    use crate::classes::{CLASS_LABELS, NUM_CLASSES};
    use crate::inference::PredictorConfig;
    use crate::model::{ModelManifest, ResNet9Config};
    use crate::utils::error::PlantDocError;
    use burn_ndarray::NdArray;
    use image::ImageFormat;
    use std::io::Cursor;
    use tempfile::TempDir;

    type TestBackend = NdArray;

    fn diagnoser() -> Diagnoser<TestBackend> {
        let device = Default::default();
        let config = ResNet9Config::new().with_base_width(4);
        let model = config.init::<TestBackend>(&device);
        let predictor = Predictor::new(
            model,
            ModelManifest::for_config(&config),
            device,
            PredictorConfig::default().with_top_k(3),
        )
        .unwrap();
        Diagnoser::new(predictor, DiseaseTable::builtin().unwrap())
    }

    #[test]
    fn test_lookup_hit() {
        let diagnoser = diagnoser();
        let (key, record) = diagnoser.lookup("Tomato___Late_blight");
        assert_eq!(key, "late blight");
        assert!(record.is_some());
    }

    #[test]
    fn test_lookup_miss_is_not_an_error() {
        let diagnoser = diagnoser();
        let (key, record) = diagnoser.lookup("Corn_(maize)___Common_rust_");
        assert_eq!(key, "(maize) common rust ");
        assert!(record.is_none());
    }

    #[test]
    fn test_every_label_either_resolves_or_is_reported_unreachable() {
        let diagnoser = diagnoser();
        let unreachable = diagnoser.table().unreachable_labels();
        for label in CLASS_LABELS.iter() {
            let (_, record) = diagnoser.lookup(label);
            assert_eq!(record.is_none(), unreachable.contains(label));
        }
    }

    #[test]
    fn test_diagnose_image() {
        let diagnoser = diagnoser();
        let diagnosis = diagnoser
            .diagnose_image(&DynamicImage::new_rgb8(40, 30))
            .unwrap();

        assert!(diagnosis.prediction.class_index < NUM_CLASSES);
        assert_eq!(diagnosis.prediction.top_k.len(), 3);
        assert_eq!(
            diagnosis.lookup_key,
            normalize_label(&diagnosis.prediction.label)
        );
        assert_eq!(
            diagnosis.is_known(),
            diagnoser.table().contains(&diagnosis.lookup_key)
        );
    }

    #[test]
    fn test_diagnose_path_and_bytes() {
        let diagnoser = diagnoser();
        let mut png = Vec::new();
        DynamicImage::new_rgb8(16, 16)
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("leaf.png");
        std::fs::write(&path, &png).unwrap();

        let from_path = diagnoser.diagnose_path(&path).unwrap();
        let from_bytes = diagnoser.diagnose_bytes(&png).unwrap();

        assert_eq!(from_path.prediction.image_path.as_deref(), Some(path.as_path()));
        assert_eq!(
            from_path.prediction.class_index,
            from_bytes.prediction.class_index
        );
    }

    #[test]
    fn test_bad_upload_fails_only_the_request() {
        let diagnoser = diagnoser();
        assert!(matches!(
            diagnoser.diagnose_bytes(b"not an image"),
            Err(PlantDocError::ImageDecode(_))
        ));
        assert!(diagnoser
            .diagnose_image(&DynamicImage::new_rgb8(8, 8))
            .is_ok());
    }
}
