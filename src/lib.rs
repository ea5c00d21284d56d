//! # plantdoc
//!
//! Plant leaf disease diagnosis with the Burn framework.
//!
//! A ResNet9 classifier predicts one of the 38 PlantVillage classes for a leaf
//! photo. The predicted label is normalized into a lookup key and resolved
//! against a static reference table of descriptions, symptoms, treatment tips
//! and videos.
//!
//! ## Modules
//!
//! - `classes`: the canonical class-label list and label normalization
//! - `disease`: the reference table and its collision report
//! - `model`: ResNet9 built with Burn, plus the weights manifest
//! - `inference`: image preprocessing and the [`Predictor`]
//! - `diagnosis`: prediction plus table lookup
//! - `utils`: errors, logging and display helpers
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use plantdoc::backend::{default_device, DefaultBackend};
//! use plantdoc::{Diagnoser, DiseaseTable, Predictor, PredictorConfig};
//!
//! let device = default_device();
//! let predictor = Predictor::<DefaultBackend>::load(
//!     "models/resnet9".as_ref(),
//!     &device,
//!     PredictorConfig::default(),
//! )?;
//! let diagnoser = Diagnoser::new(predictor, DiseaseTable::builtin()?);
//! let diagnosis = diagnoser.diagnose_path("leaf.jpg".as_ref())?;
//! ```

pub mod backend;
pub mod classes;
pub mod diagnosis;
pub mod disease;
pub mod inference;
pub mod model;
pub mod utils;

// Re-export commonly used items for convenience
pub use classes::{normalize_label, CLASS_LABELS, NUM_CLASSES};
pub use diagnosis::{Diagnoser, Diagnosis};
pub use disease::{DiseaseRecord, DiseaseTable, KeyCollision};
pub use inference::{Prediction, Predictor, PredictorConfig};
pub use model::{ModelManifest, ResNet9, ResNet9Config, INPUT_SIZE};
pub use utils::error::{PlantDocError, Result};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
