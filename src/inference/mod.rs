//! Inference: image preprocessing and the loaded classifier
//!
//! Uploads go through [`preprocess`] to become a `[1, 3, 256, 256]` tensor,
//! then the [`Predictor`] runs the forward pass and picks the arg-max class.

pub mod config;
pub mod predictor;
pub mod preprocess;

// Re-export main types for convenience
pub use config::{PredictorConfig, ResizeFilter};
pub use predictor::{argmax, softmax, Prediction, Predictor};
pub use preprocess::{decode_image, image_to_chw, open_image};
