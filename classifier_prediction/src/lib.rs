mod inference;
mod labels;
mod ort_model;
mod selector;

pub mod app;
pub mod config;
pub mod diagnostics;
pub mod model;
pub mod prediction_service;
pub mod preprocessing;
pub mod telemetry;

pub use app::start_app;
pub use inference::{InferenceRequest, PendingInference};
pub use model::{ClassificationCandidate, ClassificationModel, InferenceError, Model};
pub use ort_model::{ModelLoadError, OrtModel};
pub use prediction_service::{ClassificationResult, PredictionError, PredictionService};
pub use preprocessing::{ImagePreprocessor, InputImage, PixelFormat};
pub use selector::select;
