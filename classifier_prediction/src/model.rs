use ndarray::{Array, Ix4};
use std::sync::Arc;
use thiserror::Error;

/// Model input in NCHW layout, `[1, 3, size, size]`.
pub type Tensor = Array<f32, Ix4>;

/// Scores produced by one inference run. Order is whatever the model emits.
pub type RawOutput = Vec<ClassificationCandidate>;

/// Shared handle to a loaded model.
pub type Model = Arc<dyn ClassificationModel>;

#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationCandidate {
    pub label: String,
    pub confidence: f32,
}

impl ClassificationCandidate {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    #[error("failed to build input tensor: {0}")]
    Input(String),
    #[error("model execution failed: {0}")]
    Execution(String),
    #[error("unexpected output shape: expected {expected} scores, got {actual}")]
    OutputShape { expected: usize, actual: usize },
    #[error("inference task ended without a result")]
    Interrupted,
}

/// A loaded classifier. Implementations are called from Tokio's blocking pool
/// and may block for the duration of the run.
pub trait ClassificationModel: Send + Sync + 'static {
    fn classify(&self, tensor: &Tensor) -> Result<RawOutput, InferenceError>;
}
