use crate::{
    diagnostics::{DiagnosticSink, TracingDiagnostics},
    inference::{run_blocking, InferenceRequest},
    model::{ClassificationCandidate, InferenceError, Model},
    preprocessing::{ImagePreprocessor, InputImage, InvalidImageError},
    selector::select,
};
use parking_lot::RwLock;
use std::sync::Arc;
use thiserror::Error;
use tokio::{sync::watch, task::JoinHandle};
use tracing::instrument;

/// Latest published outcome. `None` covers both "nothing recognised" and
/// "the last attempt failed".
pub type ClassificationResult = Option<ClassificationCandidate>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictionError {
    #[error("Invalid image: {0}")]
    InvalidImage(#[from] InvalidImageError),
    #[error("No model configured for prediction")]
    ModelUnavailable,
    #[error("Inference failed: {0}")]
    Inference(#[from] InferenceError),
}

impl PredictionError {
    pub fn kind(&self) -> &'static str {
        match self {
            PredictionError::InvalidImage(_) => "invalid_image",
            PredictionError::ModelUnavailable => "model_unavailable",
            PredictionError::Inference(_) => "inference",
        }
    }
}

/// Runs the classification pipeline and publishes its outcome.
///
/// Clones share the same model slot and result slot. Every `predict` call
/// publishes exactly once; when calls overlap, whichever finishes last wins.
#[derive(Clone)]
pub struct PredictionService {
    preprocessor: ImagePreprocessor,
    model: Arc<RwLock<Option<Model>>>,
    result: Arc<watch::Sender<ClassificationResult>>,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl PredictionService {
    pub fn new(preprocessor: ImagePreprocessor, model: Option<Model>) -> Self {
        let (result, _) = watch::channel(None);
        Self {
            preprocessor,
            model: Arc::new(RwLock::new(model)),
            result: Arc::new(result),
            diagnostics: Arc::new(TracingDiagnostics),
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Replaces the model for calls issued from now on. In-flight calls keep
    /// the model they started with.
    pub fn set_model(&self, model: Option<Model>) {
        *self.model.write() = model;
        tracing::info!(loaded = self.has_model(), "Prediction model replaced");
    }

    pub fn has_model(&self) -> bool {
        self.model.read().is_some()
    }

    pub fn current_result(&self) -> ClassificationResult {
        self.result.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ClassificationResult> {
        self.result.subscribe()
    }

    /// Starts a prediction on the current Tokio runtime. The handle yields the
    /// value this call published; dropping it does not cancel the call.
    pub fn predict(&self, image: InputImage) -> JoinHandle<ClassificationResult> {
        let service = self.clone();
        let model = self.model.read().clone();
        tokio::spawn(async move { service.predict_and_publish(model, image).await })
    }

    #[instrument(skip_all)]
    async fn predict_and_publish(
        &self,
        model: Option<Model>,
        image: InputImage,
    ) -> ClassificationResult {
        let published = match self.classify(model, image).await {
            Ok(result) => result,
            Err(err) => {
                self.diagnostics.report(&err);
                None
            }
        };

        match &published {
            Some(candidate) => tracing::debug!(
                label = %candidate.label,
                confidence = candidate.confidence,
                "Publishing classification"
            ),
            None => tracing::debug!("Publishing empty classification"),
        }
        self.result.send_replace(published.clone());
        published
    }

    /// Decoding and resizing can be as slow as the model itself, so both run
    /// together on the blocking pool.
    async fn classify(
        &self,
        model: Option<Model>,
        image: InputImage,
    ) -> Result<ClassificationResult, PredictionError> {
        let preprocessor = self.preprocessor.clone();
        let output = run_blocking(move || {
            tracing::debug!("Preprocessing image");
            let tensor = preprocessor.prepare(image)?;

            tracing::debug!("Running inference");
            InferenceRequest::new(model, tensor).run()
        })
        .wait()
        .await?;

        Ok(select(&output))
    }
}
