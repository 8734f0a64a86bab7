use crate::{
    model::{InferenceError, Model, RawOutput, Tensor},
    prediction_service::PredictionError,
};
use std::any::Any;
use tokio::task::{JoinError, JoinHandle};

/// One model run over one tensor.
pub struct InferenceRequest {
    model: Option<Model>,
    tensor: Tensor,
}

/// Resolves once, with the model output or the reason there is none.
pub struct PendingInference {
    handle: JoinHandle<Result<RawOutput, PredictionError>>,
}

impl InferenceRequest {
    pub fn new(model: Option<Model>, tensor: Tensor) -> Self {
        Self { model, tensor }
    }

    /// Runs the model on the calling thread.
    pub fn run(self) -> Result<RawOutput, PredictionError> {
        let model = self.model.ok_or(PredictionError::ModelUnavailable)?;
        let output = model.classify(&self.tensor)?;
        tracing::debug!("Model returned {} candidates", output.len());
        Ok(output)
    }

    /// Moves the run onto the blocking pool. Must be called from within a
    /// Tokio runtime.
    pub fn dispatch(self) -> PendingInference {
        run_blocking(move || self.run())
    }
}

/// Runs `job` on the blocking pool. A panic inside `job` resolves the
/// returned handle with an `InferenceError` carrying the panic message.
pub(crate) fn run_blocking<F>(job: F) -> PendingInference
where
    F: FnOnce() -> Result<RawOutput, PredictionError> + Send + 'static,
{
    PendingInference {
        handle: tokio::task::spawn_blocking(job),
    }
}

impl PendingInference {
    pub async fn wait(self) -> Result<RawOutput, PredictionError> {
        self.handle.await.unwrap_or_else(|e| Err(join_failure(e)))
    }
}

fn join_failure(err: JoinError) -> PredictionError {
    let inference_error = match err.try_into_panic() {
        Ok(payload) => InferenceError::Execution(format!(
            "model panicked: {}",
            panic_message(payload.as_ref())
        )),
        Err(_) => InferenceError::Interrupted,
    };
    PredictionError::Inference(inference_error)
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic payload"
    }
}
