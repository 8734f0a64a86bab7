use crate::prediction_service::PredictionError;

/// Receives pipeline failures. The prediction service reports each failed call
/// exactly once and never propagates the error further.
pub trait DiagnosticSink: Send + Sync + 'static {
    fn report(&self, error: &PredictionError);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl DiagnosticSink for TracingDiagnostics {
    fn report(&self, error: &PredictionError) {
        tracing::error!(kind = error.kind(), "Error getting prediction: {}", error);
    }
}
