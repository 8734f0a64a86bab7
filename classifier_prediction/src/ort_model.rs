use crate::{
    config::{LabelsConfig, ModelConfig, Validatable},
    labels::load_labels,
    model::{ClassificationCandidate, ClassificationModel, InferenceError, RawOutput, Tensor},
};
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::TensorRef,
};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelLoadError {
    #[error("Invalid model configuration: {0}")]
    Config(String),
    #[error("Failed to load labels: {0}")]
    Labels(#[from] std::io::Error),
    #[error("Failed to create ONNX session: {0}")]
    Session(#[from] ort::Error),
}

/// ONNX Runtime classifier backed by a small pool of sessions.
#[derive(Clone)]
pub struct OrtModel {
    sessions: Arc<Vec<Arc<Mutex<Session>>>>,
    counter: Arc<AtomicUsize>,
    labels: Arc<Vec<String>>,
    output_name: String,
    apply_softmax: bool,
}

impl OrtModel {
    pub fn new(
        model_config: &ModelConfig,
        labels_config: &LabelsConfig,
    ) -> Result<Self, ModelLoadError> {
        model_config.validate().map_err(ModelLoadError::Config)?;
        let labels = load_labels(&labels_config.get_path())?;

        let num_instances = model_config.num_instances.max(1);
        let sessions = (0..num_instances)
            .map(|_| {
                let session = Session::builder()?
                    .with_optimization_level(GraphOptimizationLevel::Level3)?
                    .commit_from_file(model_config.get_path())?;
                Ok(Arc::new(Mutex::new(session)))
            })
            .collect::<Result<Vec<_>, ort::Error>>()?;

        tracing::info!(
            labels = labels.len(),
            "Created {} ONNX sessions from {:?}",
            num_instances,
            model_config.get_path()
        );

        Ok(Self {
            sessions: Arc::new(sessions),
            counter: Arc::new(AtomicUsize::new(0)),
            labels: Arc::new(labels),
            output_name: model_config.output_name.clone(),
            apply_softmax: model_config.apply_softmax,
        })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    fn run_inference(&self, input: &Tensor) -> Result<Vec<f32>, InferenceError> {
        let index = self.counter.fetch_add(1, Ordering::SeqCst) % self.sessions.len();
        let mut session = self.sessions[index]
            .lock()
            .map_err(|e| InferenceError::Execution(format!("session mutex poisoned: {}", e)))?;

        tracing::debug!("Handling request with session {}", index);
        let owned_buffer;
        let input_view = if input.view().is_standard_layout() {
            input.view()
        } else {
            owned_buffer = input.as_standard_layout().into_owned();
            owned_buffer.view()
        };

        let tensor_ref = TensorRef::from_array_view(input_view)
            .map_err(|e| InferenceError::Input(e.to_string()))?;

        let outputs = session
            .run(ort::inputs![tensor_ref])
            .map_err(|e| InferenceError::Execution(e.to_string()))?;

        let (_, data) = outputs
            .get(self.output_name.as_str())
            .ok_or_else(|| {
                InferenceError::Execution(format!("model has no output named {}", self.output_name))
            })?
            .try_extract_tensor::<f32>()
            .map_err(|e| InferenceError::Execution(format!("failed to extract tensor: {}", e)))?;

        Ok(data.to_vec())
    }
}

impl ClassificationModel for OrtModel {
    fn classify(&self, tensor: &Tensor) -> Result<RawOutput, InferenceError> {
        let scores = self.run_inference(tensor)?;
        label_scores(&self.labels, scores, self.apply_softmax)
    }
}

/// Pairs each score with its label. A batch-of-one output (`[1, N]`) arrives
/// here already flattened.
fn label_scores(
    labels: &[String],
    mut scores: Vec<f32>,
    apply_softmax: bool,
) -> Result<RawOutput, InferenceError> {
    if scores.len() != labels.len() {
        return Err(InferenceError::OutputShape {
            expected: labels.len(),
            actual: scores.len(),
        });
    }
    if apply_softmax {
        softmax(&mut scores);
    }

    Ok(labels
        .iter()
        .zip(scores)
        .map(|(label, score)| ClassificationCandidate::new(label.clone(), score))
        .collect())
}

fn softmax(scores: &mut [f32]) {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.;
    for score in scores.iter_mut() {
        *score = (*score - max).exp();
        sum += *score;
    }
    if sum > 0. {
        for score in scores.iter_mut() {
            *score /= sum;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn labels() -> Vec<String> {
        vec!["cat".to_string(), "dog".to_string()]
    }

    #[test]
    fn test_label_scores_pairs_in_order() {
        let output = label_scores(&labels(), vec![0.92, 0.08], false).unwrap();
        assert_eq!(
            output,
            vec![
                ClassificationCandidate::new("cat", 0.92),
                ClassificationCandidate::new("dog", 0.08),
            ]
        );
    }

    #[test]
    fn test_label_scores_rejects_mismatched_output() {
        let err = label_scores(&labels(), vec![0.1, 0.2, 0.7], false).unwrap_err();
        assert_eq!(
            err,
            InferenceError::OutputShape {
                expected: 2,
                actual: 3
            }
        );
    }

    #[test]
    fn test_softmax_sums_to_one_and_keeps_order() {
        let output = label_scores(&labels(), vec![2.0, 1.0], true).unwrap();
        let total: f32 = output.iter().map(|c| c.confidence).sum();
        assert!((total - 1.0).abs() < 1e-5);
        assert!(output[0].confidence > output[1].confidence);
        assert!((output[0].confidence - 0.7310586).abs() < 1e-5);
    }

    #[test]
    fn test_new_rejects_missing_model_file() {
        let model_config = ModelConfig {
            onnx_file: "missing.onnx".to_string(),
            model_dir: PathBuf::from("./no-such-dir"),
            num_instances: 1,
            output_name: "output".to_string(),
            apply_softmax: false,
        };
        let labels_config = LabelsConfig {
            labels_file: "labels.txt".to_string(),
            labels_dir: PathBuf::from("./no-such-dir"),
        };

        let result = OrtModel::new(&model_config, &labels_config);
        assert!(matches!(result, Err(ModelLoadError::Config(_))));
    }
}
