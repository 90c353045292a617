use std::collections::HashMap;
use std::path::Path;
use ndarray::{Array1, Axis};
use ort::session::Session;
use ort::value::{Tensor, ValueType};
use log::{info, error};

use super::error::PredictorError;
use crate::runtime::{RuntimeConfig, create_session_builder};

/// A trained disease classifier seen as an opaque scoring function.
///
/// Implementations receive a multi-hot vector with one entry per vocabulary slot
/// and return one score per disease label, in the label order fixed when the
/// artifact was loaded. Scores may be probabilities or unbounded logits; the
/// predictor calibrates either.
///
/// Implementors must be `Send + Sync` so a loaded scorer can be shared across
/// request handlers without locking.
pub trait DiseaseScorer: Send + Sync {
    /// Scores a single feature vector
    fn predict(&self, features: &Array1<f32>) -> Result<Array1<f32>, PredictorError>;

    /// Length of the feature vector the scorer expects, when it is known up front
    fn input_len(&self) -> Option<usize> {
        None
    }

    /// Number of scores the scorer returns, when it is known up front
    fn output_len(&self) -> Option<usize> {
        None
    }
}

impl std::fmt::Debug for dyn DiseaseScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DiseaseScorer")
    }
}

/// A disease classifier exported to ONNX and executed with ONNX Runtime.
///
/// The model is expected to:
/// - Accept one float input of shape [batch_size, vocabulary_size]
/// - Produce its per-disease scores in the first output, shape [batch_size, num_labels]
#[derive(Debug)]
pub struct OnnxScorer {
    model_path: String,
    input_name: String,
    input_len: Option<usize>,
    output_len: Option<usize>,
    session: Session,
}

impl OnnxScorer {
    /// Loads an ONNX classifier from disk and validates its structure
    ///
    /// # Errors
    /// - `BuildError` if the file does not exist
    /// - `ModelError` if the runtime cannot load it or it has no inputs/outputs
    pub fn from_file(
        model_path: impl AsRef<Path>,
        config: &RuntimeConfig,
    ) -> Result<Self, PredictorError> {
        let model_path = model_path.as_ref();
        if !model_path.exists() {
            return Err(PredictorError::BuildError(
                format!("Model file not found: {}", model_path.display())
            ));
        }

        let session = create_session_builder(config)?
            .commit_from_file(model_path)
            .map_err(|e| {
                error!("Failed to load classifier model: {}", e);
                PredictorError::ModelError(format!("Failed to load model: {}", e))
            })?;

        let input_name = Self::validate_model(&session)?;
        let input_len = feature_width(&session.inputs[0].input_type);
        let output_len = feature_width(&session.outputs[0].output_type);
        info!(
            "Classifier model loaded from {:?} (input '{}', {:?} features -> {:?} scores)",
            model_path, input_name, input_len, output_len
        );

        Ok(Self {
            model_path: model_path.to_string_lossy().to_string(),
            input_name,
            input_len,
            output_len,
            session,
        })
    }

    pub fn model_path(&self) -> &str {
        &self.model_path
    }

    /// Checks that the model has a feature input and a score output, returning the input name
    fn validate_model(session: &Session) -> Result<String, PredictorError> {
        let input = session.inputs.first().ok_or_else(|| {
            PredictorError::ModelError("Model must have 1 input for the symptom vector".to_string())
        })?;

        if session.outputs.is_empty() {
            return Err(PredictorError::ModelError(
                "Model must have at least 1 output for disease scores".to_string()
            ));
        }

        Ok(input.name.clone())
    }
}

/// Width of the last axis of a tensor type, or `None` when it is dynamic or not a tensor
fn feature_width(value_type: &ValueType) -> Option<usize> {
    match value_type.tensor_dimensions()?.last() {
        Some(&dim) if dim > 0 => Some(dim as usize),
        _ => None,
    }
}

impl DiseaseScorer for OnnxScorer {
    fn predict(&self, features: &Array1<f32>) -> Result<Array1<f32>, PredictorError> {
        let input_array = features.clone().insert_axis(Axis(0));
        let input_dyn = input_array.into_dyn();
        let input = input_dyn.as_standard_layout();

        let mut input_tensors = HashMap::new();
        input_tensors.insert(
            self.input_name.as_str(),
            Tensor::from_array(&input)
                .map_err(|e| PredictorError::ModelError(format!("Failed to create input tensor: {}", e)))?,
        );

        let outputs = self.session.run(input_tensors)
            .map_err(|e| PredictorError::ModelError(format!("Failed to run model: {}", e)))?;
        let output_tensor = outputs[0].try_extract_tensor::<f32>()
            .map_err(|e| PredictorError::ModelError(format!("Failed to extract output tensor: {}", e)))?;

        Ok(output_tensor.iter().cloned().collect())
    }

    fn input_len(&self) -> Option<usize> {
        self.input_len
    }

    fn output_len(&self) -> Option<usize> {
        self.output_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_file() {
        let result = OnnxScorer::from_file(
            "/tmp/medpredict-test/does-not-exist/model.onnx",
            &RuntimeConfig::default(),
        );
        assert!(matches!(result, Err(PredictorError::BuildError(_))));
    }

    fn tensor_type(dimensions: Vec<i64>) -> ValueType {
        ValueType::Tensor {
            ty: ort::tensor::TensorElementType::Float32,
            dimension_symbols: vec![None; dimensions.len()],
            dimensions,
        }
    }

    #[test]
    fn test_feature_width() {
        assert_eq!(feature_width(&tensor_type(vec![-1, 132])), Some(132));
        assert_eq!(feature_width(&tensor_type(vec![1, 41])), Some(41));
        assert_eq!(feature_width(&tensor_type(vec![-1, -1])), None);
        assert_eq!(feature_width(&tensor_type(vec![])), None);
    }
}
