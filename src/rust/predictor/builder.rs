use std::fs;
use std::path::Path;
use std::sync::Arc;
use log::{info, warn, error};

use super::doctor::{DoctorDirectory, RANKING_FALLBACK};
use super::error::PredictorError;
use super::predictor::Predictor;
use super::scorer::{DiseaseScorer, OnnxScorer};
use super::vocabulary::Vocabulary;
use crate::{ArtifactStore, runtime::RuntimeConfig};

/// Name of the disease column stored alongside the symptom columns
pub const LABEL_COLUMN: &str = "diseases";

/// A builder for constructing a Predictor with a fluent interface.
#[derive(Default)]
pub struct PredictorBuilder {
    vocabulary: Option<Vocabulary>,
    labels: Option<Vec<String>>,
    scorer: Option<Arc<dyn DiseaseScorer>>,
    doctors: Option<DoctorDirectory>,
    min_symptoms: Option<usize>,
    default_top_k: Option<usize>,
    runtime_config: RuntimeConfig,
}

impl PredictorBuilder {
    /// Default minimum number of recognized symptoms for a prediction
    pub const DEFAULT_MIN_SYMPTOMS: usize = 2;
    /// Default number of diseases to rank
    pub const DEFAULT_TOP_K: usize = 3;

    /// Creates a new empty PredictorBuilder instance with default configuration
    ///
    /// # Example
    /// ```
    /// use medpredict::PredictorBuilder;
    ///
    /// let builder = PredictorBuilder::new();
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the runtime configuration used when an ONNX model is loaded
    ///
    /// Must be called before [`with_onnx_model`](Self::with_onnx_model) or
    /// [`with_artifact`](Self::with_artifact) to take effect.
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Sets the symptom vocabulary, in the column order the model was trained on
    ///
    /// # Errors
    /// * `ValidationError` if a name is empty or repeated
    pub fn with_vocabulary(mut self, symptoms: Vec<impl Into<String>>) -> Result<Self, PredictorError> {
        let vocabulary = Vocabulary::new(symptoms)?;
        if vocabulary.is_empty() {
            return Err(PredictorError::ValidationError("Vocabulary cannot be empty".into()));
        }
        self.vocabulary = Some(vocabulary);
        Ok(self)
    }

    /// Loads the vocabulary from a JSON array of column names.
    ///
    /// The `diseases` label column, if present, is skipped.
    pub fn with_vocabulary_file(mut self, path: impl AsRef<Path>) -> Result<Self, PredictorError> {
        let columns = read_string_list(path.as_ref())?;
        let vocabulary = Vocabulary::from_columns(columns, LABEL_COLUMN)?;
        if vocabulary.is_empty() {
            return Err(PredictorError::ValidationError("Vocabulary cannot be empty".into()));
        }
        info!("Loaded vocabulary of {} symptoms", vocabulary.len());
        self.vocabulary = Some(vocabulary);
        Ok(self)
    }

    /// Sets the disease labels, in the order of the classifier's outputs
    ///
    /// # Errors
    /// * `ValidationError` if there are no labels or a label is empty
    pub fn with_labels(mut self, labels: Vec<impl Into<String>>) -> Result<Self, PredictorError> {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        Self::validate_labels(&labels)?;
        self.labels = Some(labels);
        Ok(self)
    }

    /// Loads the disease labels from a JSON array
    pub fn with_labels_file(self, path: impl AsRef<Path>) -> Result<Self, PredictorError> {
        let labels = read_string_list(path.as_ref())?;
        info!("Loaded {} disease labels", labels.len());
        self.with_labels(labels)
    }

    /// Sets the doctor lookup table
    pub fn with_doctor_directory(mut self, directory: DoctorDirectory) -> Self {
        self.doctors = Some(directory);
        self
    }

    /// Loads the doctor lookup table from JSON, resolving misses to "Unable to suggest"
    pub fn with_doctor_directory_file(mut self, path: impl AsRef<Path>) -> Result<Self, PredictorError> {
        self.doctors = Some(DoctorDirectory::from_json_file(path, RANKING_FALLBACK)?);
        Ok(self)
    }

    /// Uses a custom scorer in place of an ONNX model
    pub fn with_scorer(mut self, scorer: Arc<dyn DiseaseScorer>) -> Self {
        self.scorer = Some(scorer);
        self
    }

    /// Loads an ONNX classifier from the given path
    ///
    /// # Errors
    /// * `BuildError` if a scorer is already set or the file is missing
    /// * `ModelError` if the model cannot be loaded or has an invalid structure
    pub fn with_onnx_model(mut self, model_path: impl AsRef<Path>) -> Result<Self, PredictorError> {
        if self.scorer.is_some() {
            return Err(PredictorError::BuildError("Classifier already set".to_string()));
        }
        let scorer = OnnxScorer::from_file(model_path, &self.runtime_config)?;
        self.scorer = Some(Arc::new(scorer));
        Ok(self)
    }

    /// Loads model, vocabulary, labels and doctor table from an artifact directory.
    ///
    /// A missing doctor table is not fatal: every disease then resolves to the
    /// fallback.
    pub fn with_artifact(self, store: &ArtifactStore, name: &str) -> Result<Self, PredictorError> {
        if !store.is_artifact_present(name) {
            error!("Artifact '{}' is incomplete in {:?}", name, store.artifact_dir(name));
            return Err(PredictorError::BuildError(format!(
                "Artifact '{}' is not available. Download it first using ArtifactStore::ensure_artifact()",
                name
            )));
        }

        let mut builder = self
            .with_vocabulary_file(store.symptoms_path(name))?
            .with_labels_file(store.diseases_path(name))?
            .with_onnx_model(store.model_path(name))?;

        let doctors_path = store.doctors_path(name);
        if doctors_path.exists() {
            builder = builder.with_doctor_directory_file(doctors_path)?;
        } else {
            warn!("No doctor directory at {:?}; recommendations will use the fallback", doctors_path);
        }
        Ok(builder)
    }

    /// Sets the minimum number of recognized symptoms a request must contain
    pub fn with_min_symptoms(mut self, min_symptoms: usize) -> Self {
        self.min_symptoms = Some(min_symptoms);
        self
    }

    /// Sets how many diseases are ranked when a request does not say
    pub fn with_default_top_k(mut self, top_k: usize) -> Self {
        self.default_top_k = Some(top_k);
        self
    }

    fn validate_labels(labels: &[String]) -> Result<(), PredictorError> {
        if labels.is_empty() {
            return Err(PredictorError::ValidationError("At least one disease label is required".into()));
        }
        if let Some(pos) = labels.iter().position(|l| l.is_empty()) {
            return Err(PredictorError::ValidationError(
                format!("Disease label {} cannot be empty", pos + 1)
            ));
        }
        Ok(())
    }

    /// Builds and returns the final Predictor instance
    ///
    /// # Errors
    /// * `BuildError` if the vocabulary, labels or classifier are missing, or the
    ///   classifier's input or output width disagrees with them
    pub fn build(self) -> Result<Predictor, PredictorError> {
        let vocabulary = self.vocabulary
            .ok_or_else(|| PredictorError::BuildError("Symptom vocabulary must be set".into()))?;
        let labels = self.labels
            .ok_or_else(|| PredictorError::BuildError("Disease labels must be set".into()))?;
        let scorer = self.scorer
            .ok_or_else(|| PredictorError::BuildError("No classifier loaded".into()))?;

        if let Some(width) = scorer.input_len() {
            if width != vocabulary.len() {
                error!("Classifier expects {} features, vocabulary has {}", width, vocabulary.len());
                return Err(PredictorError::BuildError(format!(
                    "Classifier expects {} features but the vocabulary has {} symptoms",
                    width, vocabulary.len()
                )));
            }
        }
        if let Some(width) = scorer.output_len() {
            if width != labels.len() {
                error!("Classifier returns {} scores, {} disease labels loaded", width, labels.len());
                return Err(PredictorError::BuildError(format!(
                    "Classifier returns {} scores but there are {} disease labels",
                    width, labels.len()
                )));
            }
        }

        let predictor = Predictor {
            vocabulary: Arc::new(vocabulary),
            labels: Arc::new(labels),
            scorer,
            doctors: Arc::new(self.doctors.unwrap_or_default()),
            min_symptoms: self.min_symptoms.unwrap_or(Self::DEFAULT_MIN_SYMPTOMS),
            default_top_k: self.default_top_k.unwrap_or(Self::DEFAULT_TOP_K),
        };
        info!(
            "Predictor ready: {} symptoms, {} diseases",
            predictor.vocabulary.len(),
            predictor.labels.len()
        );
        Ok(predictor)
    }
}

fn read_string_list(path: &Path) -> Result<Vec<String>, PredictorError> {
    let json = fs::read_to_string(path)
        .map_err(|e| PredictorError::BuildError(format!("Failed to read {:?}: {}", path, e)))?;
    serde_json::from_str(&json)
        .map_err(|e| PredictorError::BuildError(format!("Invalid list in {:?}: {}", path, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;

    struct Zeros;

    impl DiseaseScorer for Zeros {
        fn predict(&self, features: &Array1<f32>) -> Result<Array1<f32>, PredictorError> {
            Ok(Array1::zeros(features.len()))
        }
    }

    #[test]
    fn test_missing_parts() {
        assert!(matches!(
            PredictorBuilder::new().build(),
            Err(PredictorError::BuildError(_))
        ));

        let result = PredictorBuilder::new()
            .with_vocabulary(vec!["fever"]).unwrap()
            .with_labels(vec!["Influenza"]).unwrap()
            .build();
        assert!(matches!(result, Err(PredictorError::BuildError(_))));
    }

    #[test]
    fn test_label_validation() {
        assert!(PredictorBuilder::new().with_labels(Vec::<String>::new()).is_err());
        assert!(PredictorBuilder::new().with_labels(vec!["Influenza", ""]).is_err());
        assert!(PredictorBuilder::new().with_vocabulary(Vec::<String>::new()).is_err());
    }

    #[test]
    fn test_defaults() {
        let predictor = PredictorBuilder::new()
            .with_vocabulary(vec!["fever"]).unwrap()
            .with_labels(vec!["Influenza"]).unwrap()
            .with_scorer(Arc::new(Zeros))
            .build()
            .unwrap();
        assert_eq!(predictor.min_symptoms, PredictorBuilder::DEFAULT_MIN_SYMPTOMS);
        assert_eq!(predictor.default_top_k, PredictorBuilder::DEFAULT_TOP_K);
        assert_eq!(predictor.doctors.fallback(), RANKING_FALLBACK);
    }

    /// Declares fixed input and output widths
    struct Shaped(usize, usize);

    impl DiseaseScorer for Shaped {
        fn predict(&self, _features: &Array1<f32>) -> Result<Array1<f32>, PredictorError> {
            Ok(Array1::zeros(self.1))
        }

        fn input_len(&self) -> Option<usize> {
            Some(self.0)
        }

        fn output_len(&self) -> Option<usize> {
            Some(self.1)
        }
    }

    fn build_with(scorer: Shaped) -> Result<Predictor, PredictorError> {
        PredictorBuilder::new()
            .with_vocabulary(vec!["fever", "cough", "fatigue"]).unwrap()
            .with_labels(vec!["A", "B", "C", "D", "E"]).unwrap()
            .with_scorer(Arc::new(scorer))
            .build()
    }

    #[test]
    fn test_classifier_shape_checked() {
        assert!(build_with(Shaped(3, 5)).is_ok());
        assert!(matches!(build_with(Shaped(3, 2)), Err(PredictorError::BuildError(_))));
        assert!(matches!(build_with(Shaped(4, 5)), Err(PredictorError::BuildError(_))));
    }

    #[test]
    fn test_scorer_already_set() {
        let result = PredictorBuilder::new()
            .with_scorer(Arc::new(Zeros))
            .with_onnx_model("/tmp/medpredict-test/model.onnx");
        assert!(matches!(result, Err(PredictorError::BuildError(_))));
    }
}
