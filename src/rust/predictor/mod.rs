mod error;
mod vocabulary;
mod scorer;
mod ranking;
mod calibration;
mod doctor;
mod predictor;
pub mod builder;

pub use error::PredictorError;
pub use vocabulary::{Vocabulary, FeatureVector};
pub use scorer::{DiseaseScorer, OnnxScorer};
pub use ranking::select_top_k;
pub use calibration::{normalize_confidence, to_percent};
pub use doctor::{DoctorDirectory, RANKING_FALLBACK, SPECIALTY_FALLBACK};
pub use predictor::{Predictor, RankedEntry, RankedResult, ConfidenceSummary};
pub use builder::PredictorBuilder;

/// Information about a loaded predictor
#[derive(Debug, Clone)]
pub struct PredictorInfo {
    /// Number of symptoms in the vocabulary
    pub num_symptoms: usize,
    /// Number of diseases the classifier scores
    pub num_diseases: usize,
    /// Disease labels in classifier output order
    pub disease_labels: Vec<String>,
    /// Minimum number of recognized symptoms per request
    pub min_symptoms: usize,
    /// Number of diseases ranked when a request does not specify K
    pub default_top_k: usize,
}

/// The inputs of a single prediction.
///
/// A request is owned by the caller and never shared; the predictor reads it and
/// returns a fresh result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictionRequest {
    /// Selected symptom names
    pub symptoms: Vec<String>,
    /// Number of diseases to rank; the predictor default is used when unset
    pub top_k: Option<usize>,
}

impl PredictionRequest {
    pub fn new<I>(symptoms: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            symptoms: symptoms.into_iter().map(Into::into).collect(),
            top_k: None,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }
}
