//! Symptom-to-disease ranking on top of a pre-trained multi-label classifier.
//!
//! A request's symptoms are encoded into a multi-hot vector, scored by the
//! classifier, and the top K diseases are returned with calibrated confidences
//! and a recommended specialist. Rule-based triage and an overlap explainer run
//! alongside the model.
//!
//! # Basic Usage
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use medpredict::{ArtifactStore, Predictor, PredictionRequest, detect_urgency, default_rules};
//!
//! let store = ArtifactStore::new_default()?;
//! let predictor = Predictor::builder()
//!     .with_artifact(&store, "symptom-ann")?
//!     .build()?;
//!
//! let symptoms = ["fever", "cough", "chest pain"];
//! let result = predictor.predict(&PredictionRequest::new(symptoms).with_top_k(3))?;
//! for entry in &result.entries {
//!     println!("#{} {} ({:.2}%) -> {}", entry.rank, entry.disease, entry.confidence_percent(), entry.doctor);
//! }
//!
//! for alert in detect_urgency(symptoms, default_rules()) {
//!     println!("{}", alert);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! A built [`Predictor`] is immutable and can be shared across threads using `Arc`.

pub mod predictor;
pub mod runtime;
pub mod artifact_store;
pub mod triage;
pub mod explain;

pub use predictor::{
    Predictor, PredictorBuilder, PredictorError, PredictorInfo, PredictionRequest,
    RankedEntry, RankedResult, ConfidenceSummary,
    Vocabulary, FeatureVector, DiseaseScorer, OnnxScorer, DoctorDirectory,
    select_top_k, normalize_confidence, to_percent,
    RANKING_FALLBACK, SPECIALTY_FALLBACK,
};
pub use runtime::{RuntimeConfig, create_session_builder};
pub use artifact_store::{ArtifactStore, ArtifactError, ArtifactInfo};
pub use triage::{TriageRule, detect_urgency, default_rules, load_rules, load_rules_with_defaults};
pub use explain::{ExplainerModel, Explanation, DEMO_SYMPTOMS, parse_symptom_list};

pub fn init_logger() {
    env_logger::init();
}
