use std::sync::Arc;
use log::{debug, info};

use super::builder::PredictorBuilder;
use super::calibration::{normalize_confidence, to_percent};
use super::doctor::DoctorDirectory;
use super::error::PredictorError;
use super::ranking::select_top_k;
use super::scorer::DiseaseScorer;
use super::vocabulary::Vocabulary;
use super::{PredictorInfo, PredictionRequest};

/// Ranks candidate diseases for a set of symptoms using a trained classifier.
///
/// # Thread Safety
///
/// Everything a predictor holds is read-only after [`PredictorBuilder::build`]:
/// the vocabulary, labels and doctor directory sit behind `Arc`, and the scorer
/// is `Send + Sync`. A predictor can therefore be wrapped in an `Arc` and
/// shared by any number of concurrent requests without locking. Each call to
/// [`Predictor::predict`] owns its own feature vector and results.
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use std::sync::Arc;
/// use ndarray::Array1;
/// use medpredict::{DiseaseScorer, Predictor, PredictionRequest, PredictorError};
///
/// struct Fixed;
/// impl DiseaseScorer for Fixed {
///     fn predict(&self, _: &Array1<f32>) -> Result<Array1<f32>, PredictorError> {
///         Ok(Array1::from(vec![0.7, 0.2, 0.1]))
///     }
/// }
///
/// let predictor = Predictor::builder()
///     .with_vocabulary(vec!["fever", "cough", "headache"])?
///     .with_labels(vec!["Influenza", "Common Cold", "Migraine"])?
///     .with_scorer(Arc::new(Fixed))
///     .build()?;
///
/// let result = predictor.predict(&PredictionRequest::new(["fever", "cough"]).with_top_k(2))?;
/// assert_eq!(result.most_likely().map(|e| e.disease.as_str()), Some("Influenza"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Predictor {
    pub(crate) vocabulary: Arc<Vocabulary>,
    pub(crate) labels: Arc<Vec<String>>,
    pub(crate) scorer: Arc<dyn DiseaseScorer>,
    pub(crate) doctors: Arc<DoctorDirectory>,
    pub(crate) min_symptoms: usize,
    pub(crate) default_top_k: usize,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<Predictor>();
    }
};

/// One ranked disease
#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry {
    pub rank: usize,
    pub disease: String,
    /// Raw classifier output for this disease
    pub score: f32,
    /// Calibrated confidence in [0, 1]
    pub confidence: f64,
    pub doctor: String,
}

impl RankedEntry {
    pub fn confidence_percent(&self) -> f64 {
        to_percent(self.confidence)
    }
}

/// Aggregate view over the confidences of a ranked result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceSummary {
    /// Mean confidence across the ranked entries, as a percentage
    pub average_percent: f64,
    pub max_percent: f64,
    pub min_percent: f64,
    /// Difference between the highest and lowest confidence, as a percentage
    pub spread_percent: f64,
}

/// The ranked diseases for one request, highest score first.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedResult {
    pub entries: Vec<RankedEntry>,
    /// Symptoms that matched the vocabulary and reached the classifier
    pub recognized: Vec<String>,
    /// Symptoms that were not part of the vocabulary
    pub ignored: Vec<String>,
}

impl RankedResult {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn most_likely(&self) -> Option<&RankedEntry> {
        self.entries.first()
    }

    /// Summarizes the confidences, or `None` for an empty result
    pub fn summary(&self) -> Option<ConfidenceSummary> {
        if self.entries.is_empty() {
            return None;
        }

        let percents: Vec<f64> = self.entries.iter().map(RankedEntry::confidence_percent).collect();
        let max_percent = percents.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let min_percent = percents.iter().cloned().fold(f64::INFINITY, f64::min);
        let average_percent = percents.iter().sum::<f64>() / percents.len() as f64;

        Some(ConfidenceSummary {
            average_percent,
            max_percent,
            min_percent,
            spread_percent: max_percent - min_percent,
        })
    }

    /// Writes the result as `Disease,Score` CSV with scores as one-decimal percentages
    ///
    /// # Errors
    /// * `ExportError` if the CSV writer fails
    pub fn to_csv(&self) -> Result<String, PredictorError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(["Diseases", "Score"])?;
        for entry in &self.entries {
            let score = format!("{:.1}%", (entry.score as f64 * 1000.0).round() / 10.0);
            writer.write_record([entry.disease.as_str(), score.as_str()])?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| PredictorError::ExportError(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| PredictorError::ExportError(e.to_string()))
    }
}

impl Predictor {
    /// Creates a new PredictorBuilder for fluent construction
    pub fn builder() -> PredictorBuilder {
        PredictorBuilder::new()
    }

    /// Returns information about the loaded vocabulary and labels
    pub fn info(&self) -> PredictorInfo {
        PredictorInfo {
            num_symptoms: self.vocabulary.len(),
            num_diseases: self.labels.len(),
            disease_labels: self.labels.as_ref().clone(),
            min_symptoms: self.min_symptoms,
            default_top_k: self.default_top_k,
        }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn doctors(&self) -> &DoctorDirectory {
        &self.doctors
    }

    /// Ranks the most likely diseases for the request's symptoms.
    ///
    /// The pipeline is: encode the symptoms, score them with the classifier,
    /// keep the top K, calibrate those scores and attach a doctor to each.
    ///
    /// # Errors
    /// - `InsufficientInput` if fewer than the configured minimum of symptoms
    ///   are recognized
    /// - `PredictionError` if the classifier returns a score vector whose length
    ///   differs from the number of disease labels
    /// - Any error raised by the scorer
    pub fn predict(&self, request: &PredictionRequest) -> Result<RankedResult, PredictorError> {
        let features = self.vocabulary.encode(&request.symptoms);
        if features.recognized_count() < self.min_symptoms {
            return Err(PredictorError::InsufficientInput {
                recognized: features.recognized_count(),
                required: self.min_symptoms,
            });
        }

        let scores = self.scorer.predict(features.values())?;
        if scores.len() != self.labels.len() {
            return Err(PredictorError::PredictionError(format!(
                "Classifier returned {} scores for {} disease labels",
                scores.len(),
                self.labels.len()
            )));
        }

        let k = request.top_k.unwrap_or(self.default_top_k);
        let scores = scores.to_vec();
        let top = select_top_k(&scores, k);
        let raw: Vec<f32> = top.iter().map(|&(_, score)| score).collect();
        let confidences = normalize_confidence(&raw);

        let entries: Vec<RankedEntry> = top
            .iter()
            .zip(confidences)
            .enumerate()
            .map(|(i, (&(label_idx, score), confidence))| {
                let disease = self.labels[label_idx].clone();
                let doctor = self.doctors.resolve(&disease).to_string();
                RankedEntry {
                    rank: i + 1,
                    disease,
                    score,
                    confidence,
                    doctor,
                }
            })
            .collect();

        debug!(
            "Ranked {} of {} diseases from {} recognized symptom(s)",
            entries.len(),
            self.labels.len(),
            features.recognized_count()
        );
        if let Some(top) = entries.first() {
            info!("Most likely: {} ({:.2}%)", top.disease, top.confidence_percent());
        }

        Ok(RankedResult {
            entries,
            recognized: features.recognized().to_vec(),
            ignored: features.ignored().to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;

    struct Echo;

    impl DiseaseScorer for Echo {
        fn predict(&self, features: &Array1<f32>) -> Result<Array1<f32>, PredictorError> {
            Ok(features.clone())
        }
    }

    fn setup_predictor() -> Predictor {
        Predictor::builder()
            .with_vocabulary(vec!["fever", "cough", "rash"])
            .unwrap()
            .with_labels(vec!["A", "B", "C"])
            .unwrap()
            .with_scorer(Arc::new(Echo))
            .build()
            .expect("Failed to create predictor")
    }

    #[test]
    fn test_info() {
        let info = setup_predictor().info();
        assert_eq!(info.num_symptoms, 3);
        assert_eq!(info.num_diseases, 3);
        assert_eq!(info.default_top_k, 3);
        assert_eq!(info.min_symptoms, 2);
    }

    #[test]
    fn test_echo_ranking() {
        let predictor = setup_predictor();
        let result = predictor
            .predict(&PredictionRequest::new(["rash", "fever"]).with_top_k(3))
            .unwrap();
        let diseases: Vec<&str> = result.entries.iter().map(|e| e.disease.as_str()).collect();
        assert_eq!(diseases, vec!["A", "C", "B"]);
        assert_eq!(result.entries[0].doctor, "Unable to suggest");
    }

    #[test]
    fn test_summary() {
        let result = RankedResult {
            entries: vec![
                RankedEntry { rank: 1, disease: "A".into(), score: 0.6, confidence: 0.6, doctor: "X".into() },
                RankedEntry { rank: 2, disease: "B".into(), score: 0.2, confidence: 0.2, doctor: "Y".into() },
            ],
            recognized: vec![],
            ignored: vec![],
        };
        let summary = result.summary().unwrap();
        assert!((summary.average_percent - 40.0).abs() < 1e-9);
        assert!((summary.spread_percent - 40.0).abs() < 1e-9);
        assert_eq!(summary.max_percent, 60.0);
        assert_eq!(summary.min_percent, 20.0);
    }

    #[test]
    fn test_to_csv() {
        let result = RankedResult {
            entries: vec![
                RankedEntry { rank: 1, disease: "Influenza".into(), score: 0.8125, confidence: 0.8125, doctor: "X".into() },
                RankedEntry { rank: 2, disease: "Common Cold".into(), score: 0.25, confidence: 0.25, doctor: "Y".into() },
            ],
            recognized: vec![],
            ignored: vec![],
        };
        let csv = result.to_csv().unwrap();
        assert_eq!(csv, "Diseases,Score\nInfluenza,81.3%\nCommon Cold,25.0%\n");
    }
}
