//! A small overlap-based model used to illustrate how predictions are explained.
//!
//! Each condition is described by a set of typical symptoms. A condition's
//! confidence grows with the number of input symptoms it shares, and the shared
//! symptoms are reported as the reason it was suggested.

use std::collections::{BTreeSet, HashSet};
use log::debug;

use crate::predictor::{DoctorDirectory, SPECIALTY_FALLBACK};

/// Symptoms offered for selection by the demo model
pub const DEMO_SYMPTOMS: [&str; 15] = [
    "fever", "cough", "sore throat", "runny nose", "body ache", "fatigue",
    "headache", "nausea", "vomiting", "burning urination", "shortness of breath",
    "chest pain", "dizziness", "diarrhea", "abdominal pain",
];

/// Number of candidates kept by [`ExplainerModel::score`]
pub const MAX_EXPLANATIONS: usize = 3;

const BASE_CONFIDENCE: f64 = 0.15;
const CONFIDENCE_PER_SYMPTOM: f64 = 0.18;
const MAX_CONFIDENCE: f64 = 0.95;

/// One suggested condition and the symptoms that drove it
#[derive(Debug, Clone, PartialEq)]
pub struct Explanation {
    pub disease: String,
    /// Confidence in [0.15, 0.95], rounded to two decimals
    pub confidence: f64,
    /// Input symptoms shared with the condition's profile, sorted
    pub overlap: Vec<String>,
    pub doctor: String,
}

#[derive(Debug, Clone)]
struct Candidate {
    disease: String,
    features: HashSet<String>,
}

/// Overlap scorer over a fixed set of condition profiles.
///
/// Candidates keep the order they were added in; that order breaks confidence ties.
#[derive(Debug, Clone)]
pub struct ExplainerModel {
    candidates: Vec<Candidate>,
    specialties: DoctorDirectory,
}

impl Default for ExplainerModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ExplainerModel {
    /// Creates a model with no candidates whose specialties fall back to "General Physician"
    pub fn new() -> Self {
        Self {
            candidates: Vec::new(),
            specialties: DoctorDirectory::new(SPECIALTY_FALLBACK),
        }
    }

    /// The six demonstration conditions and their specialties
    pub fn demo() -> Self {
        Self::new()
            .with_candidate("Influenza", ["fever", "cough", "sore throat", "body ache", "fatigue", "runny nose"])
            .with_candidate("Allergic Rhinitis", ["runny nose", "sore throat", "cough"])
            .with_candidate("UTI", ["burning urination", "fever", "abdominal pain"])
            .with_candidate("Migraine", ["headache", "nausea", "vomiting", "dizziness"])
            .with_candidate("GERD", ["abdominal pain", "nausea", "vomiting"])
            .with_candidate("Pneumonia", ["fever", "cough", "shortness of breath", "chest pain"])
            .with_specialties(DoctorDirectory::from_specialties(
                [
                    ("Influenza", "General Physician"),
                    ("Allergic Rhinitis", "Allergist"),
                    ("UTI", "Urologist"),
                    ("Migraine", "Neurologist"),
                    ("GERD", "Gastroenterologist"),
                    ("Pneumonia", "Pulmonologist"),
                ],
                SPECIALTY_FALLBACK,
            ))
    }

    /// Adds a condition profile. Re-adding a condition replaces its features in place.
    pub fn with_candidate<I>(mut self, disease: impl Into<String>, features: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let disease = disease.into();
        let features: HashSet<String> = features.into_iter().map(Into::into).collect();
        match self.candidates.iter_mut().find(|c| c.disease == disease) {
            Some(existing) => existing.features = features,
            None => self.candidates.push(Candidate { disease, features }),
        }
        self
    }

    pub fn with_specialties(mut self, specialties: DoctorDirectory) -> Self {
        self.specialties = specialties;
        self
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Scores every condition sharing at least one symptom with the input and
    /// returns the three most confident.
    ///
    /// # Example
    /// ```
    /// use medpredict::ExplainerModel;
    ///
    /// let explanations = ExplainerModel::demo().score(["fever", "cough"]);
    /// let influenza = explanations.iter().find(|e| e.disease == "Influenza").unwrap();
    /// assert_eq!(influenza.confidence, 0.51);
    /// assert_eq!(influenza.overlap, vec!["cough", "fever"]);
    /// ```
    pub fn score<I>(&self, symptoms: I) -> Vec<Explanation>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let symptoms: HashSet<String> = symptoms
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect();

        let mut scored: Vec<Explanation> = self
            .candidates
            .iter()
            .filter_map(|candidate| {
                let overlap: BTreeSet<&String> = candidate.features.intersection(&symptoms).collect();
                if overlap.is_empty() {
                    return None;
                }
                Some(Explanation {
                    disease: candidate.disease.clone(),
                    confidence: overlap_confidence(overlap.len()),
                    overlap: overlap.into_iter().cloned().collect(),
                    doctor: self.specialties.resolve(&candidate.disease).to_string(),
                })
            })
            .collect();

        // Stable sort keeps insertion order among equal confidences.
        scored.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        scored.truncate(MAX_EXPLANATIONS);

        debug!("Explained {} condition(s) from {} symptom(s)", scored.len(), symptoms.len());
        scored
    }
}

/// `min(0.15 + 0.18 * overlap, 0.95)` rounded to two decimals
pub fn overlap_confidence(overlap: usize) -> f64 {
    let raw = (BASE_CONFIDENCE + CONFIDENCE_PER_SYMPTOM * overlap as f64).min(MAX_CONFIDENCE);
    (raw * 100.0).round() / 100.0
}

/// Splits comma-separated free text into trimmed, non-empty symptom names
pub fn parse_symptom_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_confidence() {
        assert_eq!(overlap_confidence(1), 0.33);
        assert_eq!(overlap_confidence(2), 0.51);
        assert_eq!(overlap_confidence(3), 0.69);
        assert_eq!(overlap_confidence(4), 0.87);
        assert_eq!(overlap_confidence(5), 0.95);
        assert_eq!(overlap_confidence(6), 0.95);
    }

    #[test]
    fn test_zero_overlap_is_excluded() {
        let explanations = ExplainerModel::demo().score(["diarrhea"]);
        assert!(explanations.is_empty());
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        // fever + cough: Influenza, Pneumonia at 2; Allergic Rhinitis, UTI at 1
        let explanations = ExplainerModel::demo().score(["fever", "cough"]);
        let diseases: Vec<&str> = explanations.iter().map(|e| e.disease.as_str()).collect();
        assert_eq!(diseases, vec!["Influenza", "Pneumonia", "Allergic Rhinitis"]);
    }

    #[test]
    fn test_doctor_and_overlap() {
        let explanations = ExplainerModel::demo().score(["headache", "nausea", "vomiting"]);
        assert_eq!(explanations[0].disease, "Migraine");
        assert_eq!(explanations[0].confidence, 0.69);
        assert_eq!(explanations[0].doctor, "Neurologist");
        assert_eq!(explanations[0].overlap, vec!["headache", "nausea", "vomiting"]);
        assert_eq!(explanations[1].disease, "GERD");
    }

    #[test]
    fn test_unmapped_condition_uses_general_physician() {
        let model = ExplainerModel::new().with_candidate("Sinusitis", ["headache", "runny nose"]);
        let explanations = model.score(["runny nose"]);
        assert_eq!(explanations[0].doctor, "General Physician");
    }

    #[test]
    fn test_parse_symptom_list() {
        assert_eq!(
            parse_symptom_list(" sore throat, body ache,, ,fever "),
            vec!["sore throat", "body ache", "fever"]
        );
        assert!(parse_symptom_list("").is_empty());
    }
}
