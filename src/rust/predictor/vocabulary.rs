use std::collections::{BTreeSet, HashMap};
use ndarray::Array1;
use log::debug;

use super::error::PredictorError;

/// Ordered set of symptom names, each bound to a fixed slot in the feature vector.
///
/// The slot order is the column order the classifier was trained on. Once a
/// vocabulary is built it never changes, so vectors encoded against it stay valid
/// for as long as the model that shares it is loaded.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    names: Vec<String>,
    slots: HashMap<String, usize>,
}

/// A multi-hot encoding of one request's symptoms.
///
/// Besides the vector itself this records which inputs were matched against the
/// vocabulary and which were dropped, so callers can show what the model saw.
#[derive(Debug, Clone)]
pub struct FeatureVector {
    values: Array1<f32>,
    recognized: Vec<String>,
    ignored: Vec<String>,
}

impl FeatureVector {
    /// The multi-hot values, one per vocabulary slot
    pub fn values(&self) -> &Array1<f32> {
        &self.values
    }

    /// Symptoms that were found in the vocabulary, in slot order
    pub fn recognized(&self) -> &[String] {
        &self.recognized
    }

    /// Symptoms that were not found in the vocabulary, in input order
    pub fn ignored(&self) -> &[String] {
        &self.ignored
    }

    pub fn recognized_count(&self) -> usize {
        self.recognized.len()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Vocabulary {
    /// Creates a vocabulary from an ordered list of unique symptom names
    ///
    /// # Errors
    /// * `ValidationError` if a name is empty or appears more than once
    ///
    /// # Example
    /// ```
    /// use medpredict::Vocabulary;
    ///
    /// let vocabulary = Vocabulary::new(vec!["fever", "cough", "fatigue"]).unwrap();
    /// assert_eq!(vocabulary.slot("cough"), Some(1));
    /// ```
    pub fn new(names: Vec<impl Into<String>>) -> Result<Self, PredictorError> {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let mut slots = HashMap::with_capacity(names.len());

        for (slot, name) in names.iter().enumerate() {
            if name.is_empty() {
                return Err(PredictorError::ValidationError(
                    format!("Symptom name at slot {} cannot be empty", slot)
                ));
            }
            if slots.insert(name.clone(), slot).is_some() {
                return Err(PredictorError::ValidationError(
                    format!("Duplicate symptom '{}' in vocabulary", name)
                ));
            }
        }

        Ok(Self { names, slots })
    }

    /// Creates a vocabulary from a training-table header, skipping the label column.
    ///
    /// Symptom tables are stored with the disease column alongside the symptom
    /// columns; only the latter are model inputs.
    pub fn from_columns(
        columns: Vec<impl Into<String>>,
        label_column: &str,
    ) -> Result<Self, PredictorError> {
        let names: Vec<String> = columns
            .into_iter()
            .map(Into::into)
            .filter(|name: &String| name != label_column)
            .collect();
        Self::new(names)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn slot(&self, name: &str) -> Option<usize> {
        self.slots.get(name).copied()
    }

    pub fn name(&self, slot: usize) -> Option<&str> {
        self.names.get(slot).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Encodes a selection of symptoms into a multi-hot feature vector.
    ///
    /// Duplicates collapse to a single flag. Names that are not part of the
    /// vocabulary contribute nothing and are listed in [`FeatureVector::ignored`].
    ///
    /// # Example
    /// ```
    /// use medpredict::Vocabulary;
    ///
    /// let vocabulary = Vocabulary::new(vec!["fever", "cough", "fatigue"]).unwrap();
    /// let features = vocabulary.encode(["fever", "cough"]);
    /// assert_eq!(features.values().to_vec(), vec![1.0, 1.0, 0.0]);
    /// ```
    pub fn encode<I>(&self, symptoms: I) -> FeatureVector
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut values = Array1::<f32>::zeros(self.names.len());
        let mut hit_slots = BTreeSet::new();
        let mut ignored: Vec<String> = Vec::new();

        for symptom in symptoms {
            let symptom = symptom.as_ref();
            match self.slot(symptom) {
                Some(slot) => {
                    values[slot] = 1.0;
                    hit_slots.insert(slot);
                }
                None => {
                    if !ignored.iter().any(|s| s == symptom) {
                        ignored.push(symptom.to_string());
                    }
                }
            }
        }

        if !ignored.is_empty() {
            debug!("Ignoring {} unknown symptom(s): {:?}", ignored.len(), ignored);
        }

        let recognized = hit_slots
            .into_iter()
            .map(|slot| self.names[slot].clone())
            .collect();

        FeatureVector { values, recognized, ignored }
    }

    /// Returns the symptoms a multi-hot vector represents, in slot order
    pub fn decode<'a>(&'a self, values: &Array1<f32>) -> Vec<&'a str> {
        values
            .iter()
            .zip(self.names.iter())
            .filter(|(&value, _)| value != 0.0)
            .map(|(_, name)| name.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vocabulary {
        Vocabulary::new(vec!["fever", "cough", "fatigue"]).unwrap()
    }

    #[test]
    fn test_encode_known_symptoms() {
        let features = sample().encode(["fever", "cough"]);
        assert_eq!(features.values().to_vec(), vec![1.0, 1.0, 0.0]);
        assert_eq!(features.recognized_count(), 2);
        assert!(features.ignored().is_empty());
    }

    #[test]
    fn test_unknown_symptom_is_dropped() {
        let features = sample().encode(["sneezing", "fatigue"]);
        let ones: Vec<usize> = features.values()
            .iter()
            .enumerate()
            .filter(|(_, &v)| v == 1.0)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(ones, vec![2]);
        assert_eq!(features.ignored(), &["sneezing".to_string()]);
    }

    #[test]
    fn test_duplicates_collapse() {
        let features = sample().encode(["cough", "cough", "cough"]);
        assert_eq!(features.values().sum(), 1.0);
        assert_eq!(features.recognized(), &["cough".to_string()]);
    }

    #[test]
    fn test_empty_selection() {
        let features = sample().encode(Vec::<String>::new());
        assert_eq!(features.len(), 3);
        assert_eq!(features.values().sum(), 0.0);
    }

    #[test]
    fn test_decode_recovers_known_inputs() {
        let vocabulary = sample();
        let features = vocabulary.encode(["fatigue", "unknown", "fever"]);
        let mut decoded = vocabulary.decode(features.values());
        decoded.sort_unstable();
        assert_eq!(decoded, vec!["fatigue", "fever"]);
    }

    #[test]
    fn test_rejects_duplicates_and_empty_names() {
        assert!(matches!(
            Vocabulary::new(vec!["fever", "fever"]),
            Err(PredictorError::ValidationError(_))
        ));
        assert!(matches!(
            Vocabulary::new(vec!["fever", ""]),
            Err(PredictorError::ValidationError(_))
        ));
    }

    #[test]
    fn test_from_columns_drops_label_column() {
        let vocabulary = Vocabulary::from_columns(
            vec!["fever", "diseases", "cough"],
            "diseases",
        ).unwrap();
        assert_eq!(vocabulary.len(), 2);
        assert_eq!(vocabulary.slot("cough"), Some(1));
        assert!(!vocabulary.contains("diseases"));
    }
}
