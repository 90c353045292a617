use std::collections::HashMap;
use std::fs;
use std::path::Path;
use serde_json::Value;
use log::{info, warn};

use super::error::PredictorError;

/// Fallback used when the live doctor table has no usable entry for a disease
pub const RANKING_FALLBACK: &str = "Unable to suggest";

/// Fallback used by the hardcoded specialty mapping
pub const SPECIALTY_FALLBACK: &str = "General Physician";

/// Maps disease names to the specialist a patient should see.
///
/// Lookups are key-exact. A disease that is missing, or whose entry carries no
/// usable doctor name, resolves to the directory's fallback string instead of
/// failing.
#[derive(Debug, Clone)]
pub struct DoctorDirectory {
    entries: HashMap<String, String>,
    fallback: String,
}

impl Default for DoctorDirectory {
    fn default() -> Self {
        Self::new(RANKING_FALLBACK)
    }
}

impl DoctorDirectory {
    /// Creates an empty directory that resolves everything to `fallback`
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            entries: HashMap::new(),
            fallback: fallback.into(),
        }
    }

    /// Creates a directory from a fixed disease -> specialty mapping
    ///
    /// # Example
    /// ```
    /// use medpredict::{DoctorDirectory, SPECIALTY_FALLBACK};
    ///
    /// let directory = DoctorDirectory::from_specialties(
    ///     [("Migraine", "Neurologist")],
    ///     SPECIALTY_FALLBACK,
    /// );
    /// assert_eq!(directory.resolve("Migraine"), "Neurologist");
    /// assert_eq!(directory.resolve("UTI"), "General Physician");
    /// ```
    pub fn from_specialties<I, K, V>(pairs: I, fallback: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut directory = Self::new(fallback);
        for (disease, doctor) in pairs {
            directory.insert(disease, doctor);
        }
        directory
    }

    /// Parses a doctor table of the form `{"Disease": {"DoctorToVisit": "..."}}`.
    ///
    /// Each record may name the doctor under `DoctorToVisit` or `doctor`; the first
    /// non-empty string wins. Records without either are kept out of the table so
    /// they resolve to the fallback.
    ///
    /// # Errors
    /// * `BuildError` if the text is not a JSON object
    pub fn from_json_str(json: &str, fallback: impl Into<String>) -> Result<Self, PredictorError> {
        let table: HashMap<String, Value> = serde_json::from_str(json)
            .map_err(|e| PredictorError::BuildError(format!("Invalid doctor directory: {}", e)))?;

        let mut directory = Self::new(fallback);
        let mut skipped = 0usize;
        for (disease, record) in table {
            match Self::doctor_from_record(&record) {
                Some(doctor) => directory.insert(disease, doctor),
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            warn!("{} doctor directory entries have no doctor and will use the fallback", skipped);
        }
        Ok(directory)
    }

    /// Loads a doctor table from a JSON file
    pub fn from_json_file(
        path: impl AsRef<Path>,
        fallback: impl Into<String>,
    ) -> Result<Self, PredictorError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| {
            PredictorError::BuildError(format!("Failed to read doctor directory {:?}: {}", path, e))
        })?;
        let directory = Self::from_json_str(&json, fallback)?;
        info!("Loaded {} doctor directory entries from {:?}", directory.len(), path);
        Ok(directory)
    }

    fn doctor_from_record(record: &Value) -> Option<&str> {
        let fields = record.as_object()?;
        ["DoctorToVisit", "doctor"]
            .iter()
            .filter_map(|key| fields.get(*key).and_then(Value::as_str))
            .map(str::trim)
            .find(|doctor| !doctor.is_empty())
    }

    pub fn insert(&mut self, disease: impl Into<String>, doctor: impl Into<String>) {
        self.entries.insert(disease.into(), doctor.into());
    }

    /// Returns a copy of this directory with a different fallback
    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Resolves the recommended doctor for a disease, never failing
    pub fn resolve(&self, disease: &str) -> &str {
        self.entries
            .get(disease)
            .map(String::as_str)
            .unwrap_or(&self.fallback)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"{
        "Influenza": {"DoctorToVisit": "General Physician"},
        "Migraine": {"doctor": "Neurologist"},
        "Asthma": {"DoctorToVisit": "", "doctor": "Pulmonologist"},
        "Acne": {"DoctorToVisit": null},
        "Gout": "Rheumatologist",
        "Eczema": {}
    }"#;

    #[test]
    fn test_resolves_either_field() {
        let directory = DoctorDirectory::from_json_str(TABLE, RANKING_FALLBACK).unwrap();
        assert_eq!(directory.resolve("Influenza"), "General Physician");
        assert_eq!(directory.resolve("Migraine"), "Neurologist");
        assert_eq!(directory.resolve("Asthma"), "Pulmonologist");
    }

    #[test]
    fn test_malformed_entries_fall_back() {
        let directory = DoctorDirectory::from_json_str(TABLE, RANKING_FALLBACK).unwrap();
        assert_eq!(directory.resolve("Acne"), RANKING_FALLBACK);
        assert_eq!(directory.resolve("Gout"), RANKING_FALLBACK);
        assert_eq!(directory.resolve("Eczema"), RANKING_FALLBACK);
        assert_eq!(directory.len(), 3);
    }

    #[test]
    fn test_missing_disease_uses_configured_fallback() {
        let directory = DoctorDirectory::from_json_str(TABLE, "Ask your GP").unwrap();
        assert_eq!(directory.resolve("UTI"), "Ask your GP");
    }

    #[test]
    fn test_lookup_is_key_exact() {
        let directory = DoctorDirectory::from_json_str(TABLE, RANKING_FALLBACK).unwrap();
        assert_eq!(directory.resolve("influenza"), RANKING_FALLBACK);
    }

    #[test]
    fn test_rejects_non_object_file() {
        assert!(matches!(
            DoctorDirectory::from_json_str("[1, 2, 3]", RANKING_FALLBACK),
            Err(PredictorError::BuildError(_))
        ));
    }

    #[test]
    fn test_with_fallback() {
        let directory = DoctorDirectory::default().with_fallback(SPECIALTY_FALLBACK);
        assert_eq!(directory.resolve("UTI"), SPECIALTY_FALLBACK);
    }
}
