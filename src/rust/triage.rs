//! Red-flag symptom combinations that warrant urgent care.
//!
//! These rules run independently of the classifier: a rule fires whenever every
//! symptom it requires is present, whatever the model predicts.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use log::{info, warn};

use crate::PredictorError;

/// A required co-occurrence of symptoms paired with the warning it raises
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageRule {
    pub required: Vec<String>,
    pub message: String,
}

impl TriageRule {
    pub fn new<I>(required: I, message: impl Into<String>) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            required: required.into_iter().map(Into::into).collect(),
            message: message.into(),
        }
    }

    /// Whether every required symptom appears in the lowercased symptom set
    fn matches(&self, present: &HashSet<String>) -> bool {
        self.required
            .iter()
            .all(|symptom| present.contains(&symptom.to_lowercase()))
    }
}

lazy_static! {
    static ref DEFAULT_RULES: Vec<TriageRule> = vec![
        TriageRule::new(
            ["chest pain", "shortness of breath"],
            "🚨 Possible cardiac/respiratory emergency.",
        ),
        TriageRule::new(
            ["severe headache", "neck stiffness"],
            "🚨 Possible meningitis pattern.",
        ),
        TriageRule::new(
            ["burning urination", "fever"],
            "⚠️ Possible complicated UTI.",
        ),
    ];
}

/// The built-in red-flag rules
pub fn default_rules() -> &'static [TriageRule] {
    &DEFAULT_RULES
}

/// Returns the warning of every rule whose symptoms are all present, in rule order.
///
/// Matching is case-insensitive and exact per symptom; there is no partial
/// credit and no short-circuit.
///
/// # Example
/// ```
/// use medpredict::{detect_urgency, default_rules};
///
/// let alerts = detect_urgency(["Chest Pain", "shortness of breath"], default_rules());
/// assert_eq!(alerts, vec!["🚨 Possible cardiac/respiratory emergency.".to_string()]);
/// ```
pub fn detect_urgency<I>(symptoms: I, rules: &[TriageRule]) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let present: HashSet<String> = symptoms
        .into_iter()
        .map(|s| s.as_ref().to_lowercase())
        .collect();

    let alerts: Vec<String> = rules
        .iter()
        .filter(|rule| rule.matches(&present))
        .map(|rule| rule.message.clone())
        .collect();

    if !alerts.is_empty() {
        warn!("{} triage rule(s) fired", alerts.len());
    }
    alerts
}

/// Loads a rule set from a JSON array of `{"required": [...], "message": "..."}`
///
/// # Errors
/// * `BuildError` if the file cannot be read or parsed
/// * `ValidationError` if a rule has no required symptoms or an empty message
pub fn load_rules(path: impl AsRef<Path>) -> Result<Vec<TriageRule>, PredictorError> {
    let path = path.as_ref();
    let json = fs::read_to_string(path)
        .map_err(|e| PredictorError::BuildError(format!("Failed to read triage rules {:?}: {}", path, e)))?;
    let rules: Vec<TriageRule> = serde_json::from_str(&json)
        .map_err(|e| PredictorError::BuildError(format!("Invalid triage rules {:?}: {}", path, e)))?;

    for (i, rule) in rules.iter().enumerate() {
        if rule.required.is_empty() {
            return Err(PredictorError::ValidationError(
                format!("Triage rule {} requires no symptoms", i + 1)
            ));
        }
        if rule.message.is_empty() {
            return Err(PredictorError::ValidationError(
                format!("Triage rule {} has an empty message", i + 1)
            ));
        }
    }

    info!("Loaded {} triage rules from {:?}", rules.len(), path);
    Ok(rules)
}

/// The built-in rules followed by the rules loaded from `path`
pub fn load_rules_with_defaults(path: impl AsRef<Path>) -> Result<Vec<TriageRule>, PredictorError> {
    let mut rules = default_rules().to_vec();
    rules.extend(load_rules(path)?);
    Ok(rules)
}
