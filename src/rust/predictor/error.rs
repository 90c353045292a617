use ort::Error as OrtError;
use std::fmt;

/// Represents the different types of errors that can occur while building or running a predictor.
#[derive(Debug)]
pub enum PredictorError {
    /// Error occurred while loading or running the ONNX model
    ModelError(String),
    /// Error occurred during the build phase
    BuildError(String),
    /// Error occurred while making predictions
    PredictionError(String),
    /// Error occurred due to invalid input parameters
    ValidationError(String),
    /// Too few recognized symptoms were supplied to rank diseases
    InsufficientInput {
        recognized: usize,
        required: usize,
    },
    /// Error occurred while exporting results
    ExportError(String),
}

impl fmt::Display for PredictorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModelError(msg) => write!(f, "Model error: {}", msg),
            Self::BuildError(msg) => write!(f, "Build error: {}", msg),
            Self::PredictionError(msg) => write!(f, "Prediction error: {}", msg),
            Self::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            Self::InsufficientInput { recognized, required } => write!(
                f,
                "Insufficient input: {} recognized symptom(s), at least {} required",
                recognized, required
            ),
            Self::ExportError(msg) => write!(f, "Export error: {}", msg),
        }
    }
}

impl std::error::Error for PredictorError {}

impl From<OrtError> for PredictorError {
    fn from(err: OrtError) -> Self {
        PredictorError::ModelError(err.to_string())
    }
}

impl From<csv::Error> for PredictorError {
    fn from(err: csv::Error) -> Self {
        PredictorError::ExportError(err.to_string())
    }
}
