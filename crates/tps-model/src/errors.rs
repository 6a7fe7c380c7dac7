use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ModelError {
    #[error("descriptor length mismatch: expected {expected}, got {got}")]
    DescriptorMismatch { expected: usize, got: usize },
    #[error("shot result must have {expected} entries, got {got}")]
    ShotResultMismatch { expected: usize, got: usize },
    #[error("invalid value: {0}")]
    InvalidValue(String),
    #[error("model state error: {0}")]
    State(String),
}

impl From<serde_json::Error> for ModelError {
    fn from(e: serde_json::Error) -> Self {
        ModelError::State(e.to_string())
    }
}
