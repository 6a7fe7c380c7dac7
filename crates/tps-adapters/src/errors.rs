use thiserror::Error;
use tps_core::ProposalFailure;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("engine exited with code {exit_code:?}: {stderr}")]
    Crashed { exit_code: Option<i32>, stderr: String },
    #[error("engine timed out after {seconds}s")]
    Timeout { seconds: u64 },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid engine output: {0}")]
    InvalidOutput(String),
}

impl From<EngineError> for ProposalFailure {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Crashed { exit_code, .. } => ProposalFailure::EngineCrashed { exit_code },
            EngineError::Timeout { seconds } => ProposalFailure::Timeout { seconds },
            EngineError::Spawn { .. } | EngineError::Io(_) => ProposalFailure::Io(e.to_string()),
            EngineError::InvalidOutput(m) => ProposalFailure::InvalidOutput(m),
        }
    }
}
