use thiserror::Error;

/// The classifier answered with a different number of labels than accounts sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected {expected} labels, got {actual}")]
pub struct MismatchError {
    pub expected: usize,
    pub actual: usize,
}

/// Ways a single batch can fail. All of them are contained by the batch executor.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Classifier returned error status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed classifier response: {0}")]
    MalformedResponse(String),

    #[error("Label count mismatch: {0}")]
    Mismatch(#[from] MismatchError),
}

impl ClassifyError {
    /// Stable name used as a metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            ClassifyError::Transport(_) => "transport",
            ClassifyError::Status { .. } => "status",
            ClassifyError::MalformedResponse(_) => "malformed_response",
            ClassifyError::Mismatch(_) => "mismatch",
        }
    }
}
