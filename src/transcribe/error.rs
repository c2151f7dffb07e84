use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranscriptError {
    #[error("Malformed transcript: {0}")]
    Malformed(String),

    #[error("Invalid time value: {0} (must be a finite, non-negative number of seconds)")]
    InvalidTime(f64),
}

impl TranscriptError {
    pub fn malformed(message: impl Into<String>) -> Self {
        TranscriptError::Malformed(message.into())
    }
}
