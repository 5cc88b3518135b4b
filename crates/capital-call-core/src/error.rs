use thiserror::Error;

#[derive(Debug, Error)]
pub enum CapitalCallError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl CapitalCallError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        CapitalCallError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for CapitalCallError {
    fn from(e: serde_json::Error) -> Self {
        CapitalCallError::SerializationError(e.to_string())
    }
}
