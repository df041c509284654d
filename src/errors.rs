/// Domain-specific error types for bioseeker
///
/// Only local-collection failures and input validation ever reach the caller;
/// AI collaborator failures degrade to empty results inside the pipeline.

#[derive(Debug, thiserror::Error)]
pub enum BioseekerError {
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Collection error: {0}")]
    Collection(String),
}

impl From<crate::collection::CollectionError> for BioseekerError {
    fn from(e: crate::collection::CollectionError) -> Self {
        BioseekerError::Collection(e.to_string())
    }
}

impl BioseekerError {
    /// Helper to create validation errors with field names
    ///
    /// Example:
    /// ```
    /// use bioseeker::errors::BioseekerError;
    /// let err = BioseekerError::validation("query", "Please enter a search query");
    /// ```
    pub fn validation(field: &str, message: &str) -> Self {
        BioseekerError::Validation {
            message: message.to_string(),
            field: Some(field.to_string()),
        }
    }
}
