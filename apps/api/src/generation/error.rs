use thiserror::Error;

/// Structural failures that abort a whole generation.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("no active template configuration for test {test_id}")]
    ConfigurationMissing { test_id: i64 },

    #[error("no source record for test {test_id}, student {student_id}, attempt {attempt_id}")]
    SourceDataMissing {
        test_id: i64,
        student_id: i64,
        attempt_id: i64,
    },

    #[error("base document unreadable: {0}")]
    BaseDocumentUnreadable(String),

    #[error("document serialization failed: {0}")]
    SerializationFailure(String),

    #[error("no previous generation for attempt {attempt_id}")]
    NoPreviousGeneration { attempt_id: i64 },

    #[error("storage error: {0}")]
    Storage(#[source] anyhow::Error),

    #[error("repository error: {0}")]
    Repository(#[source] anyhow::Error),

    #[error("generation timed out")]
    Timeout,
}

impl GenerationError {
    /// Precondition failures happen before anything is rendered and are not
    /// written to the generation log.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            GenerationError::ConfigurationMissing { .. }
                | GenerationError::SourceDataMissing { .. }
                | GenerationError::NoPreviousGeneration { .. }
        )
    }
}
