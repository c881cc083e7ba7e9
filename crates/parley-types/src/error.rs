use thiserror::Error;

use crate::llm::LlmError;

/// Errors from repository operations (used by trait definitions in parley-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,
}

/// Errors surfaced by the chat orchestrator.
#[derive(Debug, Error)]
pub enum ChatError {
    /// A required request field was missing or empty.
    #[error("{0}")]
    Validation(String),

    /// The referenced session does not exist.
    #[error("session not found")]
    SessionNotFound,

    /// No credential is configured for the external model.
    #[error("Gemini API key missing")]
    CredentialMissing,

    /// The external model call failed.
    #[error("Gemini failed: {0}")]
    ExternalService(String),

    #[error("storage error: {0}")]
    Storage(#[from] RepositoryError),
}

impl From<LlmError> for ChatError {
    fn from(e: LlmError) -> Self {
        ChatError::ExternalService(e.to_string())
    }
}
