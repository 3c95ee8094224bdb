//! Error types for the voice banking assistant

use thiserror::Error;

/// Result type alias for assistant operations
pub type Result<T> = std::result::Result<T, AssistantError>;

#[derive(Error, Debug)]
pub enum AssistantError {

    // =============================
    // Core Pipeline Errors
    // =============================

    #[error("Transcription error: {0}")]
    TranscriptionError(String),

    #[error("Generation error: {0}")]
    GenerationError(String),

    #[error("Classification error: {0}")]
    ClassificationError(String),

    #[error("Stage transition limit exceeded: {0}")]
    StageLimitExceeded(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("UUID parse error: {0}")]
    UuidError(#[from] uuid::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Terminal turn-level errors carried in conversation state and surfaced
/// in the reply's `error` field. These never abort the pipeline run; the
/// dialog stage still produces a user-facing message for each of them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TurnError {
    #[error("No input detected")]
    NoInputProvided,

    #[error("Audio transcription failed: {0}")]
    TranscriptionFailed(String),

    #[error("User not authenticated")]
    UserNotAuthenticated,

    #[error("Invalid transfer amount")]
    InvalidTransferAmount,
}
