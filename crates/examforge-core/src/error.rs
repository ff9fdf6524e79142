//! Error taxonomy.
//!
//! `ProviderError` describes transport-level failures when talking to a
//! generative provider. It is defined here so the client can classify
//! provider failures without string matching. `ExamError` is what every
//! authoring, grading, and merge operation surfaces to its caller.

use thiserror::Error;

/// Errors that can occur when interacting with a generative provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The requested model was not found.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),
}

impl ProviderError {
    /// Returns `true` if this error is permanent for the current configuration.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            ProviderError::AuthenticationFailed(_) | ProviderError::ModelNotFound(_)
        )
    }
}

/// Errors surfaced by generation, regeneration, grading, and exam mutation.
#[derive(Debug, Error)]
pub enum ExamError {
    /// Required configuration (usually the provider credential) is missing.
    /// No request is attempted.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// User input was rejected before any request was made.
    #[error("invalid input: {0}")]
    InputValidation(String),

    /// The provider could not be reached or rejected the request.
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(#[from] ProviderError),

    /// The provider answered without a payload.
    #[error("provider returned an empty response")]
    EmptyResponse,

    /// The payload could not be decoded into the canonical model.
    #[error("schema violation: {0}")]
    SchemaViolation(String),

    /// A single-item merge was refused.
    #[error("cannot merge question {index}: {reason}")]
    MergeConflict { index: usize, reason: String },

    /// A full-exam generation is already running for this exam.
    #[error("an exam generation is already in progress")]
    GenerationInProgress,

    /// The operation needs an exam but none has been generated.
    #[error("no exam has been generated yet")]
    NoExam,

    /// The requested question does not exist.
    #[error("question index {index} is out of range (exam has {len} questions)")]
    IndexOutOfRange { index: usize, len: usize },
}

impl ExamError {
    pub(crate) fn schema(message: impl Into<String>) -> Self {
        ExamError::SchemaViolation(message.into())
    }

    pub(crate) fn input(message: impl Into<String>) -> Self {
        ExamError::InputValidation(message.into())
    }

    /// Returns `true` if the error originated at or after the provider call.
    pub fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            ExamError::ProviderUnavailable(_)
                | ExamError::EmptyResponse
                | ExamError::SchemaViolation(_)
        )
    }
}
