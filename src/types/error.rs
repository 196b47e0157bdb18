//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//!
//! ## Error Taxonomy
//!
//! - **CredentialMissing**: no credential configured, pipeline must not start
//! - **TokenStatus / TokenMissing**: OAuth exchange failed, fatal for the unit
//! - **Api / InvalidResponse**: provider call failed, fatal for the attempt
//! - **Parse**: model output could not be turned into structured data, the
//!   only retryable kind (fresh sampling may succeed)
//! - **Upload / FileOperation**: remote file store failures, fatal for the unit
//!
//! ## Design Principles
//!
//! - Single unified error type (QuizError) for the entire application
//! - Retryability is a property of the error, queried by the retry controller
//! - Unit-level failures are recorded and the batch continues; only
//!   CredentialMissing propagates to the top

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuizError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Precondition Errors
    // -------------------------------------------------------------------------
    /// No course-level or site-wide credential configured. The pipeline must
    /// not start and no network call may be attempted.
    #[error("no API credential configured for this course or site")]
    CredentialMissing,

    #[error("config error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Token Errors
    // -------------------------------------------------------------------------
    #[error("token endpoint returned HTTP {status}")]
    TokenStatus { status: u16 },

    #[error("token endpoint response carries no access_token")]
    TokenMissing,

    // -------------------------------------------------------------------------
    // Provider Errors
    // -------------------------------------------------------------------------
    #[error("{provider} API error (HTTP {status}): {body}")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },

    /// The provider answered 200 but the body lacks the expected path
    /// (e.g. `choices[0].message.content`).
    #[error("invalid {provider} response: {message}")]
    InvalidResponse {
        provider: &'static str,
        message: String,
    },

    /// Transport-level failure, including timeout expiry. Treated exactly
    /// like a non-200 response: fatal for the attempt, never retried.
    #[error("network error during {operation}: {message}")]
    Network { operation: String, message: String },

    // -------------------------------------------------------------------------
    // File Store Errors
    // -------------------------------------------------------------------------
    #[error("file upload failed (HTTP {status})")]
    Upload { status: u16 },

    #[error("file {op} failed (HTTP {status})")]
    FileOperation { op: &'static str, status: u16 },

    // -------------------------------------------------------------------------
    // Parse Errors
    // -------------------------------------------------------------------------
    /// Model output did not contain a valid payload of the expected shape.
    /// The only retryable error: re-sampling the model may succeed.
    #[error("parse failure: {0}")]
    Parse(String),
}

impl QuizError {
    /// Check if this error should drive another generation attempt.
    /// Only parse failures qualify; API, token, and network errors are
    /// fatal for the content unit.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Parse(_))
    }

    /// Wrap a transport error (connect failure, timeout expiry, TLS error)
    /// with the operation it interrupted.
    pub fn network(operation: impl Into<String>, err: &reqwest::Error) -> Self {
        Self::Network {
            operation: operation.into(),
            message: err.to_string(),
        }
    }

    /// Create a parse failure
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }
}

pub type Result<T> = std::result::Result<T, QuizError>;

// =============================================================================
// Tests
// =============================================================================
