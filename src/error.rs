// src/error.rs
//! Application error types.
//!
//! Only two failures are fatal to a journal request: input that cannot be
//! validated, and a classifier that stays unreachable after its retries.
//! Everything else the pipeline absorbs and reports through the result flags.

use crate::algebras::CompletionError;
use std::fmt;
use thiserror::Error;

/// Notion API error codes as a typed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotionErrorCode {
    RateLimited,
    ObjectNotFound,
    Unauthorized,
    RestrictedResource,
    InvalidJson,
    ValidationFailed,
    Conflict,
    InternalError,
    ServiceUnavailable,
    /// Fallback when the error body could not be parsed.
    HttpStatus(u16),
    Unknown(String),
}

impl NotionErrorCode {
    pub fn from_api_response(code: &str) -> Self {
        match code {
            "rate_limited" => Self::RateLimited,
            "object_not_found" => Self::ObjectNotFound,
            "unauthorized" => Self::Unauthorized,
            "restricted_resource" => Self::RestrictedResource,
            "invalid_json" => Self::InvalidJson,
            "validation_error" => Self::ValidationFailed,
            "conflict_error" => Self::Conflict,
            "internal_server_error" => Self::InternalError,
            "service_unavailable" => Self::ServiceUnavailable,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn from_http_status(status: u16) -> Self {
        Self::HttpStatus(status)
    }

    /// Transient failures worth another write attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::ServiceUnavailable | Self::InternalError | Self::Conflict
        ) || matches!(self, Self::HttpStatus(408 | 429 | 500..=599))
    }

    /// Access problems the operator has to fix by sharing the database with
    /// the integration or replacing the key.
    pub fn is_permission_problem(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized | Self::RestrictedResource | Self::HttpStatus(401 | 403)
        )
    }
}

impl fmt::Display for NotionErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited => write!(f, "rate_limited"),
            Self::ObjectNotFound => write!(f, "object_not_found"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::RestrictedResource => write!(f, "restricted_resource"),
            Self::InvalidJson => write!(f, "invalid_json"),
            Self::ValidationFailed => write!(f, "validation_error"),
            Self::Conflict => write!(f, "conflict_error"),
            Self::InternalError => write!(f, "internal_server_error"),
            Self::ServiceUnavailable => write!(f, "service_unavailable"),
            Self::HttpStatus(code) => write!(f, "http_{}", code),
            Self::Unknown(code) => write!(f, "{}", code),
        }
    }
}

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// The request was empty or malformed. No external call was made.
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] crate::types::ValidationError),

    /// The completion service stayed unavailable for every classification attempt.
    #[error("Classification unavailable after {attempts} attempt(s): {source}")]
    ClassificationUnavailable {
        attempts: u32,
        #[source]
        source: CompletionError,
    },

    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(crate::types::ValidationError),

    #[error("Network failure: {0}")]
    NetworkFailure(#[from] reqwest::Error),

    #[error("Malformed request body: {0}")]
    MalformedRequest(String),

    #[error("Prompt template '{name}' failed to render: {message}")]
    TemplateRenderError { name: String, message: String },

    #[error("Filesystem IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Whether the error should be reported to the caller as their fault.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, AppError::InvalidInput(_) | AppError::MalformedRequest(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::MalformedRequest(err.to_string())
    }
}

/// Result type alias for convenience
pub type Result<T, E = AppError> = std::result::Result<T, E>;
