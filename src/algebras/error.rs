//! Error types for the capability traits.
//!
//! Each collaborator reports its own failure vocabulary. The pipeline stages
//! decide what a failure means for the journal request; these types only say
//! what went wrong and whether trying again could help.

use crate::error::NotionErrorCode;
use thiserror::Error;

/// The text completion service could not produce a completion.
///
/// Every variant is an "unavailable" outcome from the caller's point of view.
/// Implementations never retry; the stage that called them owns the budget.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompletionError {
    #[error("Timeout during: {operation}")]
    Timeout { operation: String },

    #[error("Rate limited{}", retry_hint(.retry_after_seconds))]
    RateLimited { retry_after_seconds: Option<u64> },

    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Completion API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed completion response: {reason}")]
    MalformedResponse { reason: String },
}

impl CompletionError {
    /// Returns `true` if this error is transient and worth retrying.
    ///
    /// Client errors such as a rejected key will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::RateLimited { .. } | Self::Transport { .. } => true,
            Self::Api { status, .. } => matches!(status, 408 | 409 | 429 | 500..=599),
            Self::MalformedResponse { .. } => true,
        }
    }
}

fn retry_hint(retry_after_seconds: &Option<u64>) -> String {
    match retry_after_seconds {
        Some(seconds) => format!(" (retry after {}s)", seconds),
        None => String::new(),
    }
}

/// The document store could not persist a record.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// No credentials or target database were configured.
    #[error("Document store is not configured: {reason}")]
    NotConfigured { reason: String },

    /// The page or database the record belongs to could not be found.
    #[error("Not found: {what}")]
    NotFound { what: String },

    #[error("Notion API returned an error ({code}): {message}")]
    Notion {
        code: NotionErrorCode,
        message: String,
    },

    #[error("Timeout during: {operation}")]
    Timeout { operation: String },

    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Malformed store response: {reason}")]
    MalformedResponse { reason: String },
}

impl StoreError {
    /// Returns `true` if this error is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::NotConfigured { .. } | Self::NotFound { .. } => false,
            Self::Notion { code, .. } => code.is_retryable(),
            Self::Timeout { .. } | Self::Transport { .. } => true,
            Self::MalformedResponse { .. } => false,
        }
    }
}
