use thiserror::Error;

mod domain_types;
mod ids;
mod prompt;

pub use domain_types::*;
pub use ids::*;
pub use prompt::*;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Empty required field: {0}")]
    EmptyField(&'static str),

    #[error("Unknown prompt type: '{0}' (expected gratitude, desire or brag)")]
    UnknownPromptType(String),

    #[error("Prompt type listed more than once in completed_prompts: {0}")]
    DuplicatePrompt(String),

    #[error("Unknown confidence level: {0}")]
    UnknownConfidence(String),

    #[error("Invalid Notion ID format: {0}")]
    InvalidId(String),

    #[error("Invalid URL: {url} - {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid API key format: {reason}")]
    InvalidApiKey { reason: String },

    #[error("Invalid model name: {name} - {reason}")]
    InvalidModelName { name: String, reason: String },

    #[error("Invalid value for {name}: {value} - {reason}")]
    InvalidSetting {
        name: &'static str,
        value: String,
        reason: String,
    },
}
