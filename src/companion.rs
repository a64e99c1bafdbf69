// src/companion.rs
//! Small entry points that sit beside the pipeline: the completed-prompts
//! echo and the liveness probe.

use crate::types::{PromptType, ValidationError};
use serde::{Deserialize, Serialize};

pub const SERVICE_NAME: &str = env!("CARGO_PKG_NAME");
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the caller's completed prompts unchanged.
///
/// The service keeps no session state, so the client is the source of truth.
pub fn completed_prompts(completed: Vec<PromptType>) -> Vec<PromptType> {
    completed
}

/// Parses wire labels and echoes them back.
pub fn completed_prompts_from_labels<S: AsRef<str>>(
    labels: &[S],
) -> Result<Vec<PromptType>, ValidationError> {
    let parsed = labels
        .iter()
        .map(|label| label.as_ref().parse::<PromptType>())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(completed_prompts(parsed))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Liveness probe. Touches no collaborator.
pub fn health() -> HealthStatus {
    HealthStatus {
        status: "ok".to_string(),
        service: SERVICE_NAME.to_string(),
        version: SERVICE_VERSION.to_string(),
    }
}
