// src/model/request.rs

use crate::types::{PromptType, Transcription, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The request as it arrives on the wire, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawProcessingRequest {
    pub transcription: String,
    pub current_prompt: String,
    #[serde(default)]
    pub completed_prompts: Vec<String>,
}

/// A validated journal request.
///
/// `current_prompt` need not appear in `completed_prompts`; the caller may be
/// revisiting a prompt on purpose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingRequest {
    pub transcription: Transcription,
    pub current_prompt: PromptType,
    pub completed_prompts: BTreeSet<PromptType>,
}

impl ProcessingRequest {
    pub fn new(
        transcription: impl Into<String>,
        current_prompt: PromptType,
        completed_prompts: impl IntoIterator<Item = PromptType>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            transcription: Transcription::new(transcription)?,
            current_prompt,
            completed_prompts: completed_prompts.into_iter().collect(),
        })
    }
}

impl TryFrom<RawProcessingRequest> for ProcessingRequest {
    type Error = ValidationError;

    fn try_from(raw: RawProcessingRequest) -> Result<Self, Self::Error> {
        let transcription = Transcription::new(raw.transcription)?;
        let current_prompt = raw.current_prompt.parse::<PromptType>()?;

        let mut completed_prompts = BTreeSet::new();
        for label in &raw.completed_prompts {
            let prompt = label.parse::<PromptType>()?;
            if !completed_prompts.insert(prompt) {
                return Err(ValidationError::DuplicatePrompt(prompt.to_string()));
            }
        }

        Ok(Self {
            transcription,
            current_prompt,
            completed_prompts,
        })
    }
}
