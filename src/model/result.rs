// src/model/result.rs

use crate::types::{Confidence, PromptType};
use serde::{Deserialize, Serialize};

/// The classifier's verdict on a transcription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub detected_prompt: PromptType,
    pub confidence: Confidence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl ClassificationResult {
    pub fn new(detected_prompt: PromptType, confidence: Confidence) -> Self {
        Self {
            detected_prompt,
            confidence,
            explanation: None,
        }
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        let explanation = explanation.into();
        if !explanation.trim().is_empty() {
            self.explanation = Some(explanation);
        }
        self
    }

    /// The low-confidence stand-in used when the model reply can't be read.
    pub fn fallback(current_prompt: PromptType) -> Self {
        Self::new(current_prompt, Confidence::Low)
    }
}

/// Whether a response is complete enough to save.
///
/// Fields are private so a decision to refine always carries a non-empty
/// suggestion and a decision to accept never does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefinementDecision {
    suggestion: Option<String>,
}

impl RefinementDecision {
    pub fn accept() -> Self {
        Self { suggestion: None }
    }

    /// Asks for more detail. An empty suggestion is replaced with the
    /// prompt's canned nudge.
    pub fn refine(prompt: PromptType, suggestion: impl Into<String>) -> Self {
        let suggestion = suggestion.into();
        let suggestion = if suggestion.trim().is_empty() {
            prompt.refinement_nudge().to_string()
        } else {
            suggestion.trim().to_string()
        };
        Self {
            suggestion: Some(suggestion),
        }
    }

    pub fn needs_refinement(&self) -> bool {
        self.suggestion.is_some()
    }

    pub fn suggestion(&self) -> Option<&str> {
        self.suggestion.as_deref()
    }
}

/// What one invocation of the pipeline returns to the caller.
///
/// Field order is the wire order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub detected_prompt: PromptType,
    pub prompt_changed: bool,
    pub formatted_response: Option<String>,
    pub needs_refinement: bool,
    pub refinement_suggestion: Option<String>,
    pub saved_to_notion: bool,
}

impl ProcessingResult {
    /// The response was too thin; nothing was formatted or saved.
    pub fn refinement(detected_prompt: PromptType, prompt_changed: bool, suggestion: impl Into<String>) -> Self {
        Self {
            detected_prompt,
            prompt_changed,
            formatted_response: None,
            needs_refinement: true,
            refinement_suggestion: Some(suggestion.into()),
            saved_to_notion: false,
        }
    }

    pub fn accepted(
        detected_prompt: PromptType,
        prompt_changed: bool,
        formatted_response: impl Into<String>,
        saved_to_notion: bool,
    ) -> Self {
        Self {
            detected_prompt,
            prompt_changed,
            formatted_response: Some(formatted_response.into()),
            needs_refinement: false,
            refinement_suggestion: None,
            saved_to_notion,
        }
    }

    /// Classification could not be obtained at all. The caller's prompt is
    /// echoed back and nothing is formatted or saved.
    pub fn classification_unavailable(current_prompt: PromptType) -> Self {
        Self {
            detected_prompt: current_prompt,
            prompt_changed: false,
            formatted_response: None,
            needs_refinement: false,
            refinement_suggestion: None,
            saved_to_notion: false,
        }
    }
}
