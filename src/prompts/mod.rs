// src/prompts/mod.rs
//! Prompt texts sent to the completion service.
//!
//! The three prompts are Handlebars templates compiled once into a
//! [`PromptLibrary`] and rendered per request with `serde_json` data. Strict
//! mode turns a missing variable into a render error instead of an empty
//! string, and HTML escaping is disabled because the output is plain text.

mod json;

pub use json::extract_json;

use crate::error::AppError;
use crate::types::PromptType;
use handlebars::Handlebars;
use serde_json::json;

pub const CLASSIFY_TEMPLATE: &str = "classify";
pub const REFINE_TEMPLATE: &str = "refine";
pub const FORMAT_TEMPLATE: &str = "format";

const CLASSIFY_SOURCE: &str = r#"You are analyzing a journal response to determine which prompt category it best fits into.

The current prompt is: {{current_prompt}}

Determine if the response matches this prompt, or if it better matches one of these categories:
{{#each categories}}
- {{this.label}}: {{this.description}}
{{/each}}

Return only a JSON object with these fields:
- prompt: the category that best matches the response ({{labels}})
- confidence: a value between 0 and 1 indicating your confidence in this classification
- explanation: brief reason for your classification

Base your classification purely on the content, not on how the prompt was phrased.

Response:
"""
{{transcription}}
"""
"#;

const REFINE_SOURCE: &str = r#"A journal user was asked for their {{prompt}}: {{description}}.

Decide whether the response below meaningfully answers that prompt with at least one concrete detail.

Return only a JSON object with these fields:
- sufficient: true if the response meaningfully answers the prompt, false otherwise
- follow_up: when not sufficient, one short and friendly question that helps the user say more; otherwise an empty string

Response:
"""
{{transcription}}
"""
"#;

const FORMAT_SOURCE: &str = r#"Clean up this {{prompt}} journal response while preserving the original sentiment and content.

Guidelines:
- Remove filler words, repetition, and hesitations
- Fix grammar, punctuation and tense
- Keep the personal tone and all important details
- Do not add names, numbers, places or facts that are not in the response
- Keep it concise, focusing on the core message

Return only the cleaned text with no additional commentary.

Response:
"""
{{transcription}}
"""
"#;

/// The compiled prompt templates.
#[derive(Debug)]
pub struct PromptLibrary {
    registry: Handlebars<'static>,
}

impl PromptLibrary {
    pub fn new() -> Result<Self, AppError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_escape_fn(handlebars::no_escape);

        for (name, source) in [
            (CLASSIFY_TEMPLATE, CLASSIFY_SOURCE),
            (REFINE_TEMPLATE, REFINE_SOURCE),
            (FORMAT_TEMPLATE, FORMAT_SOURCE),
        ] {
            registry
                .register_template_string(name, source)
                .map_err(|e| AppError::TemplateRenderError {
                    name: name.to_string(),
                    message: e.to_string(),
                })?;
        }

        Ok(Self { registry })
    }

    /// Asks which category the transcription answers.
    pub fn classification(
        &self,
        transcription: &str,
        current_prompt: PromptType,
    ) -> Result<String, AppError> {
        let categories: Vec<_> = PromptType::ALL
            .iter()
            .map(|p| json!({ "label": p.label(), "description": p.description() }))
            .collect();
        let labels = PromptType::ALL.map(PromptType::label).join(", ");

        self.render(
            CLASSIFY_TEMPLATE,
            &json!({
                "current_prompt": current_prompt.label(),
                "categories": categories,
                "labels": labels,
                "transcription": transcription,
            }),
        )
    }

    /// Asks whether the transcription is a sufficient answer.
    pub fn refinement(&self, transcription: &str, prompt: PromptType) -> Result<String, AppError> {
        self.render(
            REFINE_TEMPLATE,
            &json!({
                "prompt": prompt.label(),
                "description": prompt.description(),
                "transcription": transcription,
            }),
        )
    }

    /// Asks for a cleaned-up version of the transcription.
    pub fn formatting(&self, transcription: &str, prompt: PromptType) -> Result<String, AppError> {
        self.render(
            FORMAT_TEMPLATE,
            &json!({
                "prompt": prompt.label(),
                "transcription": transcription,
            }),
        )
    }

    fn render(&self, name: &str, data: &serde_json::Value) -> Result<String, AppError> {
        self.registry
            .render(name, data)
            .map_err(|e| AppError::TemplateRenderError {
                name: name.to_string(),
                message: e.to_string(),
            })
    }
}
