// src/pipeline/classifier.rs
//! Decides which prompt category a transcription answers.

use super::{Degradation, StageOutput};
use crate::algebras::TextCompletion;
use crate::error::AppError;
use crate::error_recovery::{retry_with_backoff_if, RetryPolicy};
use crate::model::ClassificationResult;
use crate::prompts::{extract_json, PromptLibrary};
use crate::types::{Confidence, PromptType, Transcription};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// The reply shape requested from the model.
#[derive(Debug, Deserialize)]
struct ClassificationReply {
    prompt: String,
    #[serde(default)]
    confidence: Option<Value>,
    #[serde(default)]
    explanation: Option<String>,
}

pub struct Classifier {
    completion: Arc<dyn TextCompletion>,
    prompts: Arc<PromptLibrary>,
    retry: RetryPolicy,
}

impl Classifier {
    pub fn new(
        completion: Arc<dyn TextCompletion>,
        prompts: Arc<PromptLibrary>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            completion,
            prompts,
            retry,
        }
    }

    /// Classifies `transcription`, falling back to `current_prompt` when the
    /// model's reply cannot be read.
    ///
    /// Blank input is rejected before any call is made. When every attempt
    /// to reach the completion service fails the result is
    /// [`AppError::ClassificationUnavailable`].
    pub async fn classify(
        &self,
        transcription: &str,
        current_prompt: PromptType,
    ) -> Result<StageOutput<ClassificationResult>, AppError> {
        let transcription = Transcription::new(transcription)?;
        let prompt = self
            .prompts
            .classification(transcription.as_str(), current_prompt)?;

        let reply = retry_with_backoff_if(
            || self.completion.complete(&prompt),
            &self.retry,
            |_| true,
        )
        .await
        .map_err(|source| AppError::ClassificationUnavailable {
            attempts: self.retry.max_attempts,
            source,
        })?;

        match parse_classification(&reply) {
            Ok(result) => {
                log::debug!(
                    "Classified as {} ({} confidence){}",
                    result.detected_prompt,
                    result.confidence,
                    result
                        .explanation
                        .as_deref()
                        .map(|e| format!(": {}", e))
                        .unwrap_or_default()
                );
                Ok(StageOutput::clean(result))
            }
            Err(reason) => {
                log::warn!(
                    "Could not read classification reply, keeping {}: {}",
                    current_prompt,
                    reason
                );
                Ok(StageOutput::degraded(
                    ClassificationResult::fallback(current_prompt),
                    Degradation::ClassificationFallback { reason },
                ))
            }
        }
    }
}

/// Reads a classification out of a model reply.
///
/// Accepts a JSON object (fenced, embedded in prose, or bare) with a
/// `prompt` field, or a reply that is nothing but a category label.
pub fn parse_classification(reply: &str) -> Result<ClassificationResult, String> {
    let candidate = extract_json(reply);

    match serde_json::from_str::<ClassificationReply>(candidate) {
        Ok(parsed) => {
            let detected = PromptType::from_model_label(&parsed.prompt)
                .ok_or_else(|| format!("unknown prompt label '{}'", parsed.prompt))?;
            let confidence = parsed
                .confidence
                .as_ref()
                .map(confidence_from_value)
                .unwrap_or(Confidence::Low);

            let result = ClassificationResult::new(detected, confidence);
            Ok(match parsed.explanation {
                Some(explanation) => result.with_explanation(explanation),
                None => result,
            })
        }
        Err(json_err) => PromptType::from_model_label(reply)
            .map(|detected| ClassificationResult::new(detected, Confidence::Medium))
            .ok_or_else(|| format!("reply is neither JSON nor a label: {}", json_err)),
    }
}

fn confidence_from_value(value: &Value) -> Confidence {
    match value {
        Value::Number(n) => n
            .as_f64()
            .map(Confidence::from_score)
            .unwrap_or(Confidence::Low),
        Value::String(s) => s.parse().unwrap_or(Confidence::Low),
        _ => Confidence::Low,
    }
}
