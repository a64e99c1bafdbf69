// src/types/prompt.rs
//! The journal vocabulary: the three prompt categories and classifier confidence.

use super::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the three fixed journal prompts.
///
/// Every stage branches on this enum, so adding a category is a compile error
/// everywhere a prompt is rendered, stored or refined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptType {
    Gratitude,
    Desire,
    Brag,
}

impl PromptType {
    /// All categories in presentation order.
    pub const ALL: [PromptType; 3] = [PromptType::Gratitude, PromptType::Desire, PromptType::Brag];

    /// The wire label (`"gratitude"`, `"desire"`, `"brag"`).
    pub fn label(self) -> &'static str {
        match self {
            PromptType::Gratitude => "gratitude",
            PromptType::Desire => "desire",
            PromptType::Brag => "brag",
        }
    }

    /// What a response to this prompt is about, as explained to the model.
    pub fn description(self) -> &'static str {
        match self {
            PromptType::Gratitude => "expressions of thankfulness, appreciation for something or someone",
            PromptType::Desire => "wishes, wants, aspirations, goals the user has",
            PromptType::Brag => "accomplishments, proud moments, positive self-reflection",
        }
    }

    /// The canned follow-up offered when a response is too thin to judge.
    pub fn refinement_nudge(self) -> &'static str {
        match self {
            PromptType::Gratitude => "Let's break this down. Consider gratitude in these areas: health, relationships, career, or small daily joys. What's something positive you've experienced recently?",
            PromptType::Desire => "What about desires related to personal growth, experiences you want to have, or changes you'd like to make? It could be something big or small you're looking forward to.",
            PromptType::Brag => "Think about recent accomplishments, challenges you've overcome, or personal strengths you've displayed. Even small victories count - what's something you did well?",
        }
    }

    /// Lenient label matching for model output: ignores case, quotes and
    /// trailing punctuation, and accepts the plural forms used as Notion
    /// property names.
    pub fn from_model_label(raw: &str) -> Option<Self> {
        let cleaned = raw
            .trim()
            .trim_matches(|c: char| !c.is_ascii_alphabetic())
            .to_ascii_lowercase();

        match cleaned.as_str() {
            "gratitude" | "gratitudes" | "grateful" => Some(PromptType::Gratitude),
            "desire" | "desires" => Some(PromptType::Desire),
            "brag" | "brags" => Some(PromptType::Brag),
            _ => None,
        }
    }
}

impl fmt::Display for PromptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PromptType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gratitude" => Ok(PromptType::Gratitude),
            "desire" => Ok(PromptType::Desire),
            "brag" => Ok(PromptType::Brag),
            _ => Err(ValidationError::UnknownPromptType(s.to_string())),
        }
    }
}

/// Categorical confidence attached to a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    /// Buckets a model-reported score in `0.0..=1.0`.
    pub fn from_score(score: f64) -> Self {
        if score >= crate::constants::HIGH_CONFIDENCE_SCORE {
            Confidence::High
        } else if score >= crate::constants::MEDIUM_CONFIDENCE_SCORE {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        };
        f.write_str(label)
    }
}

impl FromStr for Confidence {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Confidence::High),
            "medium" => Ok(Confidence::Medium),
            "low" => Ok(Confidence::Low),
            other => other
                .parse::<f64>()
                .map(Confidence::from_score)
                .map_err(|_| ValidationError::UnknownConfidence(s.to_string())),
        }
    }
}
