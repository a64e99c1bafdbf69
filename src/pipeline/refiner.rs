// src/pipeline/refiner.rs
//! Judges whether a response says enough to be worth saving.
//!
//! Most responses are settled without a model call: very short or "stuck"
//! responses get the canned nudge, long ones are accepted. Only the band in
//! between is sent to the completion service.

use super::{Degradation, StageOutput};
use crate::algebras::TextCompletion;
use crate::constants::{REFINE_CONFIDENT_WORDS, REFINE_MIN_WORDS, STUCK_PHRASES};
use crate::model::RefinementDecision;
use crate::prompts::{extract_json, PromptLibrary};
use crate::types::{count_words, PromptType, ValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::sync::Arc;

static STUCK_PATTERN: Lazy<Regex> = Lazy::new(|| {
    let alternatives = STUCK_PHRASES
        .iter()
        .map(|phrase| regex::escape(phrase))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives)).expect("stuck phrase regex is valid")
});

/// Word-count thresholds for the sufficiency check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefinementPolicy {
    min_words: usize,
    confident_words: usize,
}

impl RefinementPolicy {
    /// `min_words` must be at least 1 and no larger than `confident_words`.
    pub fn new(min_words: usize, confident_words: usize) -> Result<Self, ValidationError> {
        if min_words == 0 {
            return Err(ValidationError::InvalidSetting {
                name: "REFINE_MIN_WORDS",
                value: min_words.to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if confident_words < min_words {
            return Err(ValidationError::InvalidSetting {
                name: "REFINE_CONFIDENT_WORDS",
                value: confident_words.to_string(),
                reason: format!("must not be below REFINE_MIN_WORDS ({})", min_words),
            });
        }
        Ok(Self {
            min_words,
            confident_words,
        })
    }

    pub fn min_words(&self) -> usize {
        self.min_words
    }

    pub fn confident_words(&self) -> usize {
        self.confident_words
    }

    /// Classifies a response without calling out.
    pub fn assess(&self, text: &str) -> Assessment {
        let words = count_words(text);
        if words < self.min_words {
            return Assessment::TooShort { words };
        }
        if words >= self.confident_words {
            return Assessment::Sufficient;
        }
        if contains_stuck_phrase(text) {
            return Assessment::Stuck;
        }
        Assessment::Borderline
    }
}

impl Default for RefinementPolicy {
    fn default() -> Self {
        Self {
            min_words: REFINE_MIN_WORDS,
            confident_words: REFINE_CONFIDENT_WORDS,
        }
    }
}

/// Outcome of the local sufficiency check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assessment {
    TooShort { words: usize },
    Stuck,
    Borderline,
    Sufficient,
}

/// True when `text` contains one of the stuck phrases as whole words.
pub fn contains_stuck_phrase(text: &str) -> bool {
    STUCK_PATTERN.is_match(&text.replace('\u{2019}', "'"))
}

#[derive(Debug, Deserialize)]
struct SufficiencyReply {
    sufficient: bool,
    #[serde(default)]
    follow_up: Option<String>,
}

pub struct Refiner {
    completion: Arc<dyn TextCompletion>,
    prompts: Arc<PromptLibrary>,
    policy: RefinementPolicy,
}

impl Refiner {
    pub fn new(
        completion: Arc<dyn TextCompletion>,
        prompts: Arc<PromptLibrary>,
        policy: RefinementPolicy,
    ) -> Self {
        Self {
            completion,
            prompts,
            policy,
        }
    }

    /// Decides whether `transcription` needs more detail for `prompt`.
    ///
    /// Never fails: a broken sufficiency check accepts the response.
    pub async fn evaluate(
        &self,
        transcription: &str,
        prompt: PromptType,
    ) -> StageOutput<RefinementDecision> {
        match self.policy.assess(transcription) {
            Assessment::TooShort { words } => {
                log::debug!("Response too short ({} words), asking for more", words);
                StageOutput::clean(RefinementDecision::refine(prompt, ""))
            }
            Assessment::Stuck => {
                log::debug!("Response signals the user is stuck, asking for more");
                StageOutput::clean(RefinementDecision::refine(prompt, ""))
            }
            Assessment::Sufficient => StageOutput::clean(RefinementDecision::accept()),
            Assessment::Borderline => self.ask_model(transcription, prompt).await,
        }
    }

    async fn ask_model(&self, transcription: &str, prompt: PromptType) -> StageOutput<RefinementDecision> {
        let degrade = |reason: String| {
            log::warn!("DegradedRefinement: {}; accepting response", reason);
            StageOutput::degraded(
                RefinementDecision::accept(),
                Degradation::DegradedRefinement { reason },
            )
        };

        let request = match self.prompts.refinement(transcription, prompt) {
            Ok(request) => request,
            Err(e) => return degrade(e.to_string()),
        };

        let reply = match self.completion.complete(&request).await {
            Ok(reply) => reply,
            Err(e) => return degrade(e.to_string()),
        };

        match serde_json::from_str::<SufficiencyReply>(extract_json(&reply)) {
            Ok(SufficiencyReply {
                sufficient: true, ..
            }) => StageOutput::clean(RefinementDecision::accept()),
            Ok(SufficiencyReply {
                sufficient: false,
                follow_up,
            }) => StageOutput::clean(RefinementDecision::refine(
                prompt,
                follow_up.unwrap_or_default(),
            )),
            Err(e) => degrade(format!("unreadable sufficiency reply: {}", e)),
        }
    }
}
