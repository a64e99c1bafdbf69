// src/pipeline/mod.rs
//! The journal pipeline: classify → detect switch → evaluate → format → persist.
//!
//! Each stage lives in its own module and talks to the outside world only
//! through the capability traits in `algebras`. The [`JournalPipeline`]
//! sequences them and owns the fail-open policy: a stage that cannot reach
//! its collaborator degrades to a safe value and records a [`Degradation`]
//! instead of failing the request.

pub mod classifier;
pub mod formatter;
pub mod orchestrator;
pub mod persistence;
pub mod refiner;
pub mod switch;

pub use classifier::{parse_classification, Classifier};
pub use formatter::{introduced_entities, normalize_completion, Formatter};
pub use orchestrator::JournalPipeline;
pub use persistence::PersistenceDispatcher;
pub use refiner::{Assessment, RefinementPolicy, Refiner};

use crate::error_recovery::RetryPolicy;
use crate::model::ProcessingResult;
use serde::Serialize;
use std::fmt;

/// Where an invocation is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Classifying,
    DetectingSwitch,
    Evaluating,
    RefiningStop,
    Formatting,
    Persisting,
    Done,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Classifying => "classifying",
            Self::DetectingSwitch => "detecting_switch",
            Self::Evaluating => "evaluating",
            Self::RefiningStop => "refining_stop",
            Self::Formatting => "formatting",
            Self::Persisting => "persisting",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// A failure the pipeline absorbed instead of returning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degradation {
    /// The completion service never answered the classification request.
    ClassificationUnavailable { reason: String },
    /// The classifier answered but its reply could not be read, so the
    /// current prompt was kept.
    ClassificationFallback { reason: String },
    /// The sufficiency check failed; the response was accepted.
    DegradedRefinement { reason: String },
    /// Formatting failed or was rejected; the original text was kept.
    DegradedFormatting { reason: String },
    /// The record could not be written to the document store.
    PersistenceFailed { reason: String },
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClassificationUnavailable { reason } => {
                write!(f, "classification unavailable: {}", reason)
            }
            Self::ClassificationFallback { reason } => {
                write!(f, "classification fell back to current prompt: {}", reason)
            }
            Self::DegradedRefinement { reason } => write!(f, "refinement degraded: {}", reason),
            Self::DegradedFormatting { reason } => write!(f, "formatting degraded: {}", reason),
            Self::PersistenceFailed { reason } => write!(f, "persistence failed: {}", reason),
        }
    }
}

/// A stage's value plus the degradation it absorbed to produce it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOutput<T> {
    pub value: T,
    pub degradation: Option<Degradation>,
}

impl<T> StageOutput<T> {
    pub fn clean(value: T) -> Self {
        Self {
            value,
            degradation: None,
        }
    }

    pub fn degraded(value: T, degradation: Degradation) -> Self {
        Self {
            value,
            degradation: Some(degradation),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.degradation.is_some()
    }
}

/// The result of one invocation along with how it got there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    pub invocation_id: String,
    pub states: Vec<PipelineState>,
    pub degradations: Vec<Degradation>,
    pub result: ProcessingResult,
}

impl PipelineReport {
    pub fn visited(&self, state: PipelineState) -> bool {
        self.states.contains(&state)
    }
}

/// Tunables shared by the stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    pub refinement: RefinementPolicy,
    pub completion_retry: RetryPolicy,
    pub store_retry: RetryPolicy,
}

impl PipelineSettings {
    pub fn new(refinement: RefinementPolicy) -> Self {
        Self {
            refinement,
            completion_retry: RetryPolicy::completion(),
            store_retry: RetryPolicy::store(),
        }
    }

    /// Same budgets, no sleeping between attempts.
    pub fn without_backoff(mut self) -> Self {
        self.completion_retry = RetryPolicy::immediate(self.completion_retry.max_attempts);
        self.store_retry = RetryPolicy::immediate(self.store_retry.max_attempts);
        self
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::new(RefinementPolicy::default())
    }
}
