// tests/common/mod.rs
//! Deterministic stand-ins for the completion service and the document store.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use trinity_journal::{
    CompletionError, DocumentStore, JournalPipeline, JournalRecord, PipelineSettings,
    StoreError, TextCompletion,
};

/// Which stage a completion request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Classify,
    Refine,
    Format,
}

impl Stage {
    fn of(prompt: &str) -> Option<Self> {
        if prompt.starts_with("You are analyzing a journal response") {
            Some(Stage::Classify)
        } else if prompt.contains("meaningfully answers") {
            Some(Stage::Refine)
        } else if prompt.starts_with("Clean up this") {
            Some(Stage::Format)
        } else {
            None
        }
    }
}

/// The transcription embedded in a rendered prompt.
pub fn transcription_of(prompt: &str) -> &str {
    prompt
        .rsplit("\"\"\"")
        .nth(1)
        .map(str::trim)
        .unwrap_or_default()
}

type Responder = Box<dyn Fn(&str) -> Result<String, CompletionError> + Send + Sync>;

/// Answers each stage with its own responder and records the call order.
pub struct ScriptedCompletion {
    classify: Responder,
    refine: Responder,
    format: Responder,
    calls: std::sync::Mutex<Vec<Stage>>,
}

impl ScriptedCompletion {
    /// Classifies as `label`, judges everything sufficient, and formats by
    /// capitalizing and adding a full stop.
    pub fn classifying_as(label: &'static str) -> Self {
        Self {
            classify: Box::new(move |_: &str| {
                Ok::<_, CompletionError>(format!(
                    r#"{{"prompt": "{}", "confidence": 0.9, "explanation": "scripted"}}"#,
                    label
                ))
            }),
            refine: Box::new(|_: &str| {
                Ok::<_, CompletionError>(r#"{"sufficient": true, "follow_up": ""}"#.to_string())
            }),
            format: Box::new(|text: &str| Ok::<_, CompletionError>(tidy(text))),
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn on_classify(
        mut self,
        responder: impl Fn(&str) -> Result<String, CompletionError> + Send + Sync + 'static,
    ) -> Self {
        self.classify = Box::new(responder);
        self
    }

    pub fn on_refine(
        mut self,
        responder: impl Fn(&str) -> Result<String, CompletionError> + Send + Sync + 'static,
    ) -> Self {
        self.refine = Box::new(responder);
        self
    }

    pub fn on_format(
        mut self,
        responder: impl Fn(&str) -> Result<String, CompletionError> + Send + Sync + 'static,
    ) -> Self {
        self.format = Box::new(responder);
        self
    }

    pub fn calls(&self) -> Vec<Stage> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    pub fn count(&self, stage: Stage) -> usize {
        self.calls().into_iter().filter(|s| *s == stage).count()
    }
}

#[async_trait]
impl TextCompletion for ScriptedCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let stage = Stage::of(prompt).expect("prompt from an unknown stage");
        self.calls.lock().expect("call log poisoned").push(stage);
        let text = transcription_of(prompt);
        match stage {
            Stage::Classify => (self.classify)(text),
            Stage::Refine => (self.refine)(text),
            Stage::Format => (self.format)(text),
        }
    }
}

/// Capitalizes the first letter and ends the text with a full stop.
pub fn tidy(text: &str) -> String {
    let text = text.trim();
    let mut chars = text.chars();
    let mut tidied: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    if !tidied.ends_with(['.', '!', '?']) {
        tidied.push('.');
    }
    tidied
}

pub fn transport_failure() -> CompletionError {
    CompletionError::Transport {
        message: "connection reset by peer".to_string(),
    }
}

/// Keeps every record it is given.
#[derive(Default)]
pub struct RecordingStore {
    records: Mutex<Vec<JournalRecord>>,
}

impl RecordingStore {
    pub async fn records(&self) -> Vec<JournalRecord> {
        self.records.lock().await.clone()
    }
}

#[async_trait]
impl DocumentStore for RecordingStore {
    async fn write(&self, record: &JournalRecord) -> Result<(), StoreError> {
        self.records.lock().await.push(record.clone());
        Ok(())
    }
}

/// Fails every write with the same error and counts attempts.
pub struct FailingStore {
    error: StoreError,
    attempts: AtomicUsize,
}

impl FailingStore {
    pub fn new(error: StoreError) -> Self {
        Self {
            error,
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn write(&self, _record: &JournalRecord) -> Result<(), StoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }
}

pub fn pipeline(
    completion: Arc<dyn TextCompletion>,
    store: Arc<dyn DocumentStore>,
) -> JournalPipeline {
    JournalPipeline::new(completion, store, PipelineSettings::default().without_backoff())
        .expect("pipeline should build")
}
