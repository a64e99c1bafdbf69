// src/lib.rs
//! trinity-journal library: classifies spoken journal responses into the
//! gratitude / desire / brag prompts, asks for more when a response is thin,
//! tidies the text and saves it to Notion.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Error handling**: `AppError`, `ValidationError`, `CompletionError`, `StoreError`
//! - **Configuration**: `ServiceConfig`, `CommandLineInput`
//! - **Domain model**: `ProcessingRequest`, `ProcessingResult`, `JournalRecord`, etc.
//! - **Domain types**: `PromptType`, `Confidence`, `Transcription`, `ApiKey`, etc.
//! - **Pipeline**: `JournalPipeline` and its stages
//! - **Capabilities**: `TextCompletion`, `DocumentStore`, `Clock`
//! - **Adapters**: `OpenAiCompletionClient`, `NotionJournalStore`

pub mod algebras;
pub mod api;
pub mod companion;
pub mod config;
pub mod constants;
pub mod error;
pub mod error_recovery;
pub mod model;
pub mod pipeline;
pub mod prompts;
pub mod types;

// --- Error Handling ---
pub use crate::algebras::{CompletionError, StoreError};
pub use crate::error::{AppError, NotionErrorCode};
pub use crate::types::ValidationError;

// --- Configuration ---
pub use crate::config::{
    Command, CommandLineInput, CompletionConfig, NotionSetup, ServiceConfig,
};

// --- Domain Model ---
pub use crate::model::{
    ClassificationResult, JournalRecord, ProcessingRequest, ProcessingResult,
    RawProcessingRequest, RefinementDecision,
};

// --- Domain Types ---
pub use crate::types::{
    ApiKey, Confidence, DatabaseId, ModelName, NotionId, PromptType, Transcription, ValidatedUrl,
};

// --- Pipeline ---
pub use crate::pipeline::{
    Degradation, JournalPipeline, PipelineReport, PipelineSettings, PipelineState,
    RefinementPolicy,
};

// --- Capabilities ---
pub use crate::algebras::{
    Clock, DocumentStore, FixedClock, SystemClock, TextCompletion, UnconfiguredStore,
};

// --- Adapters ---
pub use crate::api::{
    NotionHttpClient, NotionJournalStore, NotionStoreConfig, OpenAiCompletionClient, StoreLayout,
};

// --- Companion entry points ---
pub use crate::companion::{completed_prompts, health, HealthStatus};

// --- Recovery ---
pub use crate::error_recovery::{retry_with_backoff, RetryPolicy};
