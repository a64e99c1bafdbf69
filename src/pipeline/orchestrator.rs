// src/pipeline/orchestrator.rs
//! Sequences the stages into one journal invocation.

use super::{
    switch, Classifier, Degradation, Formatter, PersistenceDispatcher, PipelineReport,
    PipelineSettings, PipelineState, Refiner, StageOutput,
};
use crate::algebras::{Clock, DocumentStore, SystemClock, TextCompletion};
use crate::error::AppError;
use crate::model::{ProcessingRequest, ProcessingResult, RawProcessingRequest};
use crate::prompts::PromptLibrary;
use std::sync::Arc;
use uuid::Uuid;

/// The journal pipeline.
///
/// Holds only shared, immutable collaborators, so one instance can serve
/// any number of concurrent invocations.
pub struct JournalPipeline {
    classifier: Classifier,
    refiner: Refiner,
    formatter: Formatter,
    dispatcher: PersistenceDispatcher,
    clock: Arc<dyn Clock>,
}

/// Per-invocation bookkeeping.
struct Trace {
    id: String,
    states: Vec<PipelineState>,
    degradations: Vec<Degradation>,
}

impl Trace {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            states: Vec::new(),
            degradations: Vec::new(),
        }
    }

    fn enter(&mut self, state: PipelineState) {
        log::debug!("[{}] -> {}", self.id, state);
        self.states.push(state);
    }

    fn absorb<T>(&mut self, output: StageOutput<T>) -> T {
        if let Some(degradation) = output.degradation {
            self.degradations.push(degradation);
        }
        output.value
    }

    fn finish(mut self, result: ProcessingResult) -> PipelineReport {
        self.enter(PipelineState::Done);
        PipelineReport {
            invocation_id: self.id,
            states: self.states,
            degradations: self.degradations,
            result,
        }
    }
}

impl JournalPipeline {
    pub fn new(
        completion: Arc<dyn TextCompletion>,
        store: Arc<dyn DocumentStore>,
        settings: PipelineSettings,
    ) -> Result<Self, AppError> {
        let prompts = Arc::new(PromptLibrary::new()?);

        Ok(Self {
            classifier: Classifier::new(
                completion.clone(),
                prompts.clone(),
                settings.completion_retry,
            ),
            refiner: Refiner::new(completion.clone(), prompts.clone(), settings.refinement),
            formatter: Formatter::new(completion, prompts, settings.completion_retry),
            dispatcher: PersistenceDispatcher::new(store, settings.store_retry),
            clock: Arc::new(SystemClock),
        })
    }

    /// Replaces the clock used to stamp saved records.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Validates a wire request and processes it.
    pub async fn process_raw(&self, raw: RawProcessingRequest) -> Result<ProcessingResult, AppError> {
        let request = ProcessingRequest::try_from(raw)?;
        self.process(&request).await
    }

    /// Processes one request. Only invalid input is returned as an error.
    pub async fn process(&self, request: &ProcessingRequest) -> Result<ProcessingResult, AppError> {
        Ok(self.process_with_report(request).await?.result)
    }

    /// Processes one request and reports the states visited and any
    /// failures absorbed along the way.
    pub async fn process_with_report(
        &self,
        request: &ProcessingRequest,
    ) -> Result<PipelineReport, AppError> {
        let mut trace = Trace::new();
        let text = request.transcription.as_str();
        log::info!(
            "[{}] Processing {} response ({} words): \"{}\"",
            trace.id,
            request.current_prompt,
            request.transcription.word_count(),
            request.transcription.preview()
        );

        trace.enter(PipelineState::Classifying);
        let classification = match self
            .classifier
            .classify(text, request.current_prompt)
            .await
        {
            Ok(output) => trace.absorb(output),
            Err(e) if e.is_invalid_input() => return Err(e),
            Err(e) => {
                log::error!("[{}] {}", trace.id, e);
                trace.degradations.push(Degradation::ClassificationUnavailable {
                    reason: e.to_string(),
                });
                let result = ProcessingResult::classification_unavailable(request.current_prompt);
                return Ok(trace.finish(result));
            }
        };
        let detected = classification.detected_prompt;

        trace.enter(PipelineState::DetectingSwitch);
        let prompt_changed = switch::detect(
            detected,
            request.current_prompt,
            &request.completed_prompts,
        );
        if prompt_changed {
            log::info!(
                "[{}] Prompt switch: {} -> {}",
                trace.id,
                request.current_prompt,
                detected
            );
        }

        trace.enter(PipelineState::Evaluating);
        let decision = trace.absorb(self.refiner.evaluate(text, detected).await);

        if let Some(suggestion) = decision.suggestion() {
            trace.enter(PipelineState::RefiningStop);
            log::info!("[{}] Asking for refinement of {} response", trace.id, detected);
            let result = ProcessingResult::refinement(detected, prompt_changed, suggestion);
            return Ok(trace.finish(result));
        }

        trace.enter(PipelineState::Formatting);
        let formatted = trace.absorb(self.formatter.format(text, detected).await);

        trace.enter(PipelineState::Persisting);
        let saved = trace.absorb(
            self.dispatcher
                .dispatch(detected, &formatted, self.clock.now())
                .await,
        );

        log::info!(
            "[{}] Accepted {} response (changed: {}, saved: {})",
            trace.id,
            detected,
            prompt_changed,
            saved
        );
        Ok(trace.finish(ProcessingResult::accepted(
            detected,
            prompt_changed,
            formatted,
            saved,
        )))
    }
}
