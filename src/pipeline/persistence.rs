// src/pipeline/persistence.rs
//! Hands accepted entries to the document store.

use super::{Degradation, StageOutput};
use crate::algebras::{DocumentStore, StoreError};
use crate::error_recovery::{retry_with_backoff_if, RetryPolicy};
use crate::model::JournalRecord;
use crate::types::PromptType;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub struct PersistenceDispatcher {
    store: Arc<dyn DocumentStore>,
    retry: RetryPolicy,
}

impl PersistenceDispatcher {
    pub fn new(store: Arc<dyn DocumentStore>, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    /// Writes one record and reports whether it landed. Never fails.
    pub async fn persist(&self, prompt: PromptType, text: &str, timestamp: DateTime<Utc>) -> bool {
        self.dispatch(prompt, text, timestamp).await.value
    }

    /// Like [`persist`](Self::persist), keeping the reason for a failure.
    pub async fn dispatch(
        &self,
        prompt: PromptType,
        text: &str,
        timestamp: DateTime<Utc>,
    ) -> StageOutput<bool> {
        let record = JournalRecord::new(prompt, text, timestamp);

        match retry_with_backoff_if(
            || self.store.write(&record),
            &self.retry,
            StoreError::is_retryable,
        )
        .await
        {
            Ok(()) => {
                log::info!("Saved {} entry for {}", prompt, record.date_label());
                StageOutput::clean(true)
            }
            Err(e) => {
                log::error!("PersistenceFailed: could not save {} entry: {}", prompt, e);
                StageOutput::degraded(
                    false,
                    Degradation::PersistenceFailed {
                        reason: e.to_string(),
                    },
                )
            }
        }
    }
}
