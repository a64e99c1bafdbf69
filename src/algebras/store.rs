//! Document store capability.

use async_trait::async_trait;

use super::error::StoreError;
use crate::model::JournalRecord;

/// The ability to durably persist one accepted journal entry.
///
/// # Laws
///
/// - **L1 (Single write)**: one call to `write` performs at most one logical
///   write of the record. Retrying is the dispatcher's decision.
/// - **L2 (Honest failure)**: `Ok(())` means the record is stored. Anything
///   short of that is an `Err`, so the caller can report non-persistence.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn write(&self, record: &JournalRecord) -> Result<(), StoreError>;
}

/// A store that refuses every write because nothing was configured.
///
/// Stands in for Notion when `NOTION_API_KEY` or `NOTION_DATABASE_ID` is
/// missing, so journaling keeps working and every result reports
/// `saved_to_notion: false`.
#[derive(Debug, Clone)]
pub struct UnconfiguredStore {
    reason: String,
}

impl UnconfiguredStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl DocumentStore for UnconfiguredStore {
    async fn write(&self, record: &JournalRecord) -> Result<(), StoreError> {
        log::info!(
            "Document store not configured, skipping save for prompt: {}",
            record.prompt_type
        );
        Err(StoreError::NotConfigured {
            reason: self.reason.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PromptType;
    use chrono::{TimeZone, Utc};
    use tokio::sync::Mutex;

    struct MemoryStore {
        records: Mutex<Vec<JournalRecord>>,
    }

    #[async_trait]
    impl DocumentStore for MemoryStore {
        async fn write(&self, record: &JournalRecord) -> Result<(), StoreError> {
            self.records.lock().await.push(record.clone());
            Ok(())
        }
    }

    fn record() -> JournalRecord {
        JournalRecord::new(
            PromptType::Brag,
            "I shipped the release.",
            Utc.with_ymd_and_hms(2026, 10, 16, 8, 30, 0).unwrap(),
        )
    }

    /// L1: one write stores one record
    #[tokio::test]
    async fn law_l1_single_write() {
        let store = MemoryStore {
            records: Mutex::new(Vec::new()),
        };
        store.write(&record()).await.unwrap();
        assert_eq!(store.records.lock().await.as_slice(), &[record()]);
    }

    /// L2: an unconfigured store never claims success
    #[tokio::test]
    async fn law_l2_unconfigured_store_fails_honestly() {
        let store = UnconfiguredStore::new("NOTION_API_KEY not set");
        let err = store.write(&record()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotConfigured { .. }));
        assert!(!err.is_retryable());
    }
}
