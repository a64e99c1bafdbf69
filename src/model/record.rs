// src/model/record.rs

use crate::types::PromptType;
use chrono::{DateTime, Utc};

/// One accepted journal entry, ready for the document store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalRecord {
    pub prompt_type: PromptType,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl JournalRecord {
    pub fn new(prompt_type: PromptType, content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            prompt_type,
            content: content.into(),
            timestamp,
        }
    }

    /// Calendar date of the entry as `YYYY-MM-DD`.
    pub fn date_label(&self) -> String {
        self.timestamp.format("%Y-%m-%d").to_string()
    }

    /// Title used when the record becomes its own page.
    pub fn title(&self) -> String {
        let label = self.prompt_type.label();
        let mut heading = label[..1].to_ascii_uppercase();
        heading.push_str(&label[1..]);
        format!("{} - {}", heading, self.date_label())
    }
}
