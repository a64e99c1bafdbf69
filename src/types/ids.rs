// src/types/ids.rs
//! Notion object identifiers.

use super::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static NOTION_ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:^|[/\-?=])([a-fA-F0-9]{32}|[a-fA-F0-9]{8}-[a-fA-F0-9]{4}-[a-fA-F0-9]{4}-[a-fA-F0-9]{4}-[a-fA-F0-9]{12})(?:[/?#&]|$)",
    )
    .expect("Notion ID regex is valid")
});

/// A Notion page or database ID, stored without hyphens in lowercase.
///
/// Accepts the bare 32-character form, the hyphenated UUID form, or a
/// Notion URL ending in either.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NotionId(String);

/// The journal database the store writes into.
pub type DatabaseId = NotionId;

impl NotionId {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let cleaned = input.trim().trim_end_matches('/');
        if cleaned.is_empty() {
            return Err(ValidationError::InvalidId("empty Notion ID".to_string()));
        }

        // The last ID-looking segment wins: workspace slugs may precede it.
        let captured = NOTION_ID_PATTERN
            .captures_iter(cleaned)
            .filter_map(|c| c.get(1))
            .last()
            .ok_or_else(|| {
                ValidationError::InvalidId(format!("Could not parse Notion ID from: {}", input))
            })?;

        Ok(Self(captured.as_str().replace('-', "").to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Hyphenated UUID form used in API paths.
    pub fn to_hyphenated(&self) -> String {
        format!(
            "{}-{}-{}-{}-{}",
            &self.0[0..8],
            &self.0[8..12],
            &self.0[12..16],
            &self.0[16..20],
            &self.0[20..32]
        )
    }
}

impl fmt::Display for NotionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for NotionId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for NotionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NotionId::parse(&s).map_err(serde::de::Error::custom)
    }
}
