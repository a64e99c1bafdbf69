// src/api/notion/responses.rs
//! The slices of Notion API responses the journal store reads.
//!
//! Only the fields the store needs are modelled. Everything else in a
//! response is ignored by serde.

use crate::algebras::StoreError;
use crate::constants::ERROR_BODY_PREVIEW_LENGTH;
use crate::error::NotionErrorCode;
use crate::types::preview;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Generic paginated response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub results: Vec<T>,
    #[serde(default)]
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

/// A page, by id, with the rich-text content of its properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRef {
    pub id: String,
    #[serde(default)]
    pub created_time: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyRef>,
}

/// A page property. Only `rich_text` values are read; other property
/// types deserialize with an empty run list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyRef {
    #[serde(default)]
    pub rich_text: Vec<RichTextRef>,
}

impl PageRef {
    /// Plain text of a rich-text property, runs joined in order. Empty when
    /// the property is missing or holds another type.
    pub fn rich_text(&self, property: &str) -> String {
        self.properties
            .get(property)
            .map(|p| p.rich_text.iter().filter_map(RichTextRef::content).collect())
            .unwrap_or_default()
    }
}

/// A child block. Only `heading_2` content is read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockRef {
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default)]
    pub heading_2: Option<HeadingContent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadingContent {
    #[serde(default)]
    pub rich_text: Vec<RichTextRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichTextRef {
    #[serde(default)]
    pub plain_text: Option<String>,
    #[serde(default)]
    pub text: Option<TextContent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextContent {
    pub content: String,
}

impl RichTextRef {
    pub fn content(&self) -> Option<&str> {
        self.text
            .as_ref()
            .map(|t| t.content.as_str())
            .or(self.plain_text.as_deref())
    }
}

impl BlockRef {
    /// Text of the first rich-text run of a `heading_2` block.
    pub fn heading_2_text(&self) -> Option<&str> {
        if self.block_type != "heading_2" {
            return None;
        }
        self.heading_2
            .as_ref()
            .and_then(|h| h.rich_text.first())
            .and_then(RichTextRef::content)
    }
}

/// Notion's error body: `{"object":"error","status":404,"code":"object_not_found","message":"..."}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotionErrorBody {
    #[serde(default)]
    pub status: Option<u16>,
    pub code: String,
    pub message: String,
}

/// Decodes a Notion response body, turning non-2xx replies into a typed
/// [`StoreError::Notion`].
pub fn parse_notion_body<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, StoreError> {
    if !(200..300).contains(&status) {
        return Err(match serde_json::from_str::<NotionErrorBody>(body) {
            Ok(error) => StoreError::Notion {
                code: NotionErrorCode::from_api_response(&error.code),
                message: error.message,
            },
            Err(_) => StoreError::Notion {
                code: NotionErrorCode::from_http_status(status),
                message: preview(body, ERROR_BODY_PREVIEW_LENGTH),
            },
        });
    }

    serde_json::from_str(body).map_err(|e| StoreError::MalformedResponse {
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_query_results() {
        let body = r#"{
            "object": "list",
            "results": [{"object": "page", "id": "59833787-2cf9-4fdf-8782-e53db20768a5", "created_time": "2026-10-16T07:00:00.000Z", "properties": {}}],
            "next_cursor": null,
            "has_more": false
        }"#;
        let parsed: PaginatedResponse<PageRef> = parse_notion_body(200, body).unwrap();
        assert_eq!(parsed.results.len(), 1);
        assert_eq!(parsed.results[0].id, "59833787-2cf9-4fdf-8782-e53db20768a5");
        assert!(!parsed.has_more);
    }

    #[test]
    fn reads_rich_text_properties_and_ignores_other_types() {
        let body = r#"{
            "id": "59833787-2cf9-4fdf-8782-e53db20768a5",
            "properties": {
                "gratitudes": {"id": "a1", "type": "rich_text", "rich_text": [
                    {"type": "text", "text": {"content": "Warm coffee."}, "plain_text": "Warm coffee."},
                    {"type": "text", "text": {"content": " A dry bike ride."}, "plain_text": " A dry bike ride."}
                ]},
                "Name": {"id": "title", "type": "title", "title": [{"plain_text": "Daily: @Today"}]},
                "Date": {"id": "d1", "type": "date", "date": {"start": "2026-10-16"}}
            }
        }"#;
        let page: PageRef = parse_notion_body(200, body).unwrap();
        assert_eq!(page.rich_text("gratitudes"), "Warm coffee. A dry bike ride.");
        assert_eq!(page.rich_text("Name"), "");
        assert_eq!(page.rich_text("brags"), "");
    }

    #[test]
    fn reads_heading_text() {
        let body = r#"{
            "results": [
                {"type": "heading_2", "heading_2": {"rich_text": [{"type": "text", "text": {"content": "Gratitude"}, "plain_text": "Gratitude"}]}},
                {"type": "paragraph", "paragraph": {"rich_text": []}},
                {"type": "heading_2", "heading_2": {"rich_text": []}}
            ]
        }"#;
        let parsed: PaginatedResponse<BlockRef> = parse_notion_body(200, body).unwrap();
        let headings: Vec<_> = parsed.results.iter().filter_map(BlockRef::heading_2_text).collect();
        assert_eq!(headings, vec!["Gratitude"]);
    }

    #[test]
    fn maps_error_bodies_to_codes() {
        let body = r#"{"object":"error","status":404,"code":"object_not_found","message":"Could not find database"}"#;
        let err = parse_notion_body::<PageRef>(404, body).unwrap_err();
        assert_eq!(
            err,
            StoreError::Notion {
                code: NotionErrorCode::ObjectNotFound,
                message: "Could not find database".to_string(),
            }
        );

        let err = parse_notion_body::<PageRef>(502, "<html>Bad gateway</html>").unwrap_err();
        assert!(err.is_retryable());
    }
}
