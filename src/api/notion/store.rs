// src/api/notion/store.rs
//! Journal persistence in a Notion database.
//!
//! Two layouts are supported:
//!
//! - [`StoreLayout::EntryRows`] (default): every entry becomes its own row
//!   with `Type`, `Content` and `Date` properties.
//! - [`StoreLayout::DailyPage`]: one page per day, found by title. Each
//!   category is a rich-text property (`gratitudes`, `desires`, `brags`);
//!   a new entry is appended on its own line after the day's earlier ones.

use super::client::NotionHttpClient;
use super::responses::{BlockRef, PageRef, PaginatedResponse};
use crate::algebras::{DocumentStore, StoreError};
use crate::constants::{DAILY_PAGE_TITLES, DEFAULT_NOTION_TIMEOUT_SECS, NOTION_RICH_TEXT_LIMIT};
use crate::error::AppError;
use crate::model::JournalRecord;
use crate::types::{ApiKey, DatabaseId, PromptType, ValidationError};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// How journal entries are laid out in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreLayout {
    DailyPage,
    #[default]
    EntryRows,
}

impl FromStr for StoreLayout {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "daily-page" | "daily" => Ok(Self::DailyPage),
            "entry-rows" | "rows" => Ok(Self::EntryRows),
            _ => Err(ValidationError::InvalidSetting {
                name: "NOTION_LAYOUT",
                value: s.to_string(),
                reason: "expected 'daily-page' or 'entry-rows'".to_string(),
            }),
        }
    }
}

impl fmt::Display for StoreLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DailyPage => f.write_str("daily-page"),
            Self::EntryRows => f.write_str("entry-rows"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotionStoreConfig {
    pub api_key: ApiKey,
    pub database_id: DatabaseId,
    pub layout: StoreLayout,
    /// Name of the database's title property.
    pub title_property: String,
    /// Per-request timeout, also used as the connect timeout.
    pub timeout: Duration,
}

impl NotionStoreConfig {
    pub fn new(api_key: ApiKey, database_id: DatabaseId) -> Self {
        Self {
            api_key,
            database_id,
            layout: StoreLayout::default(),
            title_property: "title".to_string(),
            timeout: Duration::from_secs(DEFAULT_NOTION_TIMEOUT_SECS),
        }
    }

    pub fn with_layout(mut self, layout: StoreLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub struct NotionJournalStore {
    client: NotionHttpClient,
    config: NotionStoreConfig,
}

impl NotionJournalStore {
    pub fn new(config: NotionStoreConfig) -> Result<Self, AppError> {
        let client = NotionHttpClient::new(&config.api_key, config.timeout)?;
        log::info!(
            "Notion store initialized for database {} ({} layout)",
            config.database_id,
            config.layout
        );
        Ok(Self { client, config })
    }

    /// Uses a preconfigured client, e.g. one pointed at a stub server.
    pub fn with_client(client: NotionHttpClient, config: NotionStoreConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &NotionStoreConfig {
        &self.config
    }

    /// Confirms the database exists and is shared with the integration.
    pub async fn check_access(&self) -> Result<(), StoreError> {
        let endpoint = format!("databases/{}", self.config.database_id.to_hyphenated());
        match self.client.get::<Value>(&endpoint).await {
            Ok(_) => {
                log::info!("Database {} is accessible", self.config.database_id);
                Ok(())
            }
            Err(e) => {
                if let StoreError::Notion { code, .. } = &e {
                    if code.is_permission_problem() {
                        log::error!(
                            "Permission denied. Share the database with the integration."
                        );
                    } else if matches!(code, crate::error::NotionErrorCode::ObjectNotFound) {
                        log::error!("Database not found. Check NOTION_DATABASE_ID.");
                    }
                }
                Err(e)
            }
        }
    }

    /// Finds today's journal page: the first page whose title contains one
    /// of the daily titles, else the most recently created page.
    pub async fn find_daily_page(&self) -> Result<PageRef, StoreError> {
        let endpoint = format!("databases/{}/query", self.config.database_id.to_hyphenated());

        for title in DAILY_PAGE_TITLES {
            let query = json!({
                "filter": {
                    "property": self.config.title_property,
                    "title": { "contains": title }
                },
                "page_size": 1
            });
            match self.client.post::<_, PaginatedResponse<PageRef>>(&endpoint, &query).await {
                Ok(response) => {
                    if let Some(page) = response.results.into_iter().next() {
                        log::debug!("Found '{}' page {}", title, page.id);
                        return Ok(page);
                    }
                }
                Err(e) if e.is_retryable() => return Err(e),
                Err(e) => log::warn!("Query for '{}' page failed: {}", title, e),
            }
        }

        let query = json!({
            "sorts": [{ "timestamp": "created_time", "direction": "descending" }],
            "page_size": 1
        });
        let response: PaginatedResponse<PageRef> = self.client.post(&endpoint, &query).await?;
        response
            .results
            .into_iter()
            .next()
            .inspect(|page| log::debug!("Using most recent page {}", page.id))
            .ok_or_else(|| StoreError::NotFound {
                what: format!("any page in database {}", self.config.database_id),
            })
    }

    /// Categories with a `heading_2` on today's page.
    pub async fn completed_prompts_today(&self) -> Result<Vec<PromptType>, StoreError> {
        let page = self.find_daily_page().await?;
        let endpoint = format!("blocks/{}/children?page_size=100", page.id);
        let children: PaginatedResponse<BlockRef> = self.client.get(&endpoint).await?;
        Ok(heading_prompts(&children.results))
    }

    async fn update_daily_page(&self, record: &JournalRecord) -> Result<(), StoreError> {
        let page = self.find_daily_page().await?;
        let earlier = page.rich_text(daily_property_name(record.prompt_type));
        let body = json!({ "properties": daily_page_properties(record, &earlier) });
        let _: PageRef = self
            .client
            .patch(&format!("pages/{}", page.id), &body)
            .await?;
        log::debug!(
            "Appended to '{}' on page {}",
            daily_property_name(record.prompt_type),
            page.id
        );
        Ok(())
    }

    async fn create_entry_row(&self, record: &JournalRecord) -> Result<(), StoreError> {
        let body = json!({
            "parent": { "database_id": self.config.database_id.to_hyphenated() },
            "properties": entry_row_properties(record, &self.config.title_property),
        });
        let page: PageRef = self.client.post("pages", &body).await?;
        log::debug!("Created entry row {}", page.id);
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for NotionJournalStore {
    async fn write(&self, record: &JournalRecord) -> Result<(), StoreError> {
        match self.config.layout {
            StoreLayout::DailyPage => self.update_daily_page(record).await,
            StoreLayout::EntryRows => self.create_entry_row(record).await,
        }
    }
}

/// Daily-page property that holds entries of `prompt`.
pub fn daily_property_name(prompt: PromptType) -> &'static str {
    match prompt {
        PromptType::Gratitude => "gratitudes",
        PromptType::Desire => "desires",
        PromptType::Brag => "brags",
    }
}

/// Rich-text runs for `content`, split to fit Notion's per-run limit.
pub fn rich_text_chunks(content: &str) -> Vec<Value> {
    let chars: Vec<char> = content.chars().collect();
    if chars.is_empty() {
        return vec![text_run("")];
    }
    chars
        .chunks(NOTION_RICH_TEXT_LIMIT)
        .map(|chunk| text_run(&chunk.iter().collect::<String>()))
        .collect()
}

fn text_run(content: &str) -> Value {
    json!({ "type": "text", "text": { "content": content } })
}

/// The category property with `record` appended after `earlier`, the text
/// already stored on the page for that category.
pub fn daily_page_properties(record: &JournalRecord, earlier: &str) -> Value {
    let content = if earlier.trim().is_empty() {
        record.content.clone()
    } else {
        format!("{}\n{}", earlier.trim_end(), record.content)
    };
    let mut properties = Map::new();
    properties.insert(
        daily_property_name(record.prompt_type).to_string(),
        json!({ "rich_text": rich_text_chunks(&content) }),
    );
    Value::Object(properties)
}

pub fn entry_row_properties(record: &JournalRecord, title_property: &str) -> Value {
    let mut properties = Map::new();
    properties.insert(
        title_property.to_string(),
        json!({ "title": rich_text_chunks(&record.title()) }),
    );
    properties.insert(
        "Type".to_string(),
        json!({ "select": { "name": record.prompt_type.label() } }),
    );
    properties.insert(
        "Content".to_string(),
        json!({ "rich_text": rich_text_chunks(&record.content) }),
    );
    properties.insert(
        "Date".to_string(),
        json!({ "date": { "start": record.date_label() } }),
    );
    Value::Object(properties)
}

/// Categories named by `heading_2` blocks, in page order, without repeats.
pub fn heading_prompts(blocks: &[BlockRef]) -> Vec<PromptType> {
    let mut prompts = Vec::new();
    for text in blocks.iter().filter_map(BlockRef::heading_2_text) {
        if let Ok(prompt) = text.parse::<PromptType>() {
            if !prompts.contains(&prompt) {
                prompts.push(prompt);
            }
        }
    }
    prompts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn record(prompt: PromptType, content: &str) -> JournalRecord {
        JournalRecord::new(
            prompt,
            content,
            Utc.with_ymd_and_hms(2026, 10, 16, 9, 15, 0).unwrap(),
        )
    }

    /// Accepts connections on a local port and never answers them.
    async fn silent_server() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        format!("http://{}/v1", addr)
    }

    #[tokio::test]
    async fn unresponsive_server_times_out() {
        let config = NotionStoreConfig::new(
            ApiKey::notion("secret_abc123").unwrap(),
            DatabaseId::parse("550e8400e29b41d4a716446655440000").unwrap(),
        )
        .with_timeout(Duration::from_millis(300));
        let client = NotionHttpClient::new(&config.api_key, config.timeout)
            .unwrap()
            .with_base_url(silent_server().await);
        let store = NotionJournalStore::with_client(client, config);

        let outcome = tokio::time::timeout(
            Duration::from_secs(10),
            store.write(&record(PromptType::Gratitude, "A quiet walk.")),
        )
        .await
        .expect("write should give up on its own");

        let err = outcome.unwrap_err();
        assert!(matches!(err, StoreError::Timeout { .. }), "got {:?}", err);
        assert!(err.is_retryable());
    }

    #[test]
    fn layout_parses_from_env_values() {
        assert_eq!(StoreLayout::default(), StoreLayout::EntryRows);
        assert_eq!("daily-page".parse::<StoreLayout>().unwrap(), StoreLayout::DailyPage);
        assert_eq!("ENTRY_ROWS".parse::<StoreLayout>().unwrap(), StoreLayout::EntryRows);
        assert!("spreadsheet".parse::<StoreLayout>().is_err());
    }

    #[test]
    fn daily_page_writes_the_category_property() {
        let properties =
            daily_page_properties(&record(PromptType::Desire, "A week in Lisbon."), "  ");
        assert_eq!(
            properties,
            json!({
                "desires": {
                    "rich_text": [{ "type": "text", "text": { "content": "A week in Lisbon." } }]
                }
            })
        );
    }

    #[test]
    fn daily_page_keeps_earlier_entries_of_the_day() {
        let earlier = "Warm coffee with Sam.";
        let properties =
            daily_page_properties(&record(PromptType::Gratitude, "A dry bike ride."), earlier);
        assert_eq!(
            properties["gratitudes"]["rich_text"][0]["text"]["content"],
            "Warm coffee with Sam.\nA dry bike ride."
        );

        let page: PageRef = serde_json::from_value(json!({
            "id": "p1",
            "properties": {
                "gratitudes": { "rich_text": [{ "plain_text": earlier }] }
            }
        }))
        .unwrap();
        assert_eq!(page.rich_text(daily_property_name(PromptType::Gratitude)), earlier);
    }

    #[test]
    fn entry_rows_carry_type_content_and_date() {
        let properties =
            entry_row_properties(&record(PromptType::Brag, "I fixed the build."), "Name");
        assert_eq!(properties["Type"]["select"]["name"], "brag");
        assert_eq!(
            properties["Content"]["rich_text"][0]["text"]["content"],
            "I fixed the build."
        );
        assert_eq!(properties["Date"]["date"]["start"], "2026-10-16");
        assert_eq!(
            properties["Name"]["title"][0]["text"]["content"],
            "Brag - 2026-10-16"
        );
    }

    #[test]
    fn long_content_is_chunked() {
        let content = "é".repeat(NOTION_RICH_TEXT_LIMIT + 5);
        let runs = rich_text_chunks(&content);
        assert_eq!(runs.len(), 2);
        assert_eq!(
            runs[1]["text"]["content"].as_str().map(|s| s.chars().count()),
            Some(5)
        );
    }

    #[test]
    fn headings_map_to_prompts() {
        let blocks: Vec<BlockRef> = serde_json::from_value(json!([
            { "type": "heading_2", "heading_2": { "rich_text": [{ "plain_text": "Brag" }] } },
            { "type": "heading_2", "heading_2": { "rich_text": [{ "plain_text": "Notes" }] } },
            { "type": "heading_2", "heading_2": { "rich_text": [{ "text": { "content": "gratitude" } }] } },
            { "type": "heading_2", "heading_2": { "rich_text": [{ "plain_text": "brag" }] } }
        ]))
        .unwrap();
        assert_eq!(
            heading_prompts(&blocks),
            vec![PromptType::Brag, PromptType::Gratitude]
        );
    }
}
