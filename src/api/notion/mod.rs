// src/api/notion/mod.rs
//! Notion as the journal's document store.

mod client;
mod responses;
mod store;

pub use client::NotionHttpClient;
pub use responses::{parse_notion_body, BlockRef, NotionErrorBody, PageRef, PaginatedResponse};
pub use store::{
    daily_page_properties, daily_property_name, entry_row_properties, heading_prompts,
    rich_text_chunks, NotionJournalStore, NotionStoreConfig, StoreLayout,
};
