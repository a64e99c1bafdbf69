// src/api/mod.rs
//! Interpreters for the capability traits: the HTTP clients that talk to the
//! completion service and to Notion.
//!
//! Nothing outside this module knows about HTTP. The pipeline sees only
//! `TextCompletion` and `DocumentStore`.

pub mod notion;
pub mod openai;

pub use notion::{NotionHttpClient, NotionJournalStore, NotionStoreConfig, StoreLayout};
pub use openai::{parse_chat_response, OpenAiCompletionClient};
