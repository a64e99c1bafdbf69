// src/constants.rs
//! Domain constants that define the operational boundaries of the pipeline.
//!
//! Each constant is named for the journaling concept it constrains. Values
//! that operators may want to tune are only defaults here; the runtime copy
//! lives in `config` and `pipeline::RefinementPolicy`.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Refinement thresholds
// ---------------------------------------------------------------------------

/// Responses with fewer words than this are sent back for refinement without
/// asking the model. "idk", "not much" and the like land here.
pub const REFINE_MIN_WORDS: usize = 3;

/// Responses with at least this many words are accepted without asking the
/// model. Between the two thresholds the model judges sufficiency.
pub const REFINE_CONFIDENT_WORDS: usize = 12;

/// Phrases that signal the writer is stuck. Matched on word boundaries,
/// case-insensitively, and only below `REFINE_CONFIDENT_WORDS`.
pub const STUCK_PHRASES: &[&str] = &[
    "i don't know",
    "i dont know",
    "idk",
    "not sure",
    "can't think",
    "cant think",
    "um",
    "uh",
    "hmm",
    "difficult",
    "struggling",
];

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Scores at or above this are reported as high confidence.
pub const HIGH_CONFIDENCE_SCORE: f64 = 0.8;

/// Scores at or above this (and below high) are reported as medium confidence.
pub const MEDIUM_CONFIDENCE_SCORE: f64 = 0.5;

// ---------------------------------------------------------------------------
// Retry budgets
// ---------------------------------------------------------------------------

/// Total attempts for each text-completion call (first try plus one retry).
pub const COMPLETION_MAX_ATTEMPTS: u32 = 2;

/// Total attempts for each document-store write (first try plus one retry).
pub const STORE_MAX_ATTEMPTS: u32 = 2;

/// Delay before the first retry; doubles on each further attempt.
pub const RETRY_INITIAL_DELAY: Duration = Duration::from_millis(250);

/// Upper bound on a single backoff delay.
pub const RETRY_MAX_DELAY: Duration = Duration::from_secs(2);

// ---------------------------------------------------------------------------
// Text completion service
// ---------------------------------------------------------------------------

pub const DEFAULT_COMPLETION_BASE_URL: &str = "https://api.openai.com/v1";

pub const DEFAULT_COMPLETION_MODEL: &str = "gpt-4o";

/// Low temperature keeps classification and formatting deterministic.
pub const DEFAULT_COMPLETION_TEMPERATURE: f32 = 0.0;

/// Per-request timeout for the completion service.
pub const DEFAULT_COMPLETION_TIMEOUT_SECS: u64 = 30;

// ---------------------------------------------------------------------------
// Notion
// ---------------------------------------------------------------------------

pub const NOTION_VERSION: &str = "2022-06-28";

pub const NOTION_API_BASE_URL: &str = "https://api.notion.com/v1";

/// Per-request timeout for the Notion API.
pub const DEFAULT_NOTION_TIMEOUT_SECS: u64 = 30;

/// Notion rejects rich-text items longer than this many characters.
pub const NOTION_RICH_TEXT_LIMIT: usize = 2000;

/// Title fragments searched, in order, when locating today's journal page.
pub const DAILY_PAGE_TITLES: &[&str] = &["Daily: @Today", "Daily"];

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Characters of journal text shown in log lines.
pub const LOG_PREVIEW_CHARS: usize = 50;

/// Characters of an error response body kept in error messages.
pub const ERROR_BODY_PREVIEW_LENGTH: usize = 200;
