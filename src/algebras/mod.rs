//! Capability algebras for trinity-journal.
//!
//! Each trait represents a **capability** the pipeline needs from the outside
//! world, not an implementation of it. Each trait is:
//!
//! - **Object-safe**: held as `Arc<dyn Trait>` by the pipeline stages
//! - **Narrow**: one method, so a deterministic fake is a few lines
//! - **Documented with laws**: properties every implementation must satisfy
//!
//! # Architecture
//!
//! ```text
//! Entry points (main.rs, library callers)
//!         ↓
//! Pipeline stages (pipeline/)
//!         ↓
//! Algebras (algebras/)
//!         ↓
//! Interpreters (api/openai.rs, api/notion/)
//! ```
//!
//! # Capability Traits
//!
//! - [`TextCompletion`]: prompt in, completion text out
//! - [`DocumentStore`]: persist one accepted journal record
//! - [`Clock`]: the instant a record is stamped with

pub mod clock;
pub mod completion;
pub mod error;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use completion::TextCompletion;
pub use error::{CompletionError, StoreError};
pub use store::{DocumentStore, UnconfiguredStore};
