//! Per-request data: what comes in, what the stages decide, what goes out.
//!
//! Everything here is created at the start of one pipeline invocation and
//! dropped at its end. Nothing is shared between requests.

mod record;
mod request;
mod result;

pub use record::JournalRecord;
pub use request::{ProcessingRequest, RawProcessingRequest};
pub use result::{ClassificationResult, ProcessingResult, RefinementDecision};
