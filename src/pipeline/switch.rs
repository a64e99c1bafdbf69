// src/pipeline/switch.rs
//! Prompt switch detection.

use crate::types::PromptType;
use std::collections::BTreeSet;

/// Reports whether the user answered a different prompt than the one asked.
///
/// `completed` is never consulted. Picking the next prompt belongs to the
/// caller.
pub fn detect(detected: PromptType, current: PromptType, _completed: &BTreeSet<PromptType>) -> bool {
    detected != current
}
