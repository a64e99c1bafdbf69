//! Locating the JSON payload in a chatty model reply.

use once_cell::sync::Lazy;
use regex::Regex;

static FENCED_JSON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)\s*```").expect("fenced JSON regex is valid")
});

static BRACED_JSON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("braced JSON regex is valid"));

/// Returns the most likely JSON text inside `raw`.
///
/// Tries a fenced code block first, then the widest `{...}` span, and
/// finally the whole trimmed reply.
pub fn extract_json(raw: &str) -> &str {
    if let Some(body) = FENCED_JSON.captures(raw).and_then(|c| c.get(1)) {
        if !body.as_str().is_empty() {
            return body.as_str();
        }
    }

    match BRACED_JSON.find(raw) {
        Some(span) => span.as_str(),
        None => raw.trim(),
    }
}
