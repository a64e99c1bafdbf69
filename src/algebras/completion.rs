//! Text completion capability.

use async_trait::async_trait;

use super::error::CompletionError;

/// The ability to turn a prompt into a text completion.
///
/// One method, no retries, no parsing. The classifier, refiner and formatter
/// each render their own prompt and interpret the text they get back, so a
/// deterministic fake is enough to exercise all of them.
///
/// # Laws
///
/// - **L1 (No hidden retries)**: one call to `complete` is at most one request
///   to the underlying service.
/// - **L2 (Errors are values)**: timeouts, transport failures and rate limits
///   come back as `Err(CompletionError)`, never as a panic or an empty `Ok`
///   pretending to be a completion.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}
