// src/pipeline/formatter.rs
//! Cleans accepted responses into readable prose for storage.

use super::{Degradation, StageOutput};
use crate::algebras::TextCompletion;
use crate::error_recovery::{retry_with_backoff_if, RetryPolicy};
use crate::prompts::PromptLibrary;
use crate::types::PromptType;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```[A-Za-z]*\s*\n?(.*?)\s*```$").expect("code fence regex is valid")
});

/// Words that are capitalized wherever they appear.
const ALWAYS_CAPITALIZED: &[&str] = &["i", "i'm", "i've", "i'll", "i'd"];

pub struct Formatter {
    completion: Arc<dyn TextCompletion>,
    prompts: Arc<PromptLibrary>,
    retry: RetryPolicy,
}

impl Formatter {
    pub fn new(
        completion: Arc<dyn TextCompletion>,
        prompts: Arc<PromptLibrary>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            completion,
            prompts,
            retry,
        }
    }

    /// Returns the cleaned text, or the trimmed original if the model fails,
    /// answers with nothing, or invents names and numbers.
    pub async fn format(&self, transcription: &str, prompt: PromptType) -> StageOutput<String> {
        let original = transcription.trim().to_string();
        let fallback = |reason: String| {
            log::warn!("DegradedFormatting: {}; keeping original text", reason);
            StageOutput::degraded(original.clone(), Degradation::DegradedFormatting { reason })
        };

        let request = match self.prompts.formatting(&original, prompt) {
            Ok(request) => request,
            Err(e) => return fallback(e.to_string()),
        };

        let reply = match retry_with_backoff_if(
            || self.completion.complete(&request),
            &self.retry,
            |_| true,
        )
        .await
        {
            Ok(reply) => reply,
            Err(e) => return fallback(e.to_string()),
        };

        let cleaned = normalize_completion(&reply);
        if cleaned.is_empty() {
            return fallback("empty formatting reply".to_string());
        }

        let invented = introduced_entities(&original, &cleaned);
        if !invented.is_empty() {
            return fallback(format!("reply introduced {}", invented.join(", ")));
        }

        StageOutput::clean(cleaned)
    }
}

/// Strips the wrapping a model tends to put around plain text: surrounding
/// whitespace, a code fence, and one pair of matching quotes.
pub fn normalize_completion(raw: &str) -> String {
    let mut text = raw.trim();

    if let Some(inner) = CODE_FENCE.captures(text).and_then(|c| c.get(1)) {
        text = inner.as_str().trim();
    }

    for (open, close) in [('"', '"'), ('\u{201C}', '\u{201D}'), ('\'', '\'')] {
        if text.chars().count() >= 2 && text.starts_with(open) && text.ends_with(close) {
            let inner = &text[open.len_utf8()..text.len() - close.len_utf8()];
            if !inner.contains(open) && !inner.contains(close) {
                text = inner.trim();
                break;
            }
        }
    }

    text.to_string()
}

/// Entity-like tokens in `candidate` that never appear in `source`.
///
/// A token counts as entity-like when it contains a digit, or starts with a
/// capital letter somewhere other than the start of a sentence. Comparison
/// is case-insensitive, so recapitalising a name the user said is fine.
pub fn introduced_entities(source: &str, candidate: &str) -> Vec<String> {
    let known: HashSet<String> = source.split_whitespace().map(normalize_token).collect();

    let mut introduced = Vec::new();

    for (starts_sentence, raw) in candidate
        .lines()
        .flat_map(|line| line.split_whitespace().enumerate())
        .scan(true, |sentence_start, (index, raw)| {
            // Every line opens a new sentence.
            let starts_sentence = index == 0 || *sentence_start;
            *sentence_start = ends_sentence(raw);
            Some((starts_sentence, raw))
        })
    {
        let token = raw.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'');
        if token.is_empty() {
            continue;
        }

        let has_digit = token.chars().any(|c| c.is_ascii_digit());
        let capitalized = token.chars().next().is_some_and(char::is_uppercase);
        let normalized = normalize_token(token);
        let is_entity = has_digit
            || (capitalized
                && !starts_sentence
                && !ALWAYS_CAPITALIZED.contains(&normalized.as_str()));

        if is_entity && !known.contains(&normalized) && !introduced.contains(&token.to_string()) {
            introduced.push(token.to_string());
        }
    }

    introduced
}

/// Closing quotes and brackets that may follow a sentence's final mark.
const SENTENCE_CLOSERS: &[char] = &['"', '\'', ')', ']', '\u{201D}', '\u{2019}', '\u{00BB}'];

/// True when `raw` ends a sentence, e.g. `well.`, `right?"` or `done.)`.
fn ends_sentence(raw: &str) -> bool {
    raw.trim_end_matches(SENTENCE_CLOSERS)
        .ends_with(['.', '!', '?', '\u{2026}'])
}

/// Lowercase, outer punctuation removed, possessive dropped.
fn normalize_token(token: &str) -> String {
    let trimmed = token
        .replace('\u{2019}', "'")
        .trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
        .trim_matches('\'')
        .to_lowercase();
    trimmed
        .strip_suffix("'s")
        .map(str::to_string)
        .unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebras::CompletionError;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    struct Reply(Result<String, CompletionError>);

    #[async_trait]
    impl TextCompletion for Reply {
        async fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
            self.0.clone()
        }
    }

    fn formatter(reply: Result<&str, CompletionError>) -> Formatter {
        Formatter::new(
            Arc::new(Reply(reply.map(str::to_string))),
            Arc::new(PromptLibrary::new().unwrap()),
            RetryPolicy::immediate(2),
        )
    }

    #[test]
    fn unwraps_fences_and_quotes() {
        assert_eq!(normalize_completion("```\nI am grateful.\n```"), "I am grateful.");
        assert_eq!(normalize_completion("```text\nI am grateful.```"), "I am grateful.");
        assert_eq!(normalize_completion("  \"I am grateful.\"  "), "I am grateful.");
        assert_eq!(
            normalize_completion("\"Hi,\" she said, \"thanks.\""),
            "\"Hi,\" she said, \"thanks.\""
        );
    }

    #[test]
    fn normalizing_is_idempotent() {
        for raw in ["```\n\"Quoted.\"\n```", "Plain text.", "  'single'  "] {
            let once = normalize_completion(raw);
            assert_eq!(normalize_completion(&once), once);
        }
    }

    #[test]
    fn detects_invented_names_and_numbers() {
        let source = "um so i'm grateful for my sister sarah she helped me move";
        let faithful = "I'm grateful for my sister Sarah. She helped me move.";
        assert!(introduced_entities(source, faithful).is_empty());

        let embellished = "I'm grateful for my sister Sarah, who drove 200 miles from Boston.";
        assert_eq!(introduced_entities(source, embellished), vec!["200", "Boston"]);
    }

    #[test]
    fn sentence_openers_after_closers_and_line_breaks_are_not_entities() {
        let source = "she asked are you coming i said yes and we went to the lake";
        for candidate in [
            "She asked, \"Are you coming?\" Afterwards we went to the lake.",
            "She asked if I was coming (I said yes.) Later we went to the lake.",
            "She asked if I was coming, I said yes\nTogether we went to the lake",
            "She asked, \u{201C}Are you coming?\u{201D} Afterwards we went to the lake.",
            "I said yes.\u{2019} Afterwards we went to the lake.",
        ] {
            assert_eq!(
                introduced_entities(source, candidate),
                Vec::<String>::new(),
                "for {:?}",
                candidate
            );
        }
    }

    #[test]
    fn entity_tokens_of_a_reply_must_come_from_the_response() {
        let cases: &[(&str, &str, &[&str])] = &[
            (
                "grateful for my sister sarah",
                "Grateful for my sister Sarah.",
                &[],
            ),
            (
                "grateful for my sister",
                "Grateful for my sister Sarah.",
                &["Sarah"],
            ),
            (
                "i ran five k this morning",
                "I ran 5k this morning.",
                &["5k"],
            ),
            (
                "i ran 5k with tom",
                "I ran 5k with Tom's group.",
                &[],
            ),
            (
                "i want to visit japan next year",
                "I want to visit Japan in 2027.",
                &["2027"],
            ),
            (
                "proud that i finally called mom",
                "I'm proud that I finally called Mom while Dad was there.",
                &["Dad"],
            ),
            (
                "um thankful for the rain",
                "Thankful for the rain in Portland and Seattle.",
                &["Portland", "Seattle"],
            ),
        ];

        for (source, candidate, expected) in cases {
            let introduced = introduced_entities(source, candidate);
            assert_eq!(&introduced, expected, "for {:?}", candidate);

            let known: HashSet<String> = source.split_whitespace().map(normalize_token).collect();
            for token in &introduced {
                assert!(
                    !known.contains(&normalize_token(token)),
                    "{:?} is in the response {:?}",
                    token,
                    source
                );
            }
            // Removing what was flagged leaves a reply whose entities are all
            // contained in the response.
            let trimmed: Vec<&str> = candidate
                .split_whitespace()
                .filter(|w| !introduced.iter().any(|t| w.contains(t.as_str())))
                .collect();
            assert!(introduced_entities(source, &trimmed.join(" ")).is_empty());
        }
    }

    #[tokio::test]
    async fn returns_cleaned_text() {
        let output = formatter(Ok("\"I'm proud that I ran five miles today.\""))
            .format("um i ran like five miles today im proud", PromptType::Brag)
            .await;
        assert_eq!(output.value, "I'm proud that I ran five miles today.");
        assert!(!output.is_degraded());
    }

    #[tokio::test]
    async fn falls_back_on_failure_or_empty_reply() {
        let original = "  i ran five miles today  ";
        let failed = formatter(Err(CompletionError::Timeout {
            operation: "chat completion".to_string(),
        }))
        .format(original, PromptType::Brag)
        .await;
        assert_eq!(failed.value, original.trim());
        assert!(failed.is_degraded());

        let empty = formatter(Ok("``` ```")).format(original, PromptType::Brag).await;
        assert_eq!(empty.value, original.trim());
        assert!(empty.is_degraded());
    }

    #[tokio::test]
    async fn rejects_embellished_reply() {
        let output = formatter(Ok("I ran five miles in Central Park today."))
            .format("i ran five miles today", PromptType::Brag)
            .await;
        assert_eq!(output.value, "i ran five miles today");
        assert!(matches!(
            output.degradation,
            Some(Degradation::DegradedFormatting { .. })
        ));
    }
}
