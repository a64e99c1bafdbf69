// src/api/openai.rs
//! Text completion over an OpenAI-compatible chat completions endpoint.

use crate::algebras::{CompletionError, TextCompletion};
use crate::config::CompletionConfig;
use crate::constants::ERROR_BODY_PREVIEW_LENGTH;
use crate::error::AppError;
use crate::types::{preview, ModelName};
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Client for `POST {base_url}/chat/completions`.
///
/// Performs exactly one HTTP request per [`complete`](TextCompletion::complete)
/// call. Retrying belongs to the pipeline stages.
#[derive(Clone)]
pub struct OpenAiCompletionClient {
    client: Client,
    endpoint: String,
    model: ModelName,
    temperature: f32,
}

impl OpenAiCompletionClient {
    pub fn new(config: &CompletionConfig) -> Result<Self, AppError> {
        let mut headers = header::HeaderMap::new();
        let auth_header = format!("Bearer {}", config.api_key.as_str());
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&auth_header).map_err(|e| {
                AppError::MissingConfiguration(format!("Invalid API key format: {}", e))
            })?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.base_url.endpoint("chat/completions"),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl TextCompletion for OpenAiCompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let body = ChatRequest {
            model: self.model.as_str(),
            temperature: self.temperature,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        log::debug!("POST {} (model {})", self.endpoint, self.model.as_str());
        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let text = response.text().await.map_err(transport_error)?;

        parse_chat_response(status, retry_after, &text)
    }
}

fn transport_error(err: reqwest::Error) -> CompletionError {
    if err.is_timeout() {
        CompletionError::Timeout {
            operation: "chat completion".to_string(),
        }
    } else {
        CompletionError::Transport {
            message: err.to_string(),
        }
    }
}

/// Turns a chat completions HTTP response into completion text.
pub fn parse_chat_response(
    status: StatusCode,
    retry_after_seconds: Option<u64>,
    body: &str,
) -> Result<String, CompletionError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(CompletionError::RateLimited {
            retry_after_seconds,
        });
    }

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorEnvelope>(body)
            .map(|envelope| envelope.error.message)
            .unwrap_or_else(|_| preview(body, ERROR_BODY_PREVIEW_LENGTH));
        return Err(CompletionError::Api {
            status: status.as_u16(),
            message,
        });
    }

    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| CompletionError::MalformedResponse {
            reason: e.to_string(),
        })?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| CompletionError::MalformedResponse {
            reason: "response has no message content".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_choice() {
        let body = r#"{"id":"chatcmpl-1","choices":[{"index":0,"message":{"role":"assistant","content":"brag"}}]}"#;
        assert_eq!(
            parse_chat_response(StatusCode::OK, None, body).unwrap(),
            "brag"
        );
    }

    #[test]
    fn rate_limit_carries_retry_hint() {
        let err = parse_chat_response(StatusCode::TOO_MANY_REQUESTS, Some(7), "{}").unwrap_err();
        assert_eq!(
            err,
            CompletionError::RateLimited {
                retry_after_seconds: Some(7)
            }
        );
        assert!(err.is_retryable());
    }

    #[test]
    fn api_errors_keep_the_service_message() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
        let err = parse_chat_response(StatusCode::UNAUTHORIZED, None, body).unwrap_err();
        assert_eq!(
            err,
            CompletionError::Api {
                status: 401,
                message: "Incorrect API key provided".to_string()
            }
        );
        assert!(!err.is_retryable());
    }

    #[test]
    fn missing_content_is_malformed() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        assert!(matches!(
            parse_chat_response(StatusCode::OK, None, body),
            Err(CompletionError::MalformedResponse { .. })
        ));
        assert!(matches!(
            parse_chat_response(StatusCode::OK, None, "<html>"),
            Err(CompletionError::MalformedResponse { .. })
        ));
    }
}
