use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs},
    Client,
};
use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use std::time::Duration;

use super::{LanguageModel, LlmError};

const NAME: &str = "openai";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAi {
    client: Client<OpenAIConfig>,
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAi {
    pub fn new(http: reqwest::Client, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let api_key = api_key.into();
        Self {
            client: build_client(&http, &api_key, DEFAULT_BASE_URL),
            http,
            api_key,
            model: model.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.client = build_client(&self.http, &self.api_key, &base_url.into());
        self
    }
}

/// One attempt per request: a zero elapsed-time budget turns off the
/// library's retry on HTTP 429.
fn build_client(http: &reqwest::Client, api_key: &str, base_url: &str) -> Client<OpenAIConfig> {
    let config = OpenAIConfig::new()
        .with_api_key(api_key)
        .with_api_base(base_url.trim_end_matches('/'));
    let no_retry = ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build();
    Client::with_config(config)
        .with_http_client(http.clone())
        .with_backoff(no_retry)
}

#[async_trait]
impl LanguageModel for OpenAi {
    fn name(&self) -> &'static str {
        NAME
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(map_error)?;
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(0.0)
            .messages([message.into()])
            .build()
            .map_err(map_error)?;

        let response = self.client.chat().create(request).await.map_err(map_error)?;
        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| LlmError::Malformed {
                provider: NAME,
                detail: "missing choices[0].message.content".to_string(),
            })
    }
}

fn map_error(err: OpenAIError) -> LlmError {
    match err {
        OpenAIError::Reqwest(e) => LlmError::from_reqwest(NAME, e),
        OpenAIError::ApiError(api) => classify_api_error(api.r#type.as_deref(), api.message),
        OpenAIError::InvalidArgument(detail) => LlmError::Request {
            provider: NAME,
            detail,
        },
        other => {
            let detail = other.to_string();
            if detail.contains("deserialize") {
                LlmError::Malformed {
                    provider: NAME,
                    detail,
                }
            } else {
                LlmError::Api {
                    provider: NAME,
                    detail,
                }
            }
        }
    }
}

fn classify_api_error(kind: Option<&str>, message: String) -> LlmError {
    let lower = message.to_lowercase();
    let kind = kind.unwrap_or_default();
    if kind == "authentication_error" || lower.contains("api key") {
        LlmError::Unauthorized {
            provider: NAME,
            detail: message,
        }
    } else if kind == "insufficient_quota" || lower.contains("rate limit") || lower.contains("quota") {
        LlmError::RateLimited {
            provider: NAME,
            detail: message,
        }
    } else {
        LlmError::Api {
            provider: NAME,
            detail: message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_key_message_is_authentication() {
        let err = classify_api_error(
            Some("invalid_request_error"),
            "Incorrect API key provided: sk-****".to_string(),
        );
        assert_eq!(err.kind(), "authentication");
    }

    #[test]
    fn quota_is_rate_limited() {
        let err = classify_api_error(
            Some("insufficient_quota"),
            "You exceeded your current quota".to_string(),
        );
        assert_eq!(err.kind(), "rate_limited");
    }

    #[test]
    fn other_api_errors_keep_message() {
        let err = classify_api_error(None, "The model `gpt-x` does not exist".to_string());
        assert_eq!(err.kind(), "upstream_error");
        assert!(err.to_string().contains("gpt-x"));
    }

    #[test]
    fn invalid_argument_is_request_error() {
        let err = map_error(OpenAIError::InvalidArgument("bad".to_string()));
        assert_eq!(err.kind(), "request");
    }

    use crate::llm::test_server;
    use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn completion(choices: Value) -> Value {
        json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1700000000,
            "model": "gpt-test",
            "choices": choices
        })
    }

    fn client(base: String) -> OpenAi {
        OpenAi::new(reqwest::Client::new(), "sk-test", "gpt-test").with_base_url(base)
    }

    #[tokio::test]
    async fn reads_first_choice_with_zero_temperature() {
        let app = Router::new().route(
            "/chat/completions",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["temperature"], 0.0);
                assert_eq!(body["model"], "gpt-test");
                assert_eq!(body["messages"][0]["content"], "prompt");
                Json(completion(json!([
                    {"index": 0, "message": {"role": "assistant", "content": "**Negative Themes:** heat"}, "finish_reason": "stop"},
                    {"index": 1, "message": {"role": "assistant", "content": "ignored"}, "finish_reason": "stop"}
                ])))
            }),
        );
        let base = test_server::spawn(app).await;
        assert_eq!(client(base).complete("prompt").await.unwrap(), "**Negative Themes:** heat");
    }

    #[tokio::test]
    async fn bad_key_is_authentication() {
        let app = Router::new().route(
            "/chat/completions",
            post(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"error": {
                        "message": "Incorrect API key provided: sk-test",
                        "type": "invalid_request_error",
                        "param": null,
                        "code": "invalid_api_key"
                    }})),
                )
            }),
        );
        let base = test_server::spawn(app).await;
        assert_eq!(client(base).complete("p").await.unwrap_err().kind(), "authentication");
    }

    #[tokio::test]
    async fn empty_choices_are_malformed() {
        let app = Router::new().route(
            "/chat/completions",
            post(|| async { Json(completion(json!([]))) }),
        );
        let base = test_server::spawn(app).await;
        assert_eq!(client(base).complete("p").await.unwrap_err().kind(), "malformed_response");
    }

    #[tokio::test]
    async fn rate_limit_is_not_retried() {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route(
                "/chat/completions",
                post(|State(hits): State<Arc<AtomicUsize>>| async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    (
                        StatusCode::TOO_MANY_REQUESTS,
                        Json(json!({"error": {
                            "message": "Rate limit reached for requests",
                            "type": "requests",
                            "param": null,
                            "code": "rate_limit_exceeded"
                        }})),
                    )
                }),
            )
            .with_state(hits.clone());
        let base = test_server::spawn(app).await;

        let result = tokio::time::timeout(Duration::from_secs(8), client(base).complete("p"))
            .await
            .expect("rate-limited call must return without retrying");
        assert_eq!(result.unwrap_err().kind(), "rate_limited");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
