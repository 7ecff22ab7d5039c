use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::{LanguageModel, LlmError};

const NAME: &str = "groq";
const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Groq's OpenAI-compatible chat completions endpoint.
pub struct Groq {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl Groq {
    pub fn new(client: Client, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl LanguageModel for Groq {
    fn name(&self) -> &'static str {
        NAME
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let body = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": 0,
            "stream": false
        });

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let res = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::from_reqwest(NAME, e))?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let text = res.text().await.unwrap_or_default();
            return Err(LlmError::from_status(NAME, status, &text));
        }

        let v: Value = res.json().await.map_err(|e| LlmError::from_reqwest(NAME, e))?;
        match v["choices"][0]["message"]["content"].as_str() {
            Some(content) if !content.trim().is_empty() => Ok(content.to_string()),
            _ => Err(LlmError::Malformed {
                provider: NAME,
                detail: "missing choices[0].message.content".to_string(),
            }),
        }
    }
}
