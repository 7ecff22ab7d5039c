//! Review summarization through a hosted language model.
//!
//! [`Summarizer`] is built once at startup from [`LlmConfig`]. A provider whose
//! API key is missing becomes [`Summarizer::Unavailable`] instead of failing
//! startup, and every provider failure is folded into the returned text.

mod error;
mod gemini;
mod groq;
mod openai;
pub mod prompt;

pub use error::LlmError;
pub use gemini::Gemini;
pub use groq::Groq;
pub use openai::OpenAi;

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::config::{LlmConfig, Provider};

pub const NO_INPUT: &str = "No reviews provided to analyze.";

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &'static str;

    fn model(&self) -> &str;

    /// Sends one prompt with deterministic sampling and returns the generated text.
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

#[derive(Clone)]
pub enum Summarizer {
    /// The provider's key variable was not set.
    Unavailable { key_var: &'static str },
    Ready(Arc<dyn LanguageModel>),
}

impl Summarizer {
    pub fn from_config(cfg: &LlmConfig) -> Result<Self, reqwest::Error> {
        let Some(api_key) = cfg.api_key.clone() else {
            warn!(key = cfg.provider.key_var(), "API key not found, analysis will be mocked");
            return Ok(Summarizer::Unavailable {
                key_var: cfg.provider.key_var(),
            });
        };

        let http = reqwest::Client::builder().timeout(cfg.timeout).build()?;
        let model: Arc<dyn LanguageModel> = match cfg.provider {
            Provider::Gemini => Arc::new(Gemini::new(http, api_key, &cfg.model)),
            Provider::OpenAi => Arc::new(OpenAi::new(http, api_key, &cfg.model)),
            Provider::Groq => Arc::new(Groq::new(http, api_key, &cfg.model)),
        };
        info!(provider = model.name(), model = model.model(), "language model configured");
        Ok(Summarizer::Ready(model))
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Summarizer::Ready(_))
    }

    pub fn mock_analysis(key_var: &str) -> String {
        format!("--- MOCK ANALYSIS ({key_var} not found) ---")
    }

    /// Produces the analysis text. Never fails; errors become descriptive text.
    pub async fn summarize(&self, reviews: &[String]) -> String {
        if reviews.is_empty() {
            return NO_INPUT.to_string();
        }

        let model = match self {
            Summarizer::Unavailable { key_var } => {
                warn!(key = *key_var, "returning mock analysis");
                return Self::mock_analysis(key_var);
            }
            Summarizer::Ready(model) => model,
        };

        let prompt = prompt::render(reviews);
        info!(
            provider = model.name(),
            model = model.model(),
            count = reviews.len(),
            "sending reviews for analysis"
        );
        let started = Instant::now();
        match model.complete(&prompt).await {
            Ok(text) => {
                info!(elapsed_ms = started.elapsed().as_millis() as u64, "analysis complete");
                text
            }
            Err(err) => {
                error!(kind = err.kind(), error = %err, "analysis failed");
                format!("An error occurred during analysis ({}): {err}", err.kind())
            }
        }
    }
}
