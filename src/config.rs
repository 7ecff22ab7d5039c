use std::env;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid number in {var}: {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("unsupported value for {var}: {value:?} (expected one of {expected})")]
    Unsupported {
        var: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("REVIEW_SOURCE=live requires building with the `headless` feature")]
    HeadlessDisabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Fixture,
    Live,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    OpenAi,
    Groq,
}

impl Provider {
    /// Environment variable holding the provider's API key.
    pub fn key_var(self) -> &'static str {
        match self {
            Provider::Gemini => "GOOGLE_API_KEY",
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Groq => "GROQ_API_KEY",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Provider::Gemini => "gemini-2.5-flash",
            Provider::OpenAi => "gpt-4o-mini",
            Provider::Groq => "llama-3.1-8b-instant",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: Provider,
    pub model: String,
    /// `None` when the key variable is unset or blank.
    pub api_key: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub project_name: String,
    pub public_dir: String,
    pub source: SourceKind,
    pub fixture_delay: Duration,
    pub llm: LlmConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable lookup; `from_env` passes
    /// the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let source = match var("REVIEW_SOURCE").as_deref() {
            None | Some("fixture") => SourceKind::Fixture,
            Some("live") if cfg!(feature = "headless") => SourceKind::Live,
            Some("live") => return Err(ConfigError::HeadlessDisabled),
            Some(other) => {
                return Err(ConfigError::Unsupported {
                    var: "REVIEW_SOURCE",
                    value: other.to_string(),
                    expected: "fixture, live",
                })
            }
        };

        let provider = match var("LLM_PROVIDER").map(|v| v.to_lowercase()).as_deref() {
            None | Some("gemini") | Some("google") => Provider::Gemini,
            Some("openai") => Provider::OpenAi,
            Some("groq") => Provider::Groq,
            Some(other) => {
                return Err(ConfigError::Unsupported {
                    var: "LLM_PROVIDER",
                    value: other.to_string(),
                    expected: "gemini, openai, groq",
                })
            }
        };

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_number("PORT", var("PORT"), 8000)?,
            project_name: var("PROJECT_NAME").unwrap_or_else(|| "InsightEngine".to_string()),
            public_dir: var("PUBLIC_DIR").unwrap_or_else(|| "public".to_string()),
            source,
            fixture_delay: Duration::from_millis(parse_number(
                "FIXTURE_DELAY_MS",
                var("FIXTURE_DELAY_MS"),
                1500,
            )?),
            llm: LlmConfig {
                provider,
                model: var("LLM_MODEL").unwrap_or_else(|| provider.default_model().to_string()),
                api_key: var(provider.key_var()),
                timeout: Duration::from_secs(parse_number(
                    "LLM_TIMEOUT_SECS",
                    var("LLM_TIMEOUT_SECS"),
                    120,
                )?),
            },
        })
    }
}

fn parse_number<T: std::str::FromStr>(
    var: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { var, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults_without_any_variables() {
        let cfg = config_from(&[]).unwrap();
        assert_eq!(cfg.port, 8000);
        assert_eq!(cfg.project_name, "InsightEngine");
        assert_eq!(cfg.source, SourceKind::Fixture);
        assert_eq!(cfg.fixture_delay, Duration::from_millis(1500));
        assert_eq!(cfg.llm.provider, Provider::Gemini);
        assert_eq!(cfg.llm.model, "gemini-2.5-flash");
        assert!(cfg.llm.api_key.is_none());
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let cfg = config_from(&[("GOOGLE_API_KEY", "   ")]).unwrap();
        assert!(cfg.llm.api_key.is_none());
    }

    #[test]
    fn key_is_read_from_the_selected_provider() {
        let cfg = config_from(&[
            ("LLM_PROVIDER", "OpenAI"),
            ("GOOGLE_API_KEY", "g"),
            ("OPENAI_API_KEY", "sk-test"),
        ])
        .unwrap();
        assert_eq!(cfg.llm.provider, Provider::OpenAi);
        assert_eq!(cfg.llm.api_key.as_deref(), Some("sk-test"));
        assert_eq!(cfg.llm.model, "gpt-4o-mini");
    }

    #[test]
    fn model_override_wins() {
        let cfg = config_from(&[("LLM_PROVIDER", "groq"), ("LLM_MODEL", "mixtral")]).unwrap();
        assert_eq!(cfg.llm.model, "mixtral");
    }

    #[test]
    fn rejects_bad_port() {
        let err = config_from(&[("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { var: "PORT", .. }));
    }

    #[test]
    fn rejects_unknown_provider() {
        let err = config_from(&[("LLM_PROVIDER", "llama")]).unwrap_err();
        assert!(matches!(err, ConfigError::Unsupported { var: "LLM_PROVIDER", .. }));
    }

    #[cfg(not(feature = "headless"))]
    #[test]
    fn live_source_needs_headless_feature() {
        let err = config_from(&[("REVIEW_SOURCE", "live")]).unwrap_err();
        assert!(matches!(err, ConfigError::HeadlessDisabled));
    }
}
