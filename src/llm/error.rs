use thiserror::Error;

/// Failure of a single provider call, split by fault kind.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("{provider} request timed out")]
    Timeout { provider: &'static str },

    #[error("{provider} rejected the credentials: {detail}")]
    Unauthorized { provider: &'static str, detail: String },

    #[error("{provider} rate limit or quota exceeded: {detail}")]
    RateLimited { provider: &'static str, detail: String },

    #[error("{provider} API error: HTTP {status} - {detail}")]
    Status {
        provider: &'static str,
        status: u16,
        detail: String,
    },

    #[error("{provider} API error: {detail}")]
    Api { provider: &'static str, detail: String },

    #[error("{provider} returned an unexpected response: {detail}")]
    Malformed { provider: &'static str, detail: String },

    #[error("{provider} transport error: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} request could not be built: {detail}")]
    Request { provider: &'static str, detail: String },
}

impl LlmError {
    /// Short machine-readable label used in logs and analysis text.
    pub fn kind(&self) -> &'static str {
        match self {
            LlmError::Timeout { .. } => "timeout",
            LlmError::Unauthorized { .. } => "authentication",
            LlmError::RateLimited { .. } => "rate_limited",
            LlmError::Status { .. } => "upstream_status",
            LlmError::Api { .. } => "upstream_error",
            LlmError::Malformed { .. } => "malformed_response",
            LlmError::Transport { .. } => "transport",
            LlmError::Request { .. } => "request",
        }
    }

    pub fn from_reqwest(provider: &'static str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout { provider }
        } else if err.is_decode() {
            LlmError::Malformed {
                provider,
                detail: err.to_string(),
            }
        } else {
            LlmError::Transport { provider, source: err }
        }
    }

    /// Maps a non-success HTTP status and its body.
    pub fn from_status(provider: &'static str, status: u16, body: &str) -> Self {
        let detail = snippet(body);
        match status {
            401 | 403 => LlmError::Unauthorized { provider, detail },
            429 => LlmError::RateLimited { provider, detail },
            _ => LlmError::Status {
                provider,
                status,
                detail,
            },
        }
    }
}

/// Trims a response body to something fit for a log line.
pub fn snippet(body: &str) -> String {
    const MAX: usize = 300;
    let body = body.trim();
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}…", &body[..idx]),
        None => body.to_string(),
    }
}
