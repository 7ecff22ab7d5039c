//! Review sources.
//!
//! A [`ReviewSource`] turns a product identifier into an ordered list of raw
//! review texts. Sources never fail: unknown identifiers and internal faults
//! both come back as an empty list.

mod fixture;
#[cfg(feature = "headless")]
mod live;

pub use fixture::FixtureSource;
#[cfg(feature = "headless")]
pub use live::LiveSource;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

const OLD_REDDIT: &str = "https://old.reddit.com";

/// Identifier rejected before fetching. The message is shown to the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct InvalidIdentifier(pub &'static str);

#[async_trait]
pub trait ReviewSource: Send + Sync {
    /// Source name for logging.
    fn name(&self) -> &'static str;

    /// Normalizes client input into the identifier handed to [`fetch`](Self::fetch).
    fn prepare(&self, raw: &str) -> Result<String, InvalidIdentifier> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(InvalidIdentifier("Error: No product identifier provided."));
        }
        Ok(trimmed.to_string())
    }

    async fn fetch(&self, identifier: &str) -> Vec<String>;
}

/// Rewrites a reddit thread reference to its `old.reddit.com` form.
///
/// Accepts full URLs on any `reddit.com` host and bare paths such as
/// `/r/laptops/comments/abc/`. Returns `None` for anything else.
pub fn canonical_thread_url(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.starts_with('/') {
        return Some(format!("{OLD_REDDIT}{raw}"));
    }

    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    };
    let mut url = Url::parse(&with_scheme).ok()?;
    let host = url.host_str()?.to_ascii_lowercase();
    if host != "reddit.com" && !host.ends_with(".reddit.com") {
        return None;
    }
    url.set_scheme("https").ok()?;
    url.set_host(Some("old.reddit.com")).ok()?;
    Some(url.to_string())
}
