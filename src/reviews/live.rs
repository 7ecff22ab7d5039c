//! Live scrape of a reddit discussion thread through headless Chromium.
//!
//! The page structure and the content-warning flow are not a stable contract;
//! any step that fails yields an empty review list.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::CookieParam;
use chromiumoxide::Page;
use futures_lite::StreamExt;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

use super::{canonical_thread_url, InvalidIdentifier, ReviewSource};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/109.0.0.0 Safari/537.36";

const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);
const WARNING_WAIT: Duration = Duration::from_secs(3);
const COMMENTS_WAIT: Duration = Duration::from_secs(10);
const POLL_INTERVAL: Duration = Duration::from_millis(250);

const COMMENT_AREA: &str = "div.sitetable.nestedlisting";
const COMMENT_BODY: &str = "div.sitetable.nestedlisting div.md";

// Clicks the interstitial's confirm button if one is rendered.
const DISMISS_WARNING_JS: &str = r#"
    (() => {
        const target = Array.from(document.querySelectorAll('button'))
            .find(b => b.name === 'yes' || b.textContent.trim() === 'Continue');
        if (!target) return false;
        target.click();
        return true;
    })()
"#;

#[derive(Debug, Clone, Copy, Default)]
pub struct LiveSource;

#[async_trait]
impl ReviewSource for LiveSource {
    fn name(&self) -> &'static str {
        "live"
    }

    fn prepare(&self, raw: &str) -> Result<String, InvalidIdentifier> {
        if raw.trim().is_empty() {
            return Err(InvalidIdentifier("Error: No product identifier provided."));
        }
        if !raw.contains("reddit.com") && !raw.trim_start().starts_with("/r/") {
            return Err(InvalidIdentifier("Error: Not a valid Reddit URL."));
        }
        canonical_thread_url(raw).ok_or(InvalidIdentifier("Error: Not a valid Reddit URL."))
    }

    async fn fetch(&self, identifier: &str) -> Vec<String> {
        info!(url = identifier, "scraping thread");
        match scrape(identifier).await {
            Ok(reviews) => {
                info!(count = reviews.len(), "scrape finished");
                reviews
            }
            Err(err) => {
                warn!(url = identifier, error = %err, "scrape failed, returning no reviews");
                Vec::new()
            }
        }
    }
}

/// Owns the browser for exactly one scrape and closes it on every path.
async fn scrape(url: &str) -> Result<Vec<String>> {
    let args = vec![
        "--disable-blink-features=AutomationControlled".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-gpu".to_string(),
        "--no-sandbox".to_string(),
        "--no-first-run".to_string(),
        format!("--user-agent={USER_AGENT}"),
    ];
    let config = BrowserConfig::builder()
        .args(args)
        .build()
        .map_err(|e| anyhow!("browser config error: {e}"))?;

    let (mut browser, mut handler) = Browser::launch(config)
        .await
        .context("failed to launch browser")?;
    let handle = tokio::spawn(async move { while handler.next().await.is_some() {} });

    let result = scrape_page(&browser, url).await;

    if let Err(err) = browser.close().await {
        debug!(error = %err, "browser close failed");
    }
    if let Err(err) = browser.wait().await {
        debug!(error = %err, "browser process wait failed");
    }
    handle.abort();

    result
}

async fn scrape_page(browser: &Browser, url: &str) -> Result<Vec<String>> {
    let page = browser
        .new_page("about:blank")
        .await
        .context("failed to create page")?;

    // Age gate
    let cookie = CookieParam::builder()
        .name("over18")
        .value("1")
        .domain(".reddit.com")
        .path("/")
        .build()
        .map_err(|e| anyhow!("cookie error: {e}"))?;
    page.set_cookie(cookie).await.context("failed to set cookie")?;

    timeout(NAVIGATION_TIMEOUT, page.goto(url))
        .await
        .context("navigation timed out")?
        .context("navigation failed")?;

    dismiss_warning(&page).await;
    wait_for(&page, COMMENT_AREA, COMMENTS_WAIT).await?;

    if let Ok(Some(title)) = page.get_title().await {
        debug!(%title, "page loaded");
    }

    let mut reviews = Vec::new();
    for element in page.find_elements(COMMENT_BODY).await.context("comment lookup failed")? {
        if let Some(text) = element.inner_text().await? {
            let text = text.trim();
            if !text.is_empty() {
                reviews.push(text.to_string());
            }
        }
    }
    Ok(reviews)
}

async fn dismiss_warning(page: &Page) {
    let deadline = Instant::now() + WARNING_WAIT;
    while Instant::now() < deadline {
        let clicked = match page.evaluate(DISMISS_WARNING_JS).await {
            Ok(result) => result.into_value::<bool>().unwrap_or(false),
            Err(err) => {
                debug!(error = %err, "warning check failed");
                false
            }
        };
        if clicked {
            debug!("content warning dismissed");
            let _ = timeout(NAVIGATION_TIMEOUT, page.wait_for_navigation()).await;
            return;
        }
        sleep(POLL_INTERVAL).await;
    }
    debug!("no content warning");
}

async fn wait_for(page: &Page, selector: &str, limit: Duration) -> Result<()> {
    let deadline = Instant::now() + limit;
    loop {
        if page.find_element(selector).await.is_ok() {
            return Ok(());
        }
        if Instant::now() >= deadline {
            bail!("timed out after {limit:?} waiting for {selector}");
        }
        sleep(POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_rejects_non_reddit_input() {
        let err = LiveSource.prepare("https://www.amazon.com/dp/B0BX4B4158").unwrap_err();
        assert_eq!(err.0, "Error: Not a valid Reddit URL.");
    }

    #[test]
    fn prepare_canonicalizes_reddit_links() {
        assert_eq!(
            LiveSource
                .prepare("https://www.reddit.com/r/GamingLaptops/comments/xyz/legion/")
                .unwrap(),
            "https://old.reddit.com/r/GamingLaptops/comments/xyz/legion/"
        );
        assert_eq!(
            LiveSource.prepare("/r/GamingLaptops/comments/xyz/").unwrap(),
            "https://old.reddit.com/r/GamingLaptops/comments/xyz/"
        );
    }

    #[tokio::test]
    async fn unreachable_page_yields_no_reviews() {
        // Either the browser is missing or the port is closed; both must come back empty.
        let reviews = LiveSource.fetch("http://127.0.0.1:9/r/none").await;
        assert!(reviews.is_empty());
    }
}
