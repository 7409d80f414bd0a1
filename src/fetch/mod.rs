//! Two-tier page fetching: static HTTP with a rendered-browser fallback.
//!
//! No error crosses this module's boundary during a run: every failure
//! path logs the URL and the reason, then resolves to an empty string.

pub mod browser;
pub mod http;

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tracing::{error, info};

use crate::extract::price;
pub use browser::{BrowserFetcher, RenderConfig};
pub use http::{HttpClient, RetryPolicy};

/// Static responses shorter than this look like a client-side app shell.
const THIN_HTML_BYTES: usize = 30_000;

/// Pre-fetch jitter bounds.
const JITTER_MIN_MS: u64 = 200;
const JITTER_MAX_MS: u64 = 800;

/// Fixed request timeout for static fetches.
const STATIC_TIMEOUT: Duration = Duration::from_secs(20);

/// How pages are fetched for the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    /// Plain HTTP GET only.
    Static,
    /// Render every page in a headless browser.
    Rendered,
    /// Static first; rendered when the static result looks incomplete.
    #[default]
    AutoWithFallback,
}

/// Fetch failure taxonomy.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, timeout or non-2xx on the static path, after the
    /// retry budget was exhausted.
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    /// Navigation or capture failure on the rendered path.
    #[error("render failure: {0}")]
    Render(#[source] anyhow::Error),
}

/// Decide whether a static response warrants a rendered second pass:
/// suspiciously thin, or no price-like text anywhere.
pub fn needs_render(html: &str) -> bool {
    html.len() < THIN_HTML_BYTES || !price::has_price(html)
}

/// Pseudo-random delay within the fixed jitter range, to avoid request
/// bursts. Seeded from the clock, like the user-agent rotation.
fn jitter_delay() -> Duration {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    Duration::from_millis(JITTER_MIN_MS + nanos % (JITTER_MAX_MS - JITTER_MIN_MS + 1))
}

/// Page fetcher bound to one mode for the whole run.
pub struct Fetcher {
    mode: FetchMode,
    http: HttpClient,
    browser: BrowserFetcher,
}

impl Fetcher {
    pub fn new(mode: FetchMode) -> Self {
        Self::with_retry(mode, RetryPolicy::default())
    }

    /// Construct with an explicit retry policy (tests use
    /// [`RetryPolicy::none`]).
    pub fn with_retry(mode: FetchMode, retry: RetryPolicy) -> Self {
        Self {
            mode,
            http: HttpClient::new(STATIC_TIMEOUT, retry),
            browser: BrowserFetcher::new(RenderConfig::default()),
        }
    }

    /// Fetch a page according to the configured mode. Returns an empty
    /// string on unrecoverable failure; never propagates an error.
    pub async fn fetch_html(&self, url: &str) -> String {
        match self.mode {
            FetchMode::Static => self.fetch_static(url).await.unwrap_or_else(|e| {
                error!("Fetch failed for {}: {}", url, e);
                String::new()
            }),
            FetchMode::Rendered => self.fetch_rendered(url).await.unwrap_or_else(|e| {
                error!("Fetch failed for {}: {}", url, e);
                String::new()
            }),
            FetchMode::AutoWithFallback => self.fetch_auto(url).await,
        }
    }

    async fn fetch_static(&self, url: &str) -> Result<String, FetchError> {
        tokio::time::sleep(jitter_delay()).await;
        Ok(self.http.get_text(url).await?)
    }

    async fn fetch_rendered(&self, url: &str) -> Result<String, FetchError> {
        tokio::time::sleep(jitter_delay()).await;
        self.browser.fetch(url).await.map_err(FetchError::Render)
    }

    /// Static first. A static error falls through to the rendered path;
    /// a thin or price-free static result triggers a rendered attempt
    /// that replaces it only when strictly longer. Rendered failures in
    /// that secondary attempt are swallowed and the static result stands.
    async fn fetch_auto(&self, url: &str) -> String {
        let html = match self.fetch_static(url).await {
            Ok(html) => html,
            Err(e) => {
                info!("Static fetch failed for {}: {}. Falling back to rendered.", url, e);
                return self.fetch_rendered(url).await.unwrap_or_else(|e| {
                    error!("Fetch failed for {}: {}", url, e);
                    String::new()
                });
            }
        };

        if needs_render(&html) {
            info!("Static content looks thin or price-free for {}; trying rendered.", url);
            match self.fetch_rendered(url).await {
                Ok(rendered) if rendered.len() > html.len() => return rendered,
                Ok(_) => {}
                Err(e) => {
                    info!("Rendered fetch failed for {}: {}. Keeping static result.", url, e)
                }
            }
        }
        html
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_render_thin_html() {
        assert!(needs_render("<html>99 EGP</html>"));
    }

    #[test]
    fn test_needs_render_long_priceless_html() {
        let html = "x".repeat(THIN_HTML_BYTES + 1);
        assert!(needs_render(&html));
    }

    #[test]
    fn test_needs_render_false_for_long_priced_html() {
        let mut html = "x".repeat(THIN_HTML_BYTES);
        html.push_str("price: 150 EGP");
        assert!(!needs_render(&html));
    }

    #[test]
    fn test_jitter_within_bounds() {
        for _ in 0..100 {
            let d = jitter_delay();
            assert!(d >= Duration::from_millis(JITTER_MIN_MS));
            assert!(d <= Duration::from_millis(JITTER_MAX_MS));
        }
    }
}
