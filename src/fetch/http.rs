//! Static HTTP retrieval with an explicit retry policy.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use reqwest::Client;
use tracing::warn;

/// Browser-like User-Agent; some storefronts serve bots an empty shell.
pub(crate) const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

const ACCEPT_LANGUAGE_VALUE: &str = "en,ar;q=0.9";

/// Retry policy wrapping the transport call: fixed number of attempts,
/// fixed wait between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    /// Two attempts total, one second apart.
    fn default() -> Self {
        Self {
            max_attempts: 2,
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no waiting.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::ZERO,
        }
    }
}

/// HTTP client with a fixed timeout and realistic browser headers.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    retry: RetryPolicy,
}

impl HttpClient {
    pub fn new(timeout: Duration, retry: RetryPolicy) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE));
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()
            .expect("Failed to create HTTP client");
        Self { client, retry }
    }

    /// GET a page as text. Transport failures and non-2xx statuses are
    /// retried per the policy; the last error surfaces once the attempt
    /// budget is spent.
    pub async fn get_text(&self, url: &str) -> Result<String, reqwest::Error> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_get(url).await {
                Ok(text) => return Ok(text),
                Err(err) if attempt < self.retry.max_attempts => {
                    warn!(
                        "GET {} failed (attempt {}/{}): {}",
                        url, attempt, self.retry.max_attempts, err
                    );
                    tokio::time::sleep(self.retry.delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn try_get(&self, url: &str) -> Result<String, reqwest::Error> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        response.text().await
    }
}
