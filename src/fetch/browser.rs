//! Rendered fetching via a headless Chromium session.
//!
//! Each fetch launches an isolated session, navigates, waits a fixed
//! settle delay for client-side rendering, captures the DOM, and tears
//! the session down whatever the navigation outcome.

use std::time::Duration;

use anyhow::Result;

#[cfg(feature = "browser")]
use std::path::PathBuf;

#[cfg(feature = "browser")]
use anyhow::Context;
#[cfg(feature = "browser")]
use chromiumoxide::{Browser, BrowserConfig};
#[cfg(feature = "browser")]
use futures::StreamExt;
#[cfg(feature = "browser")]
use tracing::info;

/// Rendered-fetch settings.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Navigation timeout.
    pub timeout: Duration,
    /// Settle delay after navigation, allowing scripts to fill the page.
    pub settle: Duration,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            settle: Duration::from_millis(1200),
        }
    }
}

/// Per-call headless session fetcher.
#[cfg(feature = "browser")]
pub struct BrowserFetcher {
    config: RenderConfig,
}

#[cfg(feature = "browser")]
impl BrowserFetcher {
    /// Common Chrome executable paths to check.
    const CHROME_PATHS: &'static [&'static str] = &[
        // Linux
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        // macOS
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        // Common install locations
        "/opt/google/chrome/google-chrome",
    ];

    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Find a Chrome executable.
    fn find_chrome() -> Result<PathBuf> {
        for path in Self::CHROME_PATHS {
            let p = std::path::Path::new(path);
            if p.exists() {
                return Ok(p.to_path_buf());
            }
        }

        for cmd in &[
            "google-chrome",
            "google-chrome-stable",
            "chromium",
            "chromium-browser",
        ] {
            if let Ok(output) = std::process::Command::new("which").arg(cmd).output() {
                if output.status.success() {
                    let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                    if !path.is_empty() {
                        return Ok(PathBuf::from(path));
                    }
                }
            }
        }

        Err(anyhow::anyhow!(
            "Chrome/Chromium not found. Please install it:\n\
             - Arch/Manjaro: sudo pacman -S chromium\n\
             - Ubuntu/Debian: sudo apt install chromium-browser\n\
             - Fedora: sudo dnf install chromium\n\
             - Or download from: https://www.google.com/chrome/"
        ))
    }

    /// Launch a session, render `url`, and return the DOM serialization.
    pub async fn fetch(&self, url: &str) -> Result<String> {
        let chrome_path = Self::find_chrome()?;
        info!("Launching headless browser for {}", url);

        let config = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .arg(format!("--user-agent={}", super::http::USER_AGENT))
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-background-networking")
            .arg("--no-sandbox") // Often needed for headless in containers/restricted environments
            .arg("--disable-gpu") // Recommended for headless
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build browser config: {}", e))?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .context("Failed to launch browser")?;

        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        // The session must come down whatever navigation did.
        let result = self.render(&browser, url).await;
        let _ = browser.close().await;
        let _ = browser.wait().await;
        handler_task.abort();

        result
    }

    async fn render(&self, browser: &Browser, url: &str) -> Result<String> {
        let page = tokio::time::timeout(self.config.timeout, browser.new_page(url))
            .await
            .context("Navigation timed out")?
            .context("Navigation failed")?;
        tokio::time::sleep(self.config.settle).await;
        page.content().await.context("Failed to capture page content")
    }
}

// Stub for when browser feature is disabled
#[cfg(not(feature = "browser"))]
pub struct BrowserFetcher;

#[cfg(not(feature = "browser"))]
impl BrowserFetcher {
    pub fn new(_config: RenderConfig) -> Self {
        Self
    }

    pub async fn fetch(&self, _url: &str) -> Result<String> {
        Err(anyhow::anyhow!(
            "Browser support not compiled. Rebuild with: cargo build --features browser"
        ))
    }
}
