//! Headless Chrome backend for `PageDriver`, built on chromiumoxide.
//!
//! Each `launch` starts a fresh browser process with one tab. The CDP
//! handler runs on its own task and is aborted when the session closes.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as ChromeConfig};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{PageDriver, PageSession};
use crate::config::BrowserConfig;

/// Poll interval while waiting for a selector to appear.
const POLL: Duration = Duration::from_millis(250);

pub struct ChromeDriver {
    config: BrowserConfig,
}

impl ChromeDriver {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }

    fn chrome_config(&self) -> Result<ChromeConfig> {
        let mut builder = ChromeConfig::builder()
            .window_size(self.config.window_width, self.config.window_height)
            .args(launch_args(&self.config));
        if !self.config.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &self.config.chrome_path {
            builder = builder.chrome_executable(path);
        }
        builder
            .build()
            .map_err(|e| anyhow!("Invalid browser configuration: {e}"))
    }
}

/// Extra command-line flags passed to Chrome.
pub fn launch_args(config: &BrowserConfig) -> Vec<String> {
    let mut args = vec![
        "--no-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-gpu".to_string(),
        format!("--window-size={},{}", config.window_width, config.window_height),
    ];
    if !config.user_agent.is_empty() {
        args.push(format!("--user-agent={}", config.user_agent));
    }
    args
}

#[async_trait]
impl PageDriver for ChromeDriver {
    async fn launch(&self) -> Result<Box<dyn PageSession>> {
        let (mut browser, mut handler) = Browser::launch(self.chrome_config()?)
            .await
            .context("Failed to launch Chrome")?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.close().await;
                handler.abort();
                return Err(anyhow!("Failed to open browser tab: {e}"));
            }
        };

        if !self.config.user_agent.is_empty() {
            let ua = SetUserAgentOverrideParams::new(self.config.user_agent.clone());
            if let Err(e) = page.set_user_agent(ua).await {
                warn!(error = %e, "User agent override rejected");
            }
        }

        debug!(headless = self.config.headless, "Browser session started");
        Ok(Box::new(ChromeSession {
            browser,
            page: Some(page),
            handler,
        }))
    }
}

struct ChromeSession {
    browser: Browser,
    page: Option<Page>,
    handler: JoinHandle<()>,
}

impl ChromeSession {
    fn page(&self) -> Result<&Page> {
        self.page.as_ref().ok_or_else(|| anyhow!("Browser session already closed"))
    }
}

#[async_trait]
impl PageSession for ChromeSession {
    async fn goto(&mut self, url: &str) -> Result<()> {
        self.page()?
            .goto(url)
            .await
            .with_context(|| format!("Navigation to {url} failed"))?;
        Ok(())
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<()> {
        let page = self.page()?;
        let found = tokio::time::timeout(timeout, async {
            loop {
                if page.find_element(selector).await.is_ok() {
                    return;
                }
                tokio::time::sleep(POLL).await;
            }
        })
        .await;
        found.map_err(|_| anyhow!("Timed out after {timeout:?} waiting for {selector:?}"))
    }

    async fn click(&mut self, selector: &str) -> Result<()> {
        let element = self
            .page()?
            .find_element(selector)
            .await
            .with_context(|| format!("Element {selector:?} not found"))?;
        element.scroll_into_view().await?;
        element
            .click()
            .await
            .with_context(|| format!("Click on {selector:?} failed"))?;
        Ok(())
    }

    async fn html(&mut self) -> Result<String> {
        self.page()?
            .content()
            .await
            .context("Failed to read page content")
    }

    async fn close(&mut self) -> Result<()> {
        let Some(page) = self.page.take() else {
            return Ok(());
        };
        if let Err(e) = page.close().await {
            debug!(error = %e, "Tab close failed, closing browser anyway");
        }
        let closed = self.browser.close().await;
        let _ = self.browser.wait().await;
        self.handler.abort();
        closed.context("Failed to close Chrome")?;
        Ok(())
    }
}
