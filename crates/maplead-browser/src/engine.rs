use crate::actions::{normalize_text, scroll_function, BrowserActions};
use crate::error::{BrowserError, Result};
use chromiumoxide::browser::{Browser, BrowserConfig as ChromeConfig};
use chromiumoxide::element::Element;
use chromiumoxide::Page;
use futures::stream::StreamExt;
use maplead_core::BrowserConfig;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// Interval between selector polls while waiting
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Browser automation engine
///
/// Owns one Chromium process and the task draining its DevTools events.
/// Call [`BrowserEngine::close`] to shut the process down; dropping the engine
/// only stops the event task.
pub struct BrowserEngine {
    browser: Browser,
    handler_task: JoinHandle<()>,
}

impl BrowserEngine {
    /// Launch a browser with the given configuration
    pub async fn launch(config: &BrowserConfig) -> Result<Self> {
        let mut builder = ChromeConfig::builder()
            .no_sandbox()
            .window_size(config.window_width, config.window_height)
            .request_timeout(Duration::from_secs(config.request_timeout_secs))
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg(format!("--user-agent={}", config.user_agent));

        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &config.executable_path {
            builder = builder.chrome_executable(path);
        }

        let chrome_config = builder.build().map_err(BrowserError::ChromiumError)?;

        let (browser, mut handler) = Browser::launch(chrome_config)
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("browser handler error: {}", e);
                }
            }
        });

        tracing::debug!(headless = config.headless, "browser launched");

        Ok(Self {
            browser,
            handler_task,
        })
    }

    /// Open a blank page in this browser
    pub async fn new_page(&self) -> Result<BrowserPage> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;
        Ok(BrowserPage { page })
    }

    /// Close the browser and wait for the process to exit
    pub async fn close(mut self) -> Result<()> {
        let result = self
            .browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| BrowserError::ChromiumError(e.to_string()));

        if let Err(e) = self.browser.wait().await {
            tracing::warn!("Browser process did not exit cleanly: {}", e);
        }
        self.handler_task.abort();

        tracing::debug!("browser closed");
        result
    }
}

impl Drop for BrowserEngine {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}

/// A single tab driven through [`BrowserActions`]
pub struct BrowserPage {
    page: Page,
}

impl BrowserPage {
    async fn find_all(&self, selector: &str) -> Result<Vec<Element>> {
        self.page
            .find_elements(selector)
            .await
            .map_err(|e| BrowserError::ChromiumError(format!("query '{selector}': {e}")))
    }

    async fn find_first(&self, selector: &str) -> Result<Option<Element>> {
        Ok(self.find_all(selector).await?.into_iter().next())
    }
}

#[async_trait::async_trait]
impl BrowserActions for BrowserPage {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| BrowserError::NavigationError(format!("{url}: {e}")))?;
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str, timeout_ms: u64) -> Result<()> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            if self.count(selector).await? > 0 {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::Timeout(format!(
                    "'{selector}' did not appear within {timeout_ms} ms"
                )));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn count(&self, selector: &str) -> Result<usize> {
        Ok(self.find_all(selector).await?.len())
    }

    async fn click_nth(&self, selector: &str, index: usize) -> Result<()> {
        let elements = self.find_all(selector).await?;
        let element = elements
            .get(index)
            .ok_or_else(|| BrowserError::SelectorNotFound(format!("{selector} #{index}")))?;
        element
            .click()
            .await
            .map_err(|e| BrowserError::ChromiumError(format!("click '{selector}' #{index}: {e}")))?;
        Ok(())
    }

    async fn extract_text(&self, selector: &str) -> Result<Option<String>> {
        let Some(element) = self.find_first(selector).await? else {
            return Ok(None);
        };
        let text = element
            .inner_text()
            .await
            .map_err(|e| BrowserError::ChromiumError(format!("text of '{selector}': {e}")))?;
        Ok(normalize_text(text))
    }

    async fn extract_attribute(&self, selector: &str, attribute: &str) -> Result<Option<String>> {
        let Some(element) = self.find_first(selector).await? else {
            return Ok(None);
        };
        let value = element.attribute(attribute).await.map_err(|e| {
            BrowserError::ChromiumError(format!("attribute '{attribute}' of '{selector}': {e}"))
        })?;
        Ok(normalize_text(value))
    }

    async fn scroll_by(&self, selector: &str, delta_y: i64) -> Result<bool> {
        let Some(element) = self.find_first(selector).await? else {
            return Ok(false);
        };
        element
            .call_js_fn(scroll_function(delta_y), false)
            .await
            .map_err(|e| BrowserError::ChromiumError(format!("scroll '{selector}': {e}")))?;
        Ok(true)
    }

    async fn current_url(&self) -> Result<String> {
        self.page
            .url()
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?
            .ok_or_else(|| BrowserError::NavigationError("page has no URL".to_string()))
    }
}
