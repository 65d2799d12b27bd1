use crate::error::Result;

/// Browser actions for automation
///
/// Selectors are CSS selectors. Reads that find no matching element return
/// `Ok(None)` rather than an error; only engine failures are errors.
#[async_trait::async_trait]
pub trait BrowserActions: Send + Sync {
    /// Navigate to a URL and wait for the load event
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Wait for a selector to appear
    async fn wait_for_selector(&self, selector: &str, timeout_ms: u64) -> Result<()>;

    /// Count the elements currently matching a selector
    async fn count(&self, selector: &str) -> Result<usize>;

    /// Click the element at `index` among the matches of a selector
    async fn click_nth(&self, selector: &str, index: usize) -> Result<()>;

    /// Extract the text of the first matching element
    async fn extract_text(&self, selector: &str) -> Result<Option<String>>;

    /// Extract an attribute of the first matching element
    async fn extract_attribute(&self, selector: &str, attribute: &str) -> Result<Option<String>>;

    /// Scroll the first matching element vertically.
    ///
    /// Returns `false` when nothing matched and no scroll happened.
    async fn scroll_by(&self, selector: &str, delta_y: i64) -> Result<bool>;

    /// URL of the page as currently displayed
    async fn current_url(&self) -> Result<String>;
}

/// JavaScript function body that scrolls `this` by `delta_y` pixels.
pub fn scroll_function(delta_y: i64) -> String {
    format!("function() {{ this.scrollBy(0, {delta_y}); }}")
}

/// Trim extracted text, mapping blank text to `None`.
pub fn normalize_text(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}
