//! Listing sessions: one live search results view per scrape run.
//!
//! The scrape loop only sees [`ListingSession`]. [`MapsSession`] implements it
//! for Google Maps on top of any [`BrowserActions`] page, and
//! [`ChromiumLauncher`] opens one backed by a fresh Chromium process.

use crate::error::Result;
use async_trait::async_trait;
use maplead_browser::{BrowserActions, BrowserEngine, BrowserPage};
use maplead_core::{BrowserConfig, ScrapingConfig};

/// CSS selectors for the Google Maps results and detail views.
pub mod selectors {
    /// Results panel; its presence means the search rendered
    pub const RESULTS_PANEL: &str = r#"[role="main"]"#;
    /// One listing card in the results feed
    pub const CARD: &str = r#"[role="article"]"#;
    /// Scrollable results feed
    pub const SCROLL_TARGET: &str = r#"[role="main"] [aria-label]"#;
    /// Business name in the detail header
    pub const NAME: &str = "h1 span";
    /// Address row
    pub const ADDRESS: &str = r#"[data-item-id="address"]"#;
    /// Phone row; the item id carries the number as a suffix
    pub const PHONE: &str = r#"[data-item-id^="phone"]"#;
    /// Website link
    pub const WEBSITE: &str = r#"a[data-item-id="authority"], [data-item-id="authority"] a"#;
    /// Star rating; the count is in its aria-label
    pub const RATING: &str = r#"span[aria-label*="stars"]"#;
}

/// Raw values read from one listing's detail view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingDetail {
    /// Business name from the detail header
    pub name: Option<String>,
    /// Address row text
    pub address: Option<String>,
    /// Phone row text
    pub phone: Option<String>,
    /// Website link target
    pub website: Option<String>,
    /// Unparsed rating label, e.g. `"4.5 stars"`
    pub rating_label: Option<String>,
    /// URL of the page while the detail is open
    pub url: String,
}

/// A results view the scrape loop walks through.
///
/// Cards are addressed by their position in the rendered feed, which only
/// grows as the feed is scrolled.
#[async_trait]
pub trait ListingSession: Send {
    /// Open the search and wait for the results panel
    async fn open_search(&mut self, url: &str) -> Result<()>;

    /// Number of cards currently rendered
    async fn card_count(&mut self) -> Result<usize>;

    /// Open the detail view of the card at `index`
    async fn open_card(&mut self, index: usize) -> Result<()>;

    /// Read the currently open detail view
    async fn read_detail(&mut self) -> Result<ListingDetail>;

    /// Scroll the results feed one step
    async fn scroll_results(&mut self) -> Result<()>;

    /// Release the session. Safe to call more than once.
    async fn close(&mut self) -> Result<()>;
}

/// Opens a fresh [`ListingSession`] for each run.
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    /// Acquire a new session
    async fn launch(&self) -> Result<Box<dyn ListingSession>>;
}

/// Google Maps session driven through a [`BrowserActions`] page.
pub struct MapsSession<A> {
    page: A,
    engine: Option<BrowserEngine>,
    panel_timeout_ms: u64,
    scroll_step_px: i64,
}

impl<A: BrowserActions> MapsSession<A> {
    /// Wrap a page. `engine`, when given, is closed with the session.
    pub fn new(page: A, engine: Option<BrowserEngine>, config: &ScrapingConfig) -> Self {
        Self {
            page,
            engine,
            panel_timeout_ms: config.results_panel_timeout_ms,
            scroll_step_px: config.scroll_step_px,
        }
    }
}

#[async_trait]
impl<A: BrowserActions> ListingSession for MapsSession<A> {
    async fn open_search(&mut self, url: &str) -> Result<()> {
        self.page.navigate(url).await?;
        self.page
            .wait_for_selector(selectors::RESULTS_PANEL, self.panel_timeout_ms)
            .await?;
        Ok(())
    }

    async fn card_count(&mut self) -> Result<usize> {
        Ok(self.page.count(selectors::CARD).await?)
    }

    async fn open_card(&mut self, index: usize) -> Result<()> {
        Ok(self.page.click_nth(selectors::CARD, index).await?)
    }

    async fn read_detail(&mut self) -> Result<ListingDetail> {
        Ok(ListingDetail {
            name: self.page.extract_text(selectors::NAME).await?,
            address: self.page.extract_text(selectors::ADDRESS).await?,
            phone: self.page.extract_text(selectors::PHONE).await?,
            website: self
                .page
                .extract_attribute(selectors::WEBSITE, "href")
                .await?,
            rating_label: self
                .page
                .extract_attribute(selectors::RATING, "aria-label")
                .await?,
            url: self.page.current_url().await?,
        })
    }

    async fn scroll_results(&mut self) -> Result<()> {
        let scrolled = self
            .page
            .scroll_by(selectors::SCROLL_TARGET, self.scroll_step_px)
            .await?;
        if !scrolled {
            tracing::debug!("No scrollable results feed found");
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(engine) = self.engine.take() {
            engine.close().await?;
        }
        Ok(())
    }
}

/// Launches a headless Chromium per run and opens a [`MapsSession`] on it.
#[derive(Debug, Clone)]
pub struct ChromiumLauncher {
    browser: BrowserConfig,
    scraping: ScrapingConfig,
}

impl ChromiumLauncher {
    /// Create a launcher from the browser and scraping settings
    #[must_use]
    pub fn new(browser: BrowserConfig, scraping: ScrapingConfig) -> Self {
        Self { browser, scraping }
    }
}

#[async_trait]
impl SessionLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Box<dyn ListingSession>> {
        let engine = BrowserEngine::launch(&self.browser).await?;
        let page = match engine.new_page().await {
            Ok(page) => page,
            Err(e) => {
                if let Err(close_err) = engine.close().await {
                    tracing::warn!("Failed to close browser after page error: {}", close_err);
                }
                return Err(e.into());
            }
        };
        Ok(Box::new(MapsSession::<BrowserPage>::new(
            page,
            Some(engine),
            &self.scraping,
        )))
    }
}
