//! In-memory listing feed shared by the scrape loop and controller tests.

#![allow(dead_code)]

use async_trait::async_trait;
use maplead_browser::BrowserError;
use maplead_core::{FilterConfig, JobParameters};
use maplead_scraper::{
    ListingDetail, ListingSession, LoopSettings, Result, ScrapeError, SessionLauncher,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

/// One card in the fake feed.
#[derive(Debug, Clone)]
pub enum FakeCard {
    Listing(ListingDetail),
    /// Detail view never renders
    Broken,
}

pub fn listing(name: &str, phone: Option<&str>, website: Option<&str>, rating: Option<&str>) -> FakeCard {
    FakeCard::Listing(ListingDetail {
        name: Some(name.to_string()),
        address: Some(format!("{name} address")),
        phone: phone.map(ToString::to_string),
        website: website.map(ToString::to_string),
        rating_label: rating.map(ToString::to_string),
        url: format!("https://www.google.com/maps/place/{}", name.replace(' ', "+")),
    })
}

/// `count` listings named "Cafe 1".."Cafe N", all with phone and website.
pub fn cafes(count: usize) -> Vec<FakeCard> {
    (1..=count)
        .map(|i| {
            listing(
                &format!("Cafe {i}"),
                Some("+1 206-555-0100"),
                Some("https://cafe.example"),
                Some("4.5 stars"),
            )
        })
        .collect()
}

/// A results feed that reveals `per_scroll` more cards on every scroll.
#[derive(Debug, Clone, Default)]
pub struct FakeFeed {
    pub cards: Vec<FakeCard>,
    pub initial: usize,
    pub per_scroll: usize,
    pub fail_launch: bool,
    /// The first this-many launches panic
    pub panic_launches: usize,
    /// Opening the search waits for a permit when set
    pub search_gate: Option<Arc<Semaphore>>,
    pub fail_open_search: bool,
    /// Card enumeration fails after this many successful calls
    pub fail_card_count_after: Option<usize>,
    /// Scrolls wait for a permit when set
    pub scroll_gate: Option<Arc<Semaphore>>,
    /// Fires once this many cards have been opened
    pub cancel_after_opens: Option<(usize, CancellationToken)>,
}

impl FakeFeed {
    pub fn all_visible(cards: Vec<FakeCard>) -> Self {
        Self {
            initial: cards.len(),
            cards,
            ..Self::default()
        }
    }

    pub fn paged(cards: Vec<FakeCard>, initial: usize, per_scroll: usize) -> Self {
        Self {
            cards,
            initial,
            per_scroll,
            ..Self::default()
        }
    }
}

/// Counters observed by tests.
#[derive(Debug, Default)]
pub struct Observed {
    pub launches: AtomicUsize,
    pub closes: AtomicUsize,
    pub scrolls_started: AtomicUsize,
    pub searches: Mutex<Vec<String>>,
}

impl Observed {
    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn scrolls_started(&self) -> usize {
        self.scrolls_started.load(Ordering::SeqCst)
    }

    pub fn searches(&self) -> Vec<String> {
        self.searches.lock().expect("searches lock poisoned").clone()
    }
}

pub struct FakeLauncher {
    pub feed: FakeFeed,
    pub observed: Arc<Observed>,
}

impl FakeLauncher {
    pub fn new(feed: FakeFeed) -> Self {
        Self {
            feed,
            observed: Arc::new(Observed::default()),
        }
    }
}

#[async_trait]
impl SessionLauncher for FakeLauncher {
    async fn launch(&self) -> Result<Box<dyn ListingSession>> {
        let previous = self.observed.launches.fetch_add(1, Ordering::SeqCst);
        assert!(previous >= self.feed.panic_launches, "launcher exploded");
        if self.feed.fail_launch {
            return Err(BrowserError::ChromiumError("no chrome binary".to_string()).into());
        }
        Ok(Box::new(FakeSession {
            feed: self.feed.clone(),
            observed: Arc::clone(&self.observed),
            scrolls: 0,
            count_calls: 0,
            opened: 0,
            current: None,
            closed: false,
        }))
    }
}

struct FakeSession {
    feed: FakeFeed,
    observed: Arc<Observed>,
    scrolls: usize,
    count_calls: usize,
    opened: usize,
    current: Option<usize>,
    closed: bool,
}

impl FakeSession {
    fn visible(&self) -> usize {
        (self.feed.initial + self.scrolls * self.feed.per_scroll).min(self.feed.cards.len())
    }
}

#[async_trait]
impl ListingSession for FakeSession {
    async fn open_search(&mut self, url: &str) -> Result<()> {
        self.observed
            .searches
            .lock()
            .expect("searches lock poisoned")
            .push(url.to_string());
        if let Some(gate) = &self.feed.search_gate {
            gate.acquire()
                .await
                .expect("search gate closed")
                .forget();
        }
        if self.feed.fail_open_search {
            return Err(BrowserError::Timeout("results panel".to_string()).into());
        }
        Ok(())
    }

    async fn card_count(&mut self) -> Result<usize> {
        if self
            .feed
            .fail_card_count_after
            .is_some_and(|limit| self.count_calls >= limit)
        {
            return Err(BrowserError::ChromiumError("target crashed".to_string()).into());
        }
        self.count_calls += 1;
        Ok(self.visible())
    }

    async fn open_card(&mut self, index: usize) -> Result<()> {
        if index >= self.visible() {
            return Err(BrowserError::SelectorNotFound(format!("card #{index}")).into());
        }
        self.opened += 1;
        self.current = Some(index);
        if let Some((after, token)) = &self.feed.cancel_after_opens {
            if self.opened >= *after {
                token.cancel();
            }
        }
        Ok(())
    }

    async fn read_detail(&mut self) -> Result<ListingDetail> {
        let index = self.current.ok_or(ScrapeError::MissingField { field: "card" })?;
        match &self.feed.cards[index] {
            FakeCard::Listing(detail) => Ok(detail.clone()),
            FakeCard::Broken => Err(BrowserError::Timeout("detail view".to_string()).into()),
        }
    }

    async fn scroll_results(&mut self) -> Result<()> {
        self.observed.scrolls_started.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.feed.scroll_gate {
            gate.acquire()
                .await
                .expect("scroll gate closed")
                .forget();
        }
        self.scrolls += 1;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            self.observed.closes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

pub fn settings(stagnation_limit: u32) -> LoopSettings {
    LoopSettings {
        search_base_url: "https://www.google.com/maps/search/".to_string(),
        card_settle: Duration::ZERO,
        scroll_settle: Duration::ZERO,
        stagnation_limit,
    }
}

pub fn params(max_results: u32, filters: FilterConfig) -> JobParameters {
    JobParameters {
        business_keyword: "coffee shop".to_string(),
        location: "Seattle".to_string(),
        radius_km: 5,
        max_results,
        filters,
    }
}

/// Poll `cond` until it holds, panicking after a few seconds.
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
