//! The scroll/extract/filter loop behind one scrape job.
//!
//! [`run_scrape`] walks the results feed top to bottom, opening each card once,
//! and sends every record that passes the job's filters into a bounded
//! channel. It ends when `max_results` records were sent, when the
//! cancellation token fires, or when scrolling stops producing new cards.

use crate::error::{Result, ScrapeError};
use crate::filter::rejection_reason;
use crate::parser::build_record;
use crate::session::{ListingSession, SessionLauncher};
use crate::url_builder::build_search_url;
use maplead_core::{JobParameters, Record, ScrapingConfig};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Timing and termination settings for the loop.
#[derive(Debug, Clone)]
pub struct LoopSettings {
    /// Prefix the search terms are appended to
    pub search_base_url: String,
    /// Pause between opening a card and reading it
    pub card_settle: Duration,
    /// Pause after each scroll
    pub scroll_settle: Duration,
    /// Consecutive unproductive scrolls before giving up
    pub stagnation_limit: u32,
}

impl From<&ScrapingConfig> for LoopSettings {
    fn from(config: &ScrapingConfig) -> Self {
        Self {
            search_base_url: config.search_base_url.clone(),
            card_settle: Duration::from_millis(config.card_settle_ms),
            scroll_settle: Duration::from_millis(config.scroll_settle_ms),
            stagnation_limit: config.stagnation_limit,
        }
    }
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunEnd {
    /// `max_results` records were sent
    MaxResults,
    /// The cancellation token fired
    Cancelled,
    /// Scrolling stopped revealing new cards
    Stagnated,
}

/// Counters for a finished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Records that passed the filters and were sent
    pub emitted: u32,
    /// Cards opened, including skipped and rejected ones
    pub cards_visited: usize,
    /// Scroll steps performed
    pub scrolls: u32,
    /// Why the run ended
    pub end: RunEnd,
}

impl RunSummary {
    fn new() -> Self {
        Self {
            emitted: 0,
            cards_visited: 0,
            scrolls: 0,
            end: RunEnd::Cancelled,
        }
    }
}

/// Run one scrape from launch to close.
///
/// Accepted records go to `tx` in visitation order. The session is closed
/// before returning on every path; a close failure is only logged.
///
/// # Errors
/// Launch, navigation, card enumeration and scroll failures end the run.
/// Failures while reading a single card are logged and the card is skipped.
pub async fn run_scrape(
    launcher: &dyn SessionLauncher,
    params: &JobParameters,
    settings: &LoopSettings,
    cancel: &CancellationToken,
    tx: mpsc::Sender<Record>,
) -> Result<RunSummary> {
    if cancel.is_cancelled() {
        tracing::info!("Scrape cancelled before launch");
        return Ok(RunSummary::new());
    }

    let url = build_search_url(
        &settings.search_base_url,
        &params.business_keyword,
        &params.location,
    );
    tracing::info!(
        keyword = %params.business_keyword,
        location = %params.location,
        max_results = params.max_results,
        "Starting scrape: {}",
        url
    );
    if params.radius_km > 0 {
        tracing::debug!(radius_km = params.radius_km, "Radius is not applied to map searches");
    }

    let mut session = launcher.launch().await?;
    let result = drive(session.as_mut(), &url, params, settings, cancel, &tx).await;

    if let Err(e) = session.close().await {
        tracing::warn!("Failed to close listing session: {}", e);
    }

    match &result {
        Ok(summary) => tracing::info!(
            emitted = summary.emitted,
            cards = summary.cards_visited,
            scrolls = summary.scrolls,
            end = ?summary.end,
            "Scrape finished"
        ),
        Err(e) => tracing::error!("Scrape failed: {}", e),
    }
    result
}

async fn drive(
    session: &mut dyn ListingSession,
    url: &str,
    params: &JobParameters,
    settings: &LoopSettings,
    cancel: &CancellationToken,
    tx: &mpsc::Sender<Record>,
) -> Result<RunSummary> {
    session.open_search(url).await?;

    let mut summary = RunSummary::new();
    let mut last_count = 0usize;
    let mut stagnant_scrolls = 0u32;

    summary.end = loop {
        if summary.emitted >= params.max_results {
            break RunEnd::MaxResults;
        }
        if cancel.is_cancelled() {
            break RunEnd::Cancelled;
        }

        let count = session.card_count().await?;
        if summary.scrolls > 0 {
            if count > last_count {
                stagnant_scrolls = 0;
            } else {
                stagnant_scrolls += 1;
            }
        }
        last_count = count;
        if stagnant_scrolls >= settings.stagnation_limit {
            break RunEnd::Stagnated;
        }

        tracing::debug!(count, visited = summary.cards_visited, "Cards rendered");
        while summary.cards_visited < count && summary.emitted < params.max_results {
            let index = summary.cards_visited;
            summary.cards_visited += 1;

            let record = match extract_card(session, index, &params.location, settings).await {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!(index, "Skipping card: {}", e);
                    continue;
                }
            };
            if let Some(reason) = rejection_reason(&record, &params.filters) {
                tracing::debug!(index, name = ?record.name, %reason, "Card filtered out");
                continue;
            }

            tracing::debug!(index, name = ?record.name, "Card accepted");
            tx.send(record)
                .await
                .map_err(|_| ScrapeError::ReceiverDropped)?;
            summary.emitted += 1;
        }

        if summary.emitted >= params.max_results {
            break RunEnd::MaxResults;
        }
        if cancel.is_cancelled() {
            break RunEnd::Cancelled;
        }

        session.scroll_results().await?;
        summary.scrolls += 1;
        tokio::time::sleep(settings.scroll_settle).await;
    };

    Ok(summary)
}

async fn extract_card(
    session: &mut dyn ListingSession,
    index: usize,
    location: &str,
    settings: &LoopSettings,
) -> Result<Record> {
    session.open_card(index).await?;
    tokio::time::sleep(settings.card_settle).await;
    let detail = session.read_detail().await?;
    build_record(detail, location)
}
