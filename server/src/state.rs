//! Application state shared by all handlers.

use maplead_scraper::ScrapeController;
use std::sync::Arc;

/// State handed to every route.
#[derive(Clone)]
pub struct AppState {
    /// The single job controller for this process
    pub controller: Arc<ScrapeController>,
}

impl AppState {
    /// Wrap a controller.
    pub fn new(controller: Arc<ScrapeController>) -> Self {
        Self { controller }
    }
}
