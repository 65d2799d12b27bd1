//! Browser automation engine for map-search result pages.
//!
//! Provides headless Chromium control behind the [`BrowserActions`] trait so
//! callers only ever speak in selectors, clicks, reads and scrolls.

pub mod actions;
pub mod engine;
pub mod error;

pub use actions::BrowserActions;
pub use engine::{BrowserEngine, BrowserPage};
pub use error::{BrowserError, Result};
