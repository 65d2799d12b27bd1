//! maplead scraper - listing discovery, filtering and job control.
//!
//! This crate turns a search (keyword + location) into a stream of filtered
//! business [`Record`](maplead_core::Record)s and manages the single scrape job
//! the service runs at a time.
//!
//! # Layout
//!
//! - [`session`]: the `ListingSession` seam over a live results page, with the
//!   Google Maps implementation driven through `BrowserActions`
//! - [`scrape_loop`]: the scroll/extract/filter loop feeding a bounded channel
//! - [`controller`]: the job lifecycle (start, stop, status, results, export)
//! - [`filter`], [`parser`], [`url_builder`]: pure helpers used by the loop
//!
//! # Example
//!
//! ```rust,ignore
//! use maplead_scraper::{ChromiumLauncher, ControllerSettings, ScrapeController};
//! use maplead_export::XlsxExporter;
//! use std::sync::Arc;
//!
//! let controller = ScrapeController::new(
//!     Arc::new(ChromiumLauncher::new(config.browser.clone(), config.scraping.clone())),
//!     Arc::new(XlsxExporter::new(&config.export.output_path)),
//!     ControllerSettings::from(&config.scraping),
//! );
//!
//! let job_id = controller.start(params)?;
//! controller.wait().await;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod controller;
pub mod error;
pub mod filter;
pub mod parser;
pub mod scrape_loop;
pub mod session;
pub mod url_builder;

// Re-export commonly used types
pub use controller::{ControllerError, ControllerSettings, JobStatus, ScrapeController, StopOutcome};
pub use error::{Result, ScrapeError};
pub use filter::{accepts, rejection_reason, Rejection};
pub use parser::{build_record, parse_rating};
pub use scrape_loop::{run_scrape, LoopSettings, RunEnd, RunSummary};
pub use session::{ChromiumLauncher, ListingDetail, ListingSession, MapsSession, SessionLauncher};
pub use url_builder::build_search_url;
