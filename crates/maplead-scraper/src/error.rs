//! Scrape error types.

use thiserror::Error;

/// Errors raised while driving a listing session.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The browser engine failed
    #[error("browser error: {0}")]
    Browser(#[from] maplead_browser::BrowserError),

    /// A detail view lacked a field every record needs
    #[error("listing detail is missing its {field}")]
    MissingField {
        /// Name of the missing field
        field: &'static str,
    },

    /// The controller stopped listening for records
    #[error("record receiver dropped before the run finished")]
    ReceiverDropped,
}

/// Result type alias for scrape operations.
pub type Result<T> = std::result::Result<T, ScrapeError>;
