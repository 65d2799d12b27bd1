//! Shared types used across maplead.
//!
//! These are plain value types: one extracted listing, the filter settings for
//! a job, the parameters a job is started with, and the lifecycle state the
//! controller reports.

use crate::error::{MapleadError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One extracted business listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Business name as shown in the detail header
    pub name: Option<String>,
    /// Phone number text
    pub phone: Option<String>,
    /// Street address text
    pub address: Option<String>,
    /// Website URL
    pub website: Option<String>,
    /// Star rating, 0 to 5
    pub rating: Option<f64>,
    /// Search area the listing was found under
    pub location: String,
    /// URL of the listing's detail view
    pub maps_url: String,
}

impl Record {
    /// Create a record with only the always-present fields set.
    #[must_use]
    pub fn new(location: impl Into<String>, maps_url: impl Into<String>) -> Self {
        Self {
            name: None,
            phone: None,
            address: None,
            website: None,
            rating: None,
            location: location.into(),
            maps_url: maps_url.into(),
        }
    }

    /// True when a non-blank phone number was extracted.
    #[must_use]
    pub fn has_phone(&self) -> bool {
        is_present(self.phone.as_deref())
    }

    /// True when a non-blank website was extracted.
    #[must_use]
    pub fn has_website(&self) -> bool {
        is_present(self.website.as_deref())
    }
}

fn is_present(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

/// Inclusion rules applied to every record of one job.
///
/// All flags default to `false` and `min_rating` to `0.0`, which accepts
/// everything. `no_website_only` and `with_website_only` are not checked for
/// exclusivity; setting both rejects every record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct FilterConfig {
    /// Reject records without a phone number
    pub require_phone: bool,
    /// Reject records that have a website
    pub no_website_only: bool,
    /// Reject records without a website
    pub with_website_only: bool,
    /// Reject records whose name marks them permanently closed
    pub exclude_closed: bool,
    /// Minimum rating; `0.0` disables the check
    pub min_rating: f64,
}

impl FilterConfig {
    /// True when no rule is active.
    #[must_use]
    pub fn is_passthrough(&self) -> bool {
        !self.require_phone
            && !self.no_website_only
            && !self.with_website_only
            && !self.exclude_closed
            && self.min_rating <= 0.0
    }

    /// Whether the export should carry a Website column.
    ///
    /// Website data is only exported when a website-related filter was applied.
    #[must_use]
    pub fn include_website_column(&self) -> bool {
        self.no_website_only || self.with_website_only
    }
}

/// Parameters for one scrape job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobParameters {
    /// What to search for, e.g. "coffee shop"
    pub business_keyword: String,
    /// Where to search, e.g. "Seattle"
    pub location: String,
    /// Search radius; accepted but not used by extraction
    #[serde(default)]
    pub radius_km: u32,
    /// Upper bound on accepted records
    pub max_results: u32,
    /// Inclusion rules
    #[serde(default)]
    pub filters: FilterConfig,
}

impl JobParameters {
    /// Check the parameters before a job is created.
    ///
    /// # Errors
    /// Returns `MapleadError::Validation` for an empty keyword or location,
    /// a zero `max_results`, or a `min_rating` outside `0..=5`.
    pub fn validate(&self) -> Result<()> {
        if self.business_keyword.trim().is_empty() {
            return Err(MapleadError::Validation(
                "business_keyword must not be empty".to_string(),
            ));
        }
        if self.location.trim().is_empty() {
            return Err(MapleadError::Validation(
                "location must not be empty".to_string(),
            ));
        }
        if self.max_results == 0 {
            return Err(MapleadError::Validation(
                "max_results must be positive".to_string(),
            ));
        }
        let min_rating = self.filters.min_rating;
        if !(0.0..=5.0).contains(&min_rating) {
            return Err(MapleadError::Validation(format!(
                "min_rating must be between 0 and 5, got {min_rating}"
            )));
        }
        Ok(())
    }
}

/// Lifecycle state of the controller's current job.
///
/// `Idle` only before the first job. `Stopping` sits between a stop request
/// and the loop observing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "lowercase")]
pub enum JobState {
    /// No job has been started
    Idle,
    /// A job is scraping
    Running,
    /// Cancellation was requested; the loop has not exited yet
    Stopping,
    /// The loop ran to its natural end
    Completed,
    /// The loop ended after a stop request
    Stopped,
    /// The loop failed with the given description
    Error(String),
}

impl JobState {
    /// True while a job occupies the controller.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running | Self::Stopping)
    }

    /// True once a job has finished in any way.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Stopped | Self::Error(_))
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Stopping => write!(f, "stopping"),
            Self::Completed => write!(f, "completed"),
            Self::Stopped => write!(f, "stopped"),
            Self::Error(message) => write!(f, "error: {message}"),
        }
    }
}
