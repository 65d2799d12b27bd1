//! Conversion of raw listing detail into a [`Record`].

use crate::error::{Result, ScrapeError};
use crate::session::ListingDetail;
use maplead_core::Record;

/// Parse a rating label such as `"4.5 stars"` or `"4,5 stars"`.
///
/// Only the leading token is read. Returns `None` when it is not a number
/// between 0 and 5.
#[must_use]
pub fn parse_rating(label: &str) -> Option<f64> {
    let token = label.split_whitespace().next()?;
    let value: f64 = token.replace(',', ".").parse().ok()?;
    (value.is_finite() && (0.0..=5.0).contains(&value)).then_some(value)
}

/// Turn one listing's detail into a record found under `location`.
///
/// A detail view without a name is treated as not having rendered and fails
/// with [`ScrapeError::MissingField`]. An unreadable rating is dropped.
pub fn build_record(detail: ListingDetail, location: &str) -> Result<Record> {
    let name = detail
        .name
        .ok_or(ScrapeError::MissingField { field: "name" })?;

    let rating = detail.rating_label.as_deref().and_then(parse_rating);
    if rating.is_none() {
        if let Some(label) = &detail.rating_label {
            tracing::debug!("Ignoring unreadable rating label {:?}", label);
        }
    }

    Ok(Record {
        name: Some(name),
        phone: detail.phone,
        address: detail.address,
        website: detail.website,
        rating,
        location: location.to_string(),
        maps_url: detail.url,
    })
}
