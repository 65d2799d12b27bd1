//! Inclusion rules applied to every extracted record.
//!
//! Rules are independent and AND-combined; phone and website count as
//! present only when they hold non-blank text.

#![allow(clippy::must_use_candidate)]

use maplead_core::{FilterConfig, Record};
use std::fmt;

const CLOSED_MARKER: &str = "permanently closed";

/// First rule a record failed, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// `require_phone` is set and the record has no phone number
    MissingPhone,
    /// `no_website_only` is set and the record has a website
    HasWebsite,
    /// `with_website_only` is set and the record has no website
    MissingWebsite,
    /// `exclude_closed` is set and the name says "permanently closed"
    PermanentlyClosed,
    /// `min_rating` is positive and the rating is absent or lower
    RatingBelowMinimum,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Rejection::MissingPhone => "no phone number",
            Rejection::HasWebsite => "has a website",
            Rejection::MissingWebsite => "no website",
            Rejection::PermanentlyClosed => "permanently closed",
            Rejection::RatingBelowMinimum => "rating below minimum",
        };
        f.write_str(reason)
    }
}

/// Returns the first filter rule `record` fails, or `None` when it passes all of them.
pub fn rejection_reason(record: &Record, filters: &FilterConfig) -> Option<Rejection> {
    if filters.require_phone && !record.has_phone() {
        return Some(Rejection::MissingPhone);
    }
    if filters.no_website_only && record.has_website() {
        return Some(Rejection::HasWebsite);
    }
    if filters.with_website_only && !record.has_website() {
        return Some(Rejection::MissingWebsite);
    }
    if filters.exclude_closed && is_marked_closed(record) {
        return Some(Rejection::PermanentlyClosed);
    }
    if filters.min_rating > 0.0 && !record.rating.is_some_and(|r| r >= filters.min_rating) {
        return Some(Rejection::RatingBelowMinimum);
    }
    None
}

/// True when `record` passes every active rule in `filters`.
///
/// With all flags off and `min_rating` at `0.0` every record is accepted;
/// with both website flags on none is.
pub fn accepts(record: &Record, filters: &FilterConfig) -> bool {
    rejection_reason(record, filters).is_none()
}

fn is_marked_closed(record: &Record) -> bool {
    record
        .name
        .as_deref()
        .is_some_and(|name| name.to_lowercase().contains(CLOSED_MARKER))
}
