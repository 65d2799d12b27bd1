//! Search URL construction.

use url::form_urlencoded::byte_serialize;

/// Build the Maps search URL for `keyword` in `location`.
///
/// Each part is form-urlencoded, so spaces become `+`:
/// `coffee shop` / `Seattle` → `{base}coffee+shop+in+Seattle`.
#[must_use]
pub fn build_search_url(base: &str, keyword: &str, location: &str) -> String {
    let keyword: String = byte_serialize(keyword.trim().as_bytes()).collect();
    let location: String = byte_serialize(location.trim().as_bytes()).collect();
    format!("{base}{keyword}+in+{location}")
}
