//! Upstream query URLs.
//!
//! The upstream expects the literal bare `xml` flag as the last parameter.
//! Grouping names are form-encoded (space becomes `+`).

use planzajec_core::ScheduleType;
use url::form_urlencoded;

use crate::error::{UpstreamError, UpstreamResult};

/// URL listing all groupings.
pub fn groupings_url(base_url: &str) -> String {
    format!("{}?xml", base_url)
}

/// URL listing the entities of one type inside a grouping.
pub fn headers_url(base_url: &str, schedule_type: ScheduleType, grouping_name: &str) -> String {
    let grouping: String = form_urlencoded::byte_serialize(grouping_name.as_bytes()).collect();
    format!(
        "{}?typ={}&grupa={}&xml",
        base_url,
        schedule_type.code(),
        grouping
    )
}

/// Converts a 0-based period index to the upstream's 1-based `okres`.
///
/// # Errors
///
/// Returns an invalid-input error if the index has no successor.
pub fn period_number(period_index: usize) -> UpstreamResult<usize> {
    period_index.checked_add(1).ok_or_else(|| {
        UpstreamError::invalid_input(format!("period index {} is out of range", period_index))
    })
}

/// URL of one entity's schedule. `period_index` is 0-based.
pub fn schedule_url(
    base_url: &str,
    schedule_type: ScheduleType,
    id: i64,
    period_index: usize,
) -> UpstreamResult<String> {
    Ok(format!(
        "{}?typ={}&id={}&okres={}&xml",
        base_url,
        schedule_type.code(),
        id,
        period_number(period_index)?
    ))
}
