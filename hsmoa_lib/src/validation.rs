use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::error::CollectError;

/// Date identity format used by the CLI and output file names.
pub const DATE_FORMAT: &str = "%Y%m%d";

/// Korea Standard Time offset from UTC, in hours.
pub const KST_OFFSET_HOURS: i64 = 9;

/// Validate a `YYYYMMDD` date string.
pub fn validate_date(input: &str) -> Result<NaiveDate, CollectError> {
    let trimmed = input.trim();
    if trimmed.len() != 8 || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CollectError::InvalidInput(format!(
            "invalid date '{}'. Expected YYYYMMDD (e.g. 20260225)",
            input
        )));
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map_err(|_| {
        CollectError::InvalidInput(format!("'{}' is not a calendar date", input))
    })
}

/// Tomorrow's date in KST at instant `now`.
pub fn default_target_date(now: DateTime<Utc>) -> NaiveDate {
    let today = (now.naive_utc() + Duration::hours(KST_OFFSET_HOURS)).date();
    today.succ_opt().unwrap_or(today)
}
