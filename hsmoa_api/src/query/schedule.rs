//! Query builder for the schedule endpoint.

use chrono::{NaiveDate, NaiveDateTime};
use url::Url;

use super::common::Query;
use crate::Error;

/// Path of the protected schedule endpoint, relative to the site origin.
pub const SCHEDULE_PATH: &str = "/api/hsmoa/v3/schedule";

/// Number of slots requested per call.
pub const DEFAULT_TIME_SIZE: u32 = 48;

/// The window always extends forward from the anchor.
const DIRECTION: &str = "down";

/// Query for a window of schedule slots.
///
/// The window starts at `time` and spans `time_size` slots forward.
/// [`ScheduleQuery::for_date`] anchors it at midnight of the target day.
#[derive(Clone, Debug)]
pub struct ScheduleQuery {
    pub time_size: u32,
    pub time: NaiveDateTime,
}

impl ScheduleQuery {
    /// A 48-slot forward window anchored at `{date}T00:00:00`.
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            time_size: DEFAULT_TIME_SIZE,
            time: date.and_time(chrono::NaiveTime::MIN),
        }
    }

    /// Anchor formatted the way the endpoint expects (`YYYY-MM-DDTHH:MM:SS`).
    pub fn anchor(&self) -> String {
        self.time.format("%Y-%m-%dT%H:%M:%S").to_string()
    }

    /// Full endpoint URL on the given origin.
    pub fn to_url(&self, base_url: &str) -> Result<Url, Error> {
        let raw = format!("{}{}", base_url.trim_end_matches('/'), SCHEDULE_PATH);
        let url = Url::parse(&raw).map_err(|e| {
            tracing::error!("Invalid URL constructed: {}", e);
            Error::RequestFailed
        })?;
        Ok(self.add_to_url(&url))
    }
}

impl Query for ScheduleQuery {
    fn add_to_url(&self, url: &Url) -> Url {
        let mut url = url.clone();
        url.query_pairs_mut()
            .append_pair("time_size", &self.time_size.to_string())
            .append_pair("direction", DIRECTION)
            .append_pair("time", &self.anchor());
        url
    }
}
