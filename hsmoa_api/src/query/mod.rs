mod common;
pub use self::common::Query;
mod schedule;
pub use self::schedule::{ScheduleQuery, SCHEDULE_PATH};
