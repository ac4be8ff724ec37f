mod envelope;
pub use self::envelope::Envelope;

mod schedule;
pub use self::schedule::{RawItem, ScheduleDocument, TimeSlot, BUCKETS};
