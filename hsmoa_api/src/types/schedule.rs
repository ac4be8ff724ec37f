use serde::Serialize;
use serde_json::{Map, Value};

use crate::Error;

/// A single upstream item. Shapes vary between channels, so items stay
/// as raw JSON objects until normalization.
pub type RawItem = Map<String, Value>;

/// Bucket keys in traversal order: before, within, and after the window.
pub const BUCKETS: [&str; 3] = ["before_live", "live", "after_live"];

/// Decrypted schedule payload.
///
/// Parsing is lenient: a bucket that is missing or not an array is empty,
/// a slot whose `schedules` is not an array is skipped, and non-object
/// entries inside `schedules` are ignored.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ScheduleDocument {
    pub before_live: Vec<TimeSlot>,
    pub live: Vec<TimeSlot>,
    pub after_live: Vec<TimeSlot>,
}

/// One time slot and the items broadcast in it.
#[derive(Clone, Debug, Default, Serialize)]
pub struct TimeSlot {
    pub time: Option<String>,
    pub count: Option<i64>,
    pub schedules: Vec<RawItem>,
}

impl ScheduleDocument {
    /// Builds the document from a parsed JSON value. The top level must be an object.
    pub fn from_value(value: &Value) -> Result<Self, Error> {
        let root = value
            .as_object()
            .ok_or_else(|| Error::Parse("schedule document is not a JSON object".into()))?;
        Ok(Self {
            before_live: parse_bucket(root.get(BUCKETS[0])),
            live: parse_bucket(root.get(BUCKETS[1])),
            after_live: parse_bucket(root.get(BUCKETS[2])),
        })
    }

    /// Buckets in traversal order.
    pub fn buckets(&self) -> [&[TimeSlot]; 3] {
        [&self.before_live, &self.live, &self.after_live]
    }

    /// Every item in bucket, slot, then item order.
    pub fn items(&self) -> impl Iterator<Item = &RawItem> {
        self.buckets()
            .into_iter()
            .flat_map(|bucket| bucket.iter())
            .flat_map(|slot| slot.schedules.iter())
    }

    pub fn item_count(&self) -> usize {
        self.items().count()
    }
}

fn parse_bucket(value: Option<&Value>) -> Vec<TimeSlot> {
    let Some(Value::Array(slots)) = value else {
        return Vec::new();
    };
    slots.iter().filter_map(parse_slot).collect()
}

fn parse_slot(value: &Value) -> Option<TimeSlot> {
    let slot = value.as_object()?;
    let Some(Value::Array(entries)) = slot.get("schedules") else {
        return None;
    };
    let schedules = entries
        .iter()
        .filter_map(|entry| entry.as_object().cloned())
        .collect();
    Some(TimeSlot {
        time: slot.get("time").and_then(Value::as_str).map(str::to_string),
        count: slot.get("count").and_then(Value::as_i64),
        schedules,
    })
}
