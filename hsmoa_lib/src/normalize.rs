//! Raw schedule item to canonical record mapping.
//!
//! Upstream items are inconsistently shaped across channels. Each canonical
//! field is derived from an ordered list of candidate keys ([`FIELD_SOURCES`]);
//! the first candidate holding a truthy value wins, otherwise the field takes
//! its default (`""` for text and prices, `0` for review numbers).

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use hsmoa_api::types::RawItem;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::channels::resolve_channel_name;

/// Output format of normalized timestamps.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Canonical fields that are read from upstream keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    ChannelCode,
    StartTime,
    EndTime,
    ProductName,
    Price,
    OriginalPrice,
    Brand,
    Category,
    ImageUrl,
    ProductUrl,
    ReviewCount,
    ReviewRating,
}

/// Candidate upstream keys per field, in precedence order.
///
/// `OriginalPrice` only reads `price`. It is never derived from `sale_price`,
/// so an item with only a sale price has an empty original price.
pub const FIELD_SOURCES: [(Field, &[&str]); 12] = [
    (Field::ChannelCode, &["tv_channel", "site"]),
    (Field::StartTime, &["start_datetime"]),
    (Field::EndTime, &["end_datetime"]),
    (Field::ProductName, &["name"]),
    (Field::Price, &["sale_price", "price"]),
    (Field::OriginalPrice, &["price"]),
    (Field::Brand, &["brand", "aplus_brand"]),
    (Field::Category, &["category1"]),
    (Field::ImageUrl, &["image"]),
    (Field::ProductUrl, &["url"]),
    (Field::ReviewCount, &["review_count"]),
    (Field::ReviewRating, &["review_rating"]),
];

impl Field {
    pub fn sources(self) -> &'static [&'static str] {
        FIELD_SOURCES
            .iter()
            .find(|(field, _)| *field == self)
            .map(|(_, keys)| *keys)
            .unwrap_or(&[])
    }
}

/// A price as the upstream sent it: a number, a string, or empty.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Price {
    Amount(serde_json::Number),
    Text(String),
}

impl Default for Price {
    fn default() -> Self {
        Price::Text(String::new())
    }
}

impl Price {
    fn from_value(value: &Value) -> Self {
        match value {
            Value::Number(n) => Price::Amount(n.clone()),
            Value::String(s) => Price::Text(s.clone()),
            other => Price::Text(other.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Price::Text(s) if s.is_empty())
    }

    /// Numeric value, accepting digit strings with thousands separators.
    pub fn as_amount(&self) -> Option<f64> {
        match self {
            Price::Amount(n) => n.as_f64(),
            Price::Text(s) => s.trim().replace(',', "").parse().ok(),
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Price::Amount(n) => write!(f, "{}", n),
            Price::Text(s) => f.write_str(s),
        }
    }
}

/// One normalized broadcast slot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScheduleItem {
    pub channel_code: String,
    pub channel: String,
    pub start_time: String,
    pub end_time: String,
    pub product_name: String,
    pub price: Price,
    pub original_price: Price,
    pub brand: String,
    pub category: String,
    pub image_url: String,
    pub product_url: String,
    pub review_count: i64,
    pub review_rating: f64,
}

impl ScheduleItem {
    /// Deduplication key: two items are the same slot iff all three match.
    pub fn identity(&self) -> (&str, &str, &str) {
        (&self.channel_code, &self.start_time, &self.product_name)
    }
}

/// Null, `false`, zero, and empty strings or collections count as absent.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// First truthy candidate value for `field`.
pub fn pick(item: &RawItem, field: Field) -> Option<&Value> {
    field
        .sources()
        .iter()
        .filter_map(|key| item.get(*key))
        .find(|value| is_truthy(value))
}

fn text(item: &RawItem, field: Field) -> String {
    match pick(item, field) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn price(item: &RawItem, field: Field) -> Price {
    pick(item, field).map(Price::from_value).unwrap_or_default()
}

fn count(item: &RawItem, field: Field) -> i64 {
    match pick(item, field) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => {
            let s = s.trim().replace(',', "");
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
                .unwrap_or(0)
        }
        _ => 0,
    }
}

fn rating(item: &RawItem, field: Field) -> f64 {
    match pick(item, field) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Reformats an ISO-8601 timestamp as `YYYY-MM-DD HH:MM`.
///
/// The wall-clock time is kept as written; offsets are not converted.
/// Empty or unparseable input yields an empty string.
pub fn format_timestamp(raw: &str) -> String {
    const OFFSET_FORMATS: [&str; 8] = [
        "%Y-%m-%dT%H:%M:%S%.f%z",
        "%Y-%m-%dT%H:%M%:z",
        "%Y-%m-%dT%H:%M%z",
        "%Y-%m-%d %H:%M:%S%.f%:z",
        "%Y-%m-%d %H:%M:%S%.f%z",
        "%Y-%m-%d %H:%M%:z",
        "%Y-%m-%d %H:%M%z",
        "%Y%m%dT%H%M%S%z",
    ];
    const NAIVE_FORMATS: [&str; 6] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y%m%dT%H%M%S",
        "%Y%m%dT%H%M",
    ];

    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.naive_local().format(TIME_FORMAT).to_string();
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return dt.naive_local().format(TIME_FORMAT).to_string();
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return dt.format(TIME_FORMAT).to_string();
        }
    }
    if let Some(dt) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return dt.format(TIME_FORMAT).to_string();
    }
    String::new()
}

/// Maps one raw upstream item to a [`ScheduleItem`].
pub fn normalize_item(item: &RawItem) -> ScheduleItem {
    let channel_code = text(item, Field::ChannelCode);
    ScheduleItem {
        channel: resolve_channel_name(&channel_code),
        channel_code,
        start_time: format_timestamp(&text(item, Field::StartTime)),
        end_time: format_timestamp(&text(item, Field::EndTime)),
        product_name: text(item, Field::ProductName),
        price: price(item, Field::Price),
        original_price: price(item, Field::OriginalPrice),
        brand: text(item, Field::Brand),
        category: text(item, Field::Category),
        image_url: text(item, Field::ImageUrl),
        product_url: text(item, Field::ProductUrl),
        review_count: count(item, Field::ReviewCount),
        review_rating: rating(item, Field::ReviewRating),
    }
}
