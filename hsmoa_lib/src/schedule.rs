//! Target-date selection, deduplication and ordering of normalized items.

use std::collections::HashSet;

use chrono::NaiveDate;
use hsmoa_api::types::ScheduleDocument;

use crate::normalize::{normalize_item, ScheduleItem};

/// Normalizes every item of every bucket in document order.
pub fn collect_items(doc: &ScheduleDocument) -> Vec<ScheduleItem> {
    doc.items().map(normalize_item).collect()
}

/// Keeps items starting on `date`.
///
/// When no item matches, every item is kept and a warning is logged, so a
/// window shifted by the upstream still produces data.
pub fn filter_target_date(items: Vec<ScheduleItem>, date: NaiveDate) -> Vec<ScheduleItem> {
    let prefix = date.format("%Y-%m-%d").to_string();
    let matching: Vec<ScheduleItem> = items
        .iter()
        .filter(|item| item.start_time.starts_with(&prefix))
        .cloned()
        .collect();

    if matching.is_empty() && !items.is_empty() {
        tracing::warn!(
            "No items start on {}; keeping all {} collected items",
            prefix,
            items.len()
        );
        return items;
    }
    tracing::info!("{} of {} items start on {}", matching.len(), items.len(), prefix);
    matching
}

/// Drops repeated `(channel_code, start_time, product_name)` triples. The
/// first occurrence wins.
pub fn dedup_items(items: Vec<ScheduleItem>) -> Vec<ScheduleItem> {
    let before = items.len();
    let mut seen = HashSet::new();
    let unique: Vec<ScheduleItem> = items
        .into_iter()
        .filter(|item| {
            let (channel, start, name) = item.identity();
            seen.insert((channel.to_string(), start.to_string(), name.to_string()))
        })
        .collect();
    if unique.len() < before {
        tracing::info!("Dropped {} duplicate items", before - unique.len());
    }
    unique
}

/// Stable sort by start time, then channel display name.
pub fn sort_items(items: &mut [ScheduleItem]) {
    items.sort_by(|a, b| {
        a.start_time
            .cmp(&b.start_time)
            .then_with(|| a.channel.cmp(&b.channel))
    });
}

/// Full extraction: normalize, select the target date, dedup, sort.
pub fn extract_schedule_items(doc: &ScheduleDocument, date: NaiveDate) -> Vec<ScheduleItem> {
    let all = collect_items(doc);
    tracing::info!("Normalized {} items", all.len());
    let mut items = dedup_items(filter_target_date(all, date));
    sort_items(&mut items);
    items
}
