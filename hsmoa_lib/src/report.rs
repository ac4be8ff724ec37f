//! Exported dataset and console summary statistics.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::normalize::ScheduleItem;

/// One run's dataset as written to disk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScheduleReport {
    /// Target date, `YYYY-MM-DD`.
    pub date: String,
    /// Local wall-clock time of collection.
    pub collected_at: NaiveDateTime,
    pub total_count: usize,
    pub items: Vec<ScheduleItem>,
}

impl ScheduleReport {
    pub fn new(date: NaiveDate, items: Vec<ScheduleItem>, collected_at: NaiveDateTime) -> Self {
        Self {
            date: date.format("%Y-%m-%d").to_string(),
            collected_at,
            total_count: items.len(),
            items,
        }
    }

    pub fn summary(&self) -> ScheduleSummary {
        ScheduleSummary::from_items(&self.items)
    }
}

/// Aggregate view printed after a run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScheduleSummary {
    pub total: usize,
    pub channels: Vec<String>,
    pub categories: Vec<String>,
    pub priced_count: usize,
    pub average_price: Option<f64>,
}

impl ScheduleSummary {
    pub fn from_items(items: &[ScheduleItem]) -> Self {
        let channels: BTreeSet<&str> = items
            .iter()
            .map(|i| i.channel.as_str())
            .filter(|c| !c.is_empty())
            .collect();
        let categories: BTreeSet<&str> = items
            .iter()
            .map(|i| i.category.as_str())
            .filter(|c| !c.is_empty())
            .collect();
        let prices: Vec<f64> = items
            .iter()
            .filter_map(|i| i.price.as_amount())
            .filter(|p| *p > 0.0)
            .collect();
        let average_price = if prices.is_empty() {
            None
        } else {
            Some(prices.iter().sum::<f64>() / prices.len() as f64)
        };

        Self {
            total: items.len(),
            channels: channels.into_iter().map(String::from).collect(),
            categories: categories.into_iter().map(String::from).collect(),
            priced_count: prices.len(),
            average_price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_item;
    use serde_json::json;

    fn items() -> Vec<ScheduleItem> {
        [
            json!({ "tv_channel": "gsshop", "sale_price": 10000, "category1": "식품" }),
            json!({ "tv_channel": "cjmall", "price": "20,000", "category1": "가전" }),
            json!({ "tv_channel": "gsshop", "category1": "" }),
        ]
        .iter()
        .map(|v| normalize_item(v.as_object().unwrap()))
        .collect()
    }

    #[test]
    fn summary_counts_channels_and_categories() {
        let summary = ScheduleSummary::from_items(&items());
        assert_eq!(summary.total, 3);
        assert_eq!(summary.channels, vec!["CJ온스타일", "GS샵"]);
        assert_eq!(summary.categories, vec!["가전", "식품"]);
    }

    #[test]
    fn average_uses_priced_items_only() {
        let summary = ScheduleSummary::from_items(&items());
        assert_eq!(summary.priced_count, 2);
        assert_eq!(summary.average_price, Some(15000.0));
    }

    #[test]
    fn empty_summary_has_no_average() {
        let summary = ScheduleSummary::from_items(&[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.average_price, None);
    }

    #[test]
    fn report_serializes_date_and_count() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 25).unwrap();
        let at = date.and_hms_opt(8, 30, 0).unwrap();
        let report = ScheduleReport::new(date, items(), at);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["date"], "2026-02-25");
        assert_eq!(json["collected_at"], "2026-02-25T08:30:00");
        assert_eq!(json["total_count"], 3);
        assert_eq!(json["items"].as_array().unwrap().len(), 3);
    }
}
