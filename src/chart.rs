//! Chart-ready projections of an [`AnalysisResult`](crate::stats::AnalysisResult).

use serde::Serialize;
use std::collections::BTreeMap;

use crate::stats::CategoryCounts;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartEntry {
    pub name: String,
    pub value: u32,
    /// Share of all visits, rounded to one decimal.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HourlyEntry {
    pub hour: String,
    pub visits: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateEntry {
    pub date: String,
    pub visits: u32,
}

/// One entry per category in the counts' own order.
///
/// A zero `total_visits` gives every entry a percentage of `0.0`.
pub fn to_chart_series(category_counts: &CategoryCounts, total_visits: u32) -> Vec<ChartEntry> {
    category_counts
        .iter()
        .map(|(name, value)| ChartEntry {
            name: name.to_string(),
            value,
            percentage: percentage(value, total_visits),
        })
        .collect()
}

/// Labels run `0:00` through `23:00`.
pub fn hourly_series(hour_counts: &[u32; 24]) -> Vec<HourlyEntry> {
    hour_counts
        .iter()
        .enumerate()
        .map(|(hour, &visits)| HourlyEntry {
            hour: format!("{}:00", hour),
            visits,
        })
        .collect()
}

pub fn date_series(date_counts: &BTreeMap<String, u32>) -> Vec<DateEntry> {
    date_counts
        .iter()
        .map(|(date, &visits)| DateEntry {
            date: date.clone(),
            visits,
        })
        .collect()
}

fn percentage(value: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (value as f64 / total as f64 * 1000.0).round() / 10.0
}
