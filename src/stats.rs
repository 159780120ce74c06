use chrono::{DateTime, FixedOffset, NaiveDateTime, Timelike, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info};

use crate::categories::CategoryTable;
use crate::domain::categorize;
use crate::error::AnalysisError;
use crate::record::VisitRecord;

/// Largest magnitude an ECMAScript time value may have, in milliseconds.
const MAX_TIME_MS: f64 = 8.64e15;

/// Which wall clock the date and hour buckets are taken from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeZonePolicy {
    /// The system time zone of the machine running the analysis.
    #[default]
    Local,
    Utc,
    Fixed(FixedOffset),
}

impl TimeZonePolicy {
    /// Wall-clock time of a millisecond timestamp, or `None` when the value is
    /// not a representable time (NaN, infinite, or out of range).
    pub fn wall_clock(&self, timestamp_ms: f64) -> Option<NaiveDateTime> {
        let utc = timestamp_to_datetime(timestamp_ms)?;
        Some(match self {
            TimeZonePolicy::Local => utc.with_timezone(&chrono::Local).naive_local(),
            TimeZonePolicy::Utc => utc.naive_utc(),
            TimeZonePolicy::Fixed(offset) => utc.with_timezone(offset).naive_local(),
        })
    }
}

/// Fractional milliseconds are truncated toward zero.
pub fn timestamp_to_datetime(timestamp_ms: f64) -> Option<DateTime<Utc>> {
    if !timestamp_ms.is_finite() || timestamp_ms.abs() > MAX_TIME_MS {
        return None;
    }
    DateTime::from_timestamp_millis(timestamp_ms.trunc() as i64)
}

/// Visit counts per category label, kept in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryCounts {
    entries: Vec<(String, u32)>,
}

impl CategoryCounts {
    pub fn increment(&mut self, category: &str) {
        match self.entries.iter_mut().find(|(name, _)| name == category) {
            Some((_, count)) => *count += 1,
            None => self.entries.push((category.to_string(), 1)),
        }
    }

    pub fn get(&self, category: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, count)| *count)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.entries.iter().map(|(name, count)| (name.as_str(), *count))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> u32 {
        self.entries.iter().map(|(_, count)| count).sum()
    }
}

impl Serialize for CategoryCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, count) in &self.entries {
            map.serialize_entry(name, count)?;
        }
        map.end()
    }
}

/// Aggregates of one analysis run. Only [`analyze`] builds these, so every
/// aggregate sums to `total_visits`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    category_counts: CategoryCounts,
    /// Keyed by `YYYY-MM-DD`, so iteration is chronological.
    date_counts: BTreeMap<String, u32>,
    hour_counts: [u32; 24],
    total_visits: u32,
}

impl AnalysisResult {
    fn empty() -> Self {
        Self {
            category_counts: CategoryCounts::default(),
            date_counts: BTreeMap::new(),
            hour_counts: [0; 24],
            total_visits: 0,
        }
    }

    pub fn category_counts(&self) -> &CategoryCounts {
        &self.category_counts
    }

    pub fn date_counts(&self) -> &BTreeMap<String, u32> {
        &self.date_counts
    }

    pub fn hour_counts(&self) -> &[u32; 24] {
        &self.hour_counts
    }

    pub fn total_visits(&self) -> u32 {
        self.total_visits
    }

    /// Category with the most visits; ties go to the one seen first.
    pub fn top_category(&self) -> Option<(&str, u32)> {
        self.category_counts
            .iter()
            .fold(None, |best, (name, count)| match best {
                Some((_, best_count)) if best_count >= count => best,
                _ => Some((name, count)),
            })
    }

    /// Hour with the most visits; ties go to the earliest hour.
    pub fn busiest_hour(&self) -> Option<(usize, u32)> {
        if self.total_visits == 0 {
            return None;
        }
        self.hour_counts
            .iter()
            .enumerate()
            .fold(None, |best, (hour, &count)| match best {
                Some((_, best_count)) if best_count >= count => best,
                _ => Some((hour, count)),
            })
    }

    /// Date with the most visits; ties go to the earliest date.
    pub fn busiest_date(&self) -> Option<(&str, u32)> {
        self.date_counts
            .iter()
            .fold(None, |best, (date, &count)| match best {
                Some((_, best_count)) if best_count >= count => best,
                _ => Some((date.as_str(), count)),
            })
    }
}

/// Categorizes and buckets visit records against a fixed taxonomy.
#[derive(Debug, Clone)]
pub struct Analyzer {
    table: CategoryTable,
    time_zone: TimeZonePolicy,
}

impl Analyzer {
    pub fn new(table: CategoryTable, time_zone: TimeZonePolicy) -> Self {
        Self { table, time_zone }
    }

    pub fn table(&self) -> &CategoryTable {
        &self.table
    }

    pub fn time_zone(&self) -> TimeZonePolicy {
        self.time_zone
    }

    pub fn categorize(&self, url: &str) -> String {
        categorize(url, &self.table)
    }

    pub fn analyze(&self, records: &[VisitRecord]) -> Result<AnalysisResult, AnalysisError> {
        analyze(records, &self.table, self.time_zone)
    }
}

/// Single pass over `records` producing category, date and hour aggregates.
///
/// Every record lands in exactly one bucket of each aggregate. If any
/// timestamp cannot be converted the whole call fails.
pub fn analyze(
    records: &[VisitRecord],
    table: &CategoryTable,
    time_zone: TimeZonePolicy,
) -> Result<AnalysisResult, AnalysisError> {
    let start_time = Instant::now();
    debug!(
        action = "start",
        component = "analysis",
        record_count = records.len(),
        time_zone = ?time_zone,
        "Starting history analysis"
    );

    let mut result = AnalysisResult::empty();

    for (index, record) in records.iter().enumerate() {
        let visited_at = time_zone.wall_clock(record.last_visit_time).ok_or(
            AnalysisError::MalformedInput {
                index,
                timestamp: record.last_visit_time,
            },
        )?;

        result
            .category_counts
            .increment(&categorize(&record.url, table));

        let date = visited_at.date().format("%Y-%m-%d").to_string();
        *result.date_counts.entry(date).or_insert(0) += 1;

        result.hour_counts[visited_at.hour() as usize] += 1;
        result.total_visits += 1;
    }

    info!(
        action = "complete",
        component = "analysis",
        total_visits = result.total_visits,
        categories = result.category_counts.len(),
        days = result.date_counts.len(),
        duration_ms = start_time.elapsed().as_millis(),
        "History analysis completed"
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // 2023-11-14T22:13:20Z
    const BASE_MS: f64 = 1_700_000_000_000.0;

    fn utc_analyze(records: &[VisitRecord]) -> Result<AnalysisResult, AnalysisError> {
        analyze(records, &CategoryTable::builtin().unwrap(), TimeZonePolicy::Utc)
    }

    fn visit(url: &str, ms: f64) -> VisitRecord {
        VisitRecord::new(url, None, ms)
    }

    #[test]
    fn empty_input() {
        let result = utc_analyze(&[]).unwrap();
        assert_eq!(result.total_visits, 0);
        assert!(result.category_counts.is_empty());
        assert!(result.date_counts.is_empty());
        assert_eq!(result.hour_counts, [0; 24]);
        assert_eq!(result.busiest_hour(), None);
        assert_eq!(result.busiest_date(), None);
        assert_eq!(result.top_category(), None);
    }

    #[test]
    fn conservation_across_aggregates() {
        let records = vec![
            visit("https://www.facebook.com/feed", BASE_MS),
            visit("not a url", BASE_MS + 3_600_000.0),
            visit("https://example.org/page", BASE_MS + 7_200_000.0),
            visit("https://www.youtube.com/watch", BASE_MS + 86_400_000.0),
            visit("", BASE_MS - 86_400_000.0),
        ];
        let result = utc_analyze(&records).unwrap();

        assert_eq!(result.total_visits, 5);
        assert_eq!(result.category_counts.total(), 5);
        assert_eq!(result.date_counts.values().sum::<u32>(), 5);
        assert_eq!(result.hour_counts.iter().sum::<u32>(), 5);
        assert_eq!(result.category_counts.get("Invalid URL"), Some(2));
        assert_eq!(result.category_counts.get("Other"), Some(1));
        assert_eq!(result.category_counts.get("Shopping"), None);
    }

    #[test]
    fn category_counts_keep_first_appearance_order() {
        let records = vec![
            visit("https://example.org", BASE_MS),
            visit("https://www.youtube.com", BASE_MS),
            visit("https://example.net", BASE_MS),
            visit("https://www.facebook.com", BASE_MS),
        ];
        let result = utc_analyze(&records).unwrap();
        let order: Vec<(&str, u32)> = result.category_counts.iter().collect();
        assert_eq!(order, vec![("Other", 2), ("Video", 1), ("Social Media", 1)]);
    }

    #[test]
    fn last_second_of_day_lands_in_hour_23() {
        // 2024-03-10T23:59:59Z
        let records = vec![visit("https://example.org", 1_710_115_199_000.0)];
        let result = utc_analyze(&records).unwrap();
        let mut expected = [0; 24];
        expected[23] = 1;
        assert_eq!(result.hour_counts, expected);
        assert_eq!(result.date_counts.get("2024-03-10"), Some(&1));
    }

    #[test]
    fn same_day_collapses_into_one_date() {
        // 2024-03-10T01:00:00Z and 2024-03-10T18:30:00Z
        let records = vec![
            visit("https://example.org", 1_710_032_400_000.0),
            visit("https://example.org", 1_710_095_400_000.0),
        ];
        let result = utc_analyze(&records).unwrap();
        assert_eq!(result.date_counts.len(), 1);
        assert_eq!(result.date_counts.get("2024-03-10"), Some(&2));
        assert_eq!(result.hour_counts[1], 1);
        assert_eq!(result.hour_counts[18], 1);
    }

    #[test]
    fn fixed_offset_shifts_buckets() {
        // 2024-03-10T23:30:00Z is 2024-03-11 01:30 at +02:00
        let records = vec![visit("https://example.org", 1_710_113_400_000.0)];
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let result = analyze(
            &records,
            &CategoryTable::builtin().unwrap(),
            TimeZonePolicy::Fixed(offset),
        )
        .unwrap();
        assert_eq!(result.date_counts.get("2024-03-11"), Some(&1));
        assert_eq!(result.hour_counts[1], 1);
    }

    #[test]
    fn fractional_milliseconds_truncate() {
        // One millisecond before 2024-03-11T00:00:00Z, with a fraction
        let records = vec![visit("https://example.org", 1_710_115_199_999.9)];
        let result = utc_analyze(&records).unwrap();
        assert_eq!(result.date_counts.get("2024-03-10"), Some(&1));
        assert_eq!(result.hour_counts[23], 1);
    }

    #[test]
    fn malformed_timestamp_fails_whole_call() {
        for bad in [f64::NAN, f64::INFINITY, 9.0e15] {
            let records = vec![visit("https://example.org", BASE_MS), visit("https://a.b", bad)];
            match utc_analyze(&records) {
                Err(AnalysisError::MalformedInput { index, .. }) => assert_eq!(index, 1),
                other => panic!("expected MalformedInput, got {other:?}"),
            }
        }
    }

    #[test]
    fn analyze_is_idempotent() {
        let records = vec![
            visit("https://www.amazon.com/dp/1", BASE_MS),
            visit("https://cnn.com", BASE_MS + 1.0),
            visit("???", BASE_MS + 2.0),
        ];
        let analyzer = Analyzer::new(CategoryTable::builtin().unwrap(), TimeZonePolicy::Utc);
        assert_eq!(analyzer.analyze(&records).unwrap(), analyzer.analyze(&records).unwrap());
    }

    #[test]
    fn busiest_helpers_prefer_earliest_on_ties() {
        let records = vec![
            visit("https://a.example", 1_710_032_400_000.0), // 2024-03-10 01:00
            visit("https://b.example", 1_710_118_800_000.0), // 2024-03-11 01:00
            visit("https://www.youtube.com", 1_710_122_400_000.0), // 2024-03-11 02:00
        ];
        let result = utc_analyze(&records).unwrap();
        assert_eq!(result.busiest_hour(), Some((1, 2)));
        assert_eq!(result.busiest_date(), Some(("2024-03-11", 2)));
        assert_eq!(result.top_category(), Some(("Other", 2)));
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let records = vec![visit("https://www.youtube.com", 1_710_032_400_000.0)];
        let json = serde_json::to_value(utc_analyze(&records).unwrap()).unwrap();
        assert_eq!(json["categoryCounts"]["Video"], 1);
        assert_eq!(json["dateCounts"]["2024-03-10"], 1);
        assert_eq!(json["hourCounts"].as_array().unwrap().len(), 24);
        assert_eq!(json["totalVisits"], 1);
    }

    #[test]
    fn wall_clock_rejects_out_of_range() {
        assert!(TimeZonePolicy::Utc.wall_clock(-1.5).is_some());
        assert!(TimeZonePolicy::Utc.wall_clock(-8.64e15 - 1.0).is_none());
        assert!(TimeZonePolicy::Local.wall_clock(f64::NEG_INFINITY).is_none());
    }
}
