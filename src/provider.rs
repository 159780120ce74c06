use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

use crate::record::VisitRecord;

pub const DEFAULT_DAYS: u32 = 7;
pub const DEFAULT_MAX_RESULTS: usize = 10_000;

const DAY_MS: f64 = 24.0 * 60.0 * 60.0 * 1000.0;

/// Time-range query handed to a [`HistoryProvider`].
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryQuery {
    /// Case-insensitive substring of url or title; empty matches everything.
    pub text: String,
    /// Earliest visit to include, in milliseconds since the Unix epoch.
    pub start_time: f64,
    pub max_results: usize,
}

impl HistoryQuery {
    pub fn since_days(now_ms: f64, days: u32) -> Self {
        Self {
            text: String::new(),
            start_time: now_ms - days as f64 * DAY_MS,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    /// The past week, capped at 10,000 entries.
    pub fn last_week(now_ms: f64) -> Self {
        Self::since_days(now_ms, DEFAULT_DAYS)
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn matches(&self, record: &VisitRecord) -> bool {
        if record.last_visit_time < self.start_time {
            return false;
        }
        if self.text.is_empty() {
            return true;
        }
        let needle = self.text.to_lowercase();
        record.url.to_lowercase().contains(&needle)
            || record
                .title
                .as_deref()
                .is_some_and(|title| title.to_lowercase().contains(&needle))
    }
}

/// Source of raw visit records. Results are used as returned: no retries,
/// no pagination.
pub trait HistoryProvider {
    fn search(&self, query: &HistoryQuery) -> Result<Vec<VisitRecord>>;
}

/// Filter, order newest first, and cap `records` per `query`.
pub fn apply_query(records: Vec<VisitRecord>, query: &HistoryQuery) -> Vec<VisitRecord> {
    let mut records: Vec<VisitRecord> = records.into_iter().filter(|r| query.matches(r)).collect();
    records.sort_by(|a, b| b.last_visit_time.total_cmp(&a.last_visit_time));
    records.truncate(query.max_results);
    records
}

/// Reads a JSON array of history items, e.g. an export of the browser's
/// history API.
#[derive(Debug, Clone)]
pub struct JsonFileProvider {
    path: PathBuf,
}

impl JsonFileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoryProvider for JsonFileProvider {
    fn search(&self, query: &HistoryQuery) -> Result<Vec<VisitRecord>> {
        let start_time = Instant::now();
        info!(action = "start", component = "json_provider", file_path = ?self.path, "Reading history export");

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read history export {:?}", self.path))?;
        let records: Vec<VisitRecord> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse history export {:?}", self.path))?;
        let read_count = records.len();

        let records = apply_query(records, query);
        info!(
            action = "complete",
            component = "json_provider",
            read_count,
            record_count = records.len(),
            duration_ms = start_time.elapsed().as_millis(),
            "History export loaded"
        );
        Ok(records)
    }
}
