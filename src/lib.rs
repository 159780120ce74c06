pub mod args;
pub mod browser;
pub mod categories;
pub mod chart;
pub mod domain;
pub mod error;
pub mod provider;
pub mod record;
pub mod sqlite;
pub mod stats;
pub mod utils;

pub use args::Args;
pub use browser::{analyze_browser_history, HistoryReport};
pub use categories::{Category, CategoryTable, INVALID_URL, OTHER};
pub use chart::{to_chart_series, ChartEntry};
pub use domain::categorize;
pub use error::AnalysisError;
pub use provider::{HistoryProvider, HistoryQuery, JsonFileProvider};
pub use record::VisitRecord;
pub use sqlite::SqliteHistoryProvider;
pub use stats::{analyze, AnalysisResult, Analyzer, CategoryCounts, TimeZonePolicy};
