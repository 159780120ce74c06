use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use std::time::Instant;
use tracing::info;

use crate::categories::CategoryTable;
use crate::chart::{date_series, hourly_series, to_chart_series, ChartEntry, DateEntry, HourlyEntry};
use crate::provider::{HistoryProvider, HistoryQuery, JsonFileProvider};
use crate::record::VisitRecord;
use crate::sqlite::SqliteHistoryProvider;
use crate::stats::{AnalysisResult, Analyzer, TimeZonePolicy};
use crate::utils::{bar, format_number, redact_url};
use crate::Args;

const BAR_WIDTH: usize = 40;

/// Fetched records together with their analysis.
#[derive(Debug)]
pub struct HistoryReport {
    pub source: String,
    pub records: Vec<VisitRecord>,
    pub analyzer: Analyzer,
    pub result: AnalysisResult,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailRow {
    pub title: String,
    pub url: String,
    pub category: String,
    pub visit_time: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a> {
    #[serde(flatten)]
    result: &'a AnalysisResult,
    category_series: Vec<ChartEntry>,
    hourly_series: Vec<HourlyEntry>,
    date_series: Vec<DateEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    entries: Option<Vec<DetailRow>>,
}

pub fn history_query(args: &Args, now_ms: f64) -> HistoryQuery {
    HistoryQuery::since_days(now_ms, args.days)
        .with_text(args.text.clone())
        .with_max_results(args.max_results)
}

pub fn history_provider(args: &Args) -> Result<(String, Box<dyn HistoryProvider>)> {
    if let Some(input) = &args.input {
        return Ok((
            input.display().to_string(),
            Box::new(JsonFileProvider::new(input)),
        ));
    }

    let (source, provider) = match &args.history_file {
        Some(path) => (path.display().to_string(), SqliteHistoryProvider::new(path)),
        None => (
            args.browser.clone(),
            SqliteHistoryProvider::for_browser(&args.browser)?,
        ),
    };
    Ok((source, Box::new(provider.with_temp_path(args.temp_path.clone()))))
}

pub fn analyze_browser_history(args: &Args) -> Result<HistoryReport> {
    let total_start_time = Instant::now();
    info!(action = "start", component = "history_analysis", "Starting browser history analysis");

    let (source, provider) = history_provider(args)?;
    let query = history_query(args, Utc::now().timestamp_millis() as f64);
    let records = provider.search(&query)?;

    let time_zone = if args.utc {
        TimeZonePolicy::Utc
    } else {
        TimeZonePolicy::Local
    };
    let analyzer = Analyzer::new(CategoryTable::builtin()?, time_zone);
    let result = analyzer.analyze(&records)?;

    info!(
        action = "complete",
        component = "history_analysis",
        source = %source,
        duration_ms = total_start_time.elapsed().as_millis(),
        "Analysis completed successfully"
    );

    Ok(HistoryReport {
        source,
        records,
        analyzer,
        result,
    })
}

pub fn detail_rows(report: &HistoryReport, redact: bool) -> Vec<DetailRow> {
    let time_zone = report.analyzer.time_zone();
    report
        .records
        .iter()
        .map(|record| DetailRow {
            title: record.display_title().to_string(),
            url: if redact {
                redact_url(&record.url)
            } else {
                record.url.clone()
            },
            category: report.analyzer.categorize(&record.url),
            visit_time: time_zone
                .wall_clock(record.last_visit_time)
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string()),
        })
        .collect()
}

pub fn report_json(report: &HistoryReport, args: &Args) -> Result<String> {
    let result = &report.result;
    let json = JsonReport {
        result,
        category_series: to_chart_series(result.category_counts(), result.total_visits()),
        hourly_series: hourly_series(result.hour_counts()),
        date_series: date_series(result.date_counts()),
        entries: args.details.then(|| detail_rows(report, args.redact)),
    };
    Ok(serde_json::to_string_pretty(&json)?)
}

pub fn print_analysis_results(report: &HistoryReport, args: &Args) {
    let result = &report.result;

    println!(
        "\n--- {} History Analysis (last {} days) ---",
        report.source, args.days
    );
    println!("Total visits: {}", format_number(result.total_visits()));

    if let Some((date, count)) = result.busiest_date() {
        println!("Busiest day: {} ({} visits)", date, format_number(count));
    }
    if let Some((hour, count)) = result.busiest_hour() {
        println!("Busiest hour: {}:00 ({} visits)", hour, format_number(count));
    }

    let mut categories = to_chart_series(result.category_counts(), result.total_visits());
    categories.sort_by(|a, b| b.value.cmp(&a.value));

    println!("\nCategory distribution:");
    for entry in &categories {
        println!(
            "- {}: {} visits ({:.1}%)",
            entry.name,
            format_number(entry.value),
            entry.percentage
        );
    }

    let max_hour = result.hour_counts().iter().copied().max().unwrap_or(0);
    println!("\nHourly activity:");
    for entry in hourly_series(result.hour_counts()) {
        println!(
            "{:>6} | {:<width$} {}",
            entry.hour,
            bar(entry.visits, max_hour, BAR_WIDTH),
            format_number(entry.visits),
            width = BAR_WIDTH
        );
    }

    let max_day = result.date_counts().values().copied().max().unwrap_or(0);
    println!("\nDaily distribution:");
    for entry in date_series(result.date_counts()) {
        println!(
            "{} | {:<width$} {}",
            entry.date,
            bar(entry.visits, max_day, BAR_WIDTH),
            format_number(entry.visits),
            width = BAR_WIDTH
        );
    }
}

pub fn print_details(report: &HistoryReport, args: &Args) {
    println!("\n--- {} Detailed History ---", report.source);
    for row in detail_rows(report, args.redact) {
        println!(
            "{} | {} | {} | {}",
            row.visit_time, row.category, row.title, row.url
        );
    }
}
