use anyhow::{Context, Result};
use rusqlite::{params, Connection, OpenFlags, Result as SqliteResult};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

use crate::provider::{HistoryProvider, HistoryQuery};
use crate::record::VisitRecord;

/// Milliseconds between 1601-01-01 (WebKit epoch) and 1970-01-01.
const WEBKIT_EPOCH_OFFSET_MS: i64 = 11_644_473_600_000;

/// Chromium stores `last_visit_time` as microseconds since 1601-01-01.
///
/// The epoch shift happens in integers: WebKit counts are above 2^53 and
/// would lose the last microsecond as `f64`.
pub fn webkit_to_unix_ms(webkit_us: i64) -> f64 {
    (webkit_us - WEBKIT_EPOCH_OFFSET_MS * 1000) as f64 / 1000.0
}

/// Sub-microsecond fractions are truncated.
pub fn unix_ms_to_webkit(unix_ms: f64) -> i64 {
    (unix_ms * 1000.0).trunc() as i64 + WEBKIT_EPOCH_OFFSET_MS * 1000
}

/// Location of a Chromium-family `History` database for `browser` on `os`.
pub fn history_path_for(
    browser: &str,
    os: &str,
    home: &Path,
    local_app_data: Option<&Path>,
) -> Result<PathBuf> {
    // (linux config dir, macOS Application Support dir, Windows LOCALAPPDATA dir)
    let (linux, macos, windows) = match browser.to_lowercase().as_str() {
        "vivaldi" => ("vivaldi", "Vivaldi", "Vivaldi/User Data"),
        "chrome" => ("google-chrome", "Google/Chrome", "Google/Chrome/User Data"),
        "chromium" => ("chromium", "Chromium", "Chromium/User Data"),
        "brave" => (
            "BraveSoftware/Brave-Browser",
            "BraveSoftware/Brave-Browser",
            "BraveSoftware/Brave-Browser/User Data",
        ),
        "edge" => ("microsoft-edge", "Microsoft Edge", "Microsoft/Edge/User Data"),
        _ => anyhow::bail!("Unsupported browser '{}'", browser),
    };

    let profile_dir = match os {
        "linux" => home.join(".config").join(linux),
        "macos" => home.join("Library/Application Support").join(macos),
        "windows" => local_app_data
            .context("LOCALAPPDATA is not set")?
            .join(windows),
        _ => anyhow::bail!(
            "Unsupported browser '{}' or operating system '{}'",
            browser,
            os
        ),
    };

    Ok(profile_dir.join("Default").join("History"))
}

pub fn get_browser_history_path(browser: &str) -> Result<PathBuf> {
    let system = env::consts::OS;
    let home = env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .context("Neither HOME nor USERPROFILE is set")?;
    let local_app_data = env::var("LOCALAPPDATA").ok().map(PathBuf::from);

    let path = history_path_for(browser, system, Path::new(&home), local_app_data.as_deref())?;

    info!(action = "resolve", component = "browser_path", browser = browser, path = ?path, "Browser history path resolved");
    Ok(path)
}

/// The browser keeps its database locked while running, so work on a copy.
pub fn copy_history_database(history_path: &Path, temp_path: Option<&Path>) -> Result<PathBuf> {
    let start_time = Instant::now();
    info!(action = "start", component = "database_copy", "Copying browser history database");

    let temp_path = temp_path.map(|p| p.to_path_buf()).unwrap_or_else(|| {
        env::temp_dir().join(format!("histats_history_{}.db", std::process::id()))
    });

    info!(action = "copy", component = "database_copy", source = ?history_path, destination = ?temp_path, "Database copy paths");

    if !history_path.exists() {
        anyhow::bail!("History file not found at {:?}", history_path);
    }

    fs::copy(history_path, &temp_path)
        .with_context(|| format!("Failed to copy {:?} to {:?}", history_path, temp_path))?;

    let copy_time = start_time.elapsed();
    info!(action = "complete", component = "database_copy", duration_ms = copy_time.as_millis(), "Database copy completed");
    Ok(temp_path)
}

fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 2);
    escaped.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Rows of the `urls` table matching `query`, newest first.
pub fn query_history(conn: &Connection, query: &HistoryQuery) -> Result<Vec<VisitRecord>> {
    let start_time = Instant::now();
    info!(action = "start", component = "history_query", "Querying visit records");

    let pattern = escape_like(&query.text);
    let limit = i64::try_from(query.max_results).unwrap_or(i64::MAX);

    let mut stmt = conn.prepare(
        "SELECT url, title, last_visit_time FROM urls \
         WHERE last_visit_time >= ?1 \
           AND (?2 = '' OR url LIKE ?3 ESCAPE '\\' OR title LIKE ?3 ESCAPE '\\') \
         ORDER BY last_visit_time DESC \
         LIMIT ?4",
    )?;
    let records = stmt
        .query_map(
            params![unix_ms_to_webkit(query.start_time), query.text, pattern, limit],
            |row| {
                let url: String = row.get(0)?;
                let title: Option<String> = row.get(1)?;
                let last_visit_time: i64 = row.get(2)?;
                Ok(VisitRecord {
                    url,
                    title,
                    last_visit_time: webkit_to_unix_ms(last_visit_time),
                })
            },
        )?
        .collect::<SqliteResult<Vec<VisitRecord>>>()
        .context("Failed to query visit records")?;

    info!(
        action = "complete",
        component = "history_query",
        record_count = records.len(),
        duration_ms = start_time.elapsed().as_millis(),
        "Visit records loaded"
    );
    Ok(records)
}

/// Reads a Chromium-family `History` database through a temporary snapshot.
#[derive(Debug, Clone)]
pub struct SqliteHistoryProvider {
    history_path: PathBuf,
    temp_path: Option<PathBuf>,
}

impl SqliteHistoryProvider {
    pub fn new(history_path: impl Into<PathBuf>) -> Self {
        Self {
            history_path: history_path.into(),
            temp_path: None,
        }
    }

    pub fn for_browser(browser: &str) -> Result<Self> {
        Ok(Self::new(get_browser_history_path(browser)?))
    }

    pub fn with_temp_path(mut self, temp_path: Option<PathBuf>) -> Self {
        self.temp_path = temp_path;
        self
    }

    pub fn history_path(&self) -> &Path {
        &self.history_path
    }
}

impl HistoryProvider for SqliteHistoryProvider {
    fn search(&self, query: &HistoryQuery) -> Result<Vec<VisitRecord>> {
        let temp_history_path =
            copy_history_database(&self.history_path, self.temp_path.as_deref())?;

        let result = Connection::open_with_flags(
            &temp_history_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .context("Failed to open history database copy")
        .and_then(|conn| {
            info!(action = "connect", component = "database", "Connected to database");
            query_history(&conn, query)
        });

        if let Err(e) = fs::remove_file(&temp_history_path) {
            warn!(action = "cleanup", component = "database_copy", path = ?temp_history_path, error = %e, "Failed to remove temporary file");
        }

        result
    }
}
