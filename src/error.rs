use thiserror::Error;

/// Failures the analysis engine can report.
///
/// `InvalidUrl` never escapes [`crate::stats::analyze`]; it is folded into the
/// "Invalid URL" category. `MalformedInput` aborts the whole call so that no
/// partially aggregated result is ever returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("invalid url: {url}")]
    InvalidUrl { url: String },
    #[error("malformed visit timestamp {timestamp} for record {index}")]
    MalformedInput { index: usize, timestamp: f64 },
}
