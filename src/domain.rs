use url::Url;

use crate::categories::{CategoryTable, INVALID_URL, OTHER};
use crate::error::AnalysisError;

/// Hostname of `url` as the WHATWG parser produces it (lower-cased for
/// special schemes). URLs without a host, such as `mailto:`, give `""`.
pub fn hostname(url: &str) -> Result<String, AnalysisError> {
    let parsed = Url::parse(url).map_err(|_| AnalysisError::InvalidUrl {
        url: url.to_string(),
    })?;
    Ok(parsed.host_str().unwrap_or_default().to_string())
}

/// Category label for `url`: the first matching category from `table`,
/// [`OTHER`] when nothing matches, or [`INVALID_URL`] when parsing fails.
pub fn categorize(url: &str, table: &CategoryTable) -> String {
    match hostname(url) {
        Ok(host) => table.matching(&host).unwrap_or(OTHER).to_string(),
        Err(_) => INVALID_URL.to_string(),
    }
}
