use serde::{Deserialize, Serialize};

/// One browsing-history entry as handed over by the history provider.
///
/// Field names follow the host's `HistoryItem` shape so exported JSON can be
/// read as-is; unknown fields (`id`, `visitCount`, ...) are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitRecord {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    /// Milliseconds since the Unix epoch. May carry a fractional part.
    pub last_visit_time: f64,
}

impl VisitRecord {
    pub fn new(url: impl Into<String>, title: Option<&str>, last_visit_time: f64) -> Self {
        Self {
            url: url.into(),
            title: title.map(str::to_string),
            last_visit_time,
        }
    }

    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(title) if !title.is_empty() => title,
            _ => "Untitled",
        }
    }
}
