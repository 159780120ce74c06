use anyhow::{bail, Result};
use std::time::Instant;
use tracing::debug;

// Compiled into the binary; there is no runtime override.
const DEFAULT_CATEGORIES: &str = include_str!("../default_categories.txt");

/// Label for a URL whose host matches no category.
pub const OTHER: &str = "Other";
/// Label for a string that does not parse as a URL.
pub const INVALID_URL: &str = "Invalid URL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub domains: Vec<String>,
}

impl Category {
    pub fn new(name: impl Into<String>, domains: &[&str]) -> Self {
        Self {
            name: name.into(),
            domains: domains.iter().map(|d| d.to_string()).collect(),
        }
    }

    /// Loose containment match: `"notfacebook.com.evil.example"` matches
    /// `"facebook.com"`. Comparison is case-sensitive.
    pub fn matches(&self, host: &str) -> bool {
        self.domains.iter().any(|domain| host.contains(domain.as_str()))
    }
}

/// Ordered, immutable category taxonomy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTable {
    categories: Vec<Category>,
}

impl CategoryTable {
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    /// The taxonomy shipped with the crate.
    pub fn builtin() -> Result<Self> {
        let start_time = Instant::now();
        let table = Self::parse(DEFAULT_CATEGORIES)?;
        debug!(
            action = "loaded",
            component = "category_table",
            category_count = table.len(),
            duration_us = start_time.elapsed().as_micros(),
            "Loaded built-in categories"
        );
        Ok(table)
    }

    /// Parse `Name: domain, domain` lines. Blank lines and `#` comments are skipped.
    pub fn parse(content: &str) -> Result<Self> {
        let mut categories = Vec::new();

        for (line_num, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((name, domains)) = line.split_once(':') else {
                bail!("Missing ':' in category definition at line {}", line_num + 1);
            };

            let name = name.trim();
            if name.is_empty() {
                bail!("Empty category name at line {}", line_num + 1);
            }

            let domains: Vec<String> = domains
                .split(',')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string)
                .collect();
            if domains.is_empty() {
                bail!("Category '{}' has no domains at line {}", name, line_num + 1);
            }

            categories.push(Category {
                name: name.to_string(),
                domains,
            });
        }

        Ok(Self { categories })
    }

    /// Name of the first category (in table order) matching `host`.
    pub fn matching(&self, host: &str) -> Option<&str> {
        self.categories
            .iter()
            .find(|category| category.matches(host))
            .map(|category| category.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
