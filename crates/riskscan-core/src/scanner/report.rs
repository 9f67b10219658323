use crate::config::FailurePolicy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What one category ended up with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum Outcome {
    /// The extracted excerpt, a sentinel, or the unknown-category placeholder.
    Completed(String),
    /// Error marker; only produced under [`FailurePolicy::CollectAll`].
    Failed(String),
}

impl Outcome {
    pub fn text(&self) -> &str {
        match self {
            Outcome::Completed(text) | Outcome::Failed(text) => text,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryResult {
    pub category: String,
    pub outcome: Outcome,
}

/// Category-to-result mapping for one scan request, in request order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub target: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub failure_policy: FailurePolicy,
    pub results: Vec<CategoryResult>,
}

impl ScanReport {
    pub fn get(&self, category: &str) -> Option<&Outcome> {
        self.results
            .iter()
            .find(|r| r.category == category)
            .map(|r| &r.outcome)
    }

    /// Excerpt for a category that completed.
    pub fn excerpt(&self, category: &str) -> Option<&str> {
        match self.get(category)? {
            Outcome::Completed(text) => Some(text),
            Outcome::Failed(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.results.iter().map(|r| r.category.as_str())
    }

    pub fn failures(&self) -> impl Iterator<Item = &CategoryResult> {
        self.results.iter().filter(|r| r.outcome.is_failed())
    }

    /// True when every category completed.
    pub fn is_complete(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn duration_secs(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }

    /// Name of the scanned repository, i.e. the target directory's last component.
    pub fn repository_name(&self) -> String {
        self.target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.target.display().to_string())
    }

    /// Human-readable body, one `Risk:`/`Result:` block per category.
    pub fn render_plain(&self) -> String {
        let mut out = format!(
            "Scan completed for repository \"{}\":\n\n",
            self.repository_name()
        );
        for result in &self.results {
            let text = match &result.outcome {
                Outcome::Completed(text) => text.clone(),
                Outcome::Failed(error) => format!("ERROR: {error}"),
            };
            out.push_str(&format!("Risk: {}\nResult: {}\n\n", result.category, text));
        }
        out
    }
}
