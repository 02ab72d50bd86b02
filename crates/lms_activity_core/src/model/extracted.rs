//! Extraction output unit.
//!
//! `ExtractedActivity` is produced fresh by every extraction pass and is never
//! persisted by the engine itself. Callers decide which ones to store.

use crate::model::activity::{ActivitySource, ActivityType};
use crate::model::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One activity-like element scraped from a page.
///
/// # Invariants
/// - `title` is non-empty and at most the configured maximum length.
/// - `deadline` is always present; it may be a synthetic fallback.
/// - `url` is absolute, falling back to the page URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedActivity {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ActivityType,
    #[serde(with = "timestamp")]
    pub deadline: DateTime<Utc>,
    pub url: String,
    #[serde(default)]
    pub description: String,
    pub source: ActivitySource,
}

impl ExtractedActivity {
    /// Returns whether `other` collides on the full dedup key.
    pub fn same_entry(&self, other: &Self) -> bool {
        self.title == other.title && self.deadline == other.deadline
    }
}
