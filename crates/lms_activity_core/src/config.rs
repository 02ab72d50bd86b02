//! Runtime configuration for extraction and reminder policy.
//!
//! # Responsibility
//! - Hold tunables with defaults matching production behavior.
//! - Load overrides from a JSON file; absent keys keep their defaults.

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::model::activity::MAX_TITLE_CHARS;

/// Days ahead of extraction used for undated activities.
pub const DEFAULT_FALLBACK_DAYS: i64 = 30;

/// Tunables for one extraction pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Titles longer than this are truncated; never above `MAX_TITLE_CHARS`.
    pub max_title_chars: usize,
    /// Length cap for titles taken from a node's raw first text line.
    pub fallback_title_chars: usize,
    /// Days ahead used for the synthetic deadline.
    pub fallback_deadline_days: i64,
    /// Quiet period before a mutation burst triggers re-extraction.
    pub debounce_ms: u64,
    /// Offset applied to wall-clock dates that carry none.
    /// `None` uses the host zone's rules on each date's own day.
    pub utc_offset_minutes: Option<i32>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_title_chars: MAX_TITLE_CHARS,
            fallback_title_chars: 100,
            fallback_deadline_days: DEFAULT_FALLBACK_DAYS,
            debounce_ms: 1_000,
            utc_offset_minutes: None,
        }
    }
}

impl ExtractorConfig {
    /// Returns a config pinned to UTC wall-clock interpretation.
    pub fn utc() -> Self {
        Self {
            utc_offset_minutes: Some(0),
            ..Self::default()
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Fixed offset for naive dates, or `None` to follow the host zone.
    ///
    /// Out-of-range configured offsets fall back to UTC.
    pub fn fixed_offset(&self) -> Option<FixedOffset> {
        let minutes = self.utc_offset_minutes?;
        Some(FixedOffset::east_opt(minutes.saturating_mul(60)).unwrap_or_else(|| Utc.fix()))
    }

    /// Effective title cap; stored titles may not exceed `MAX_TITLE_CHARS`.
    pub fn title_limit(&self) -> usize {
        self.max_title_chars.min(MAX_TITLE_CHARS)
    }
}

/// Deadline reminder windows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderConfig {
    pub upcoming_window_hours: i64,
    pub overdue_window_hours: i64,
    /// How long before a deadline a one-shot notification fires.
    pub advance_notice_hours: i64,
    /// Whole days until deadline at or below which it counts as due soon.
    pub due_soon_days: i64,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            upcoming_window_hours: 24,
            overdue_window_hours: 24,
            advance_notice_hours: 24,
            due_soon_days: 2,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub extractor: ExtractorConfig,
    pub reminders: ReminderConfig,
}

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: serde_json::Error },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "invalid config `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
        }
    }
}

impl AppConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, ExtractorConfig};

    #[test]
    fn partial_json_keeps_defaults() {
        let config =
            AppConfig::from_json_str(r#"{"extractor":{"fallback_deadline_days":14}}"#).unwrap();
        assert_eq!(config.extractor.fallback_deadline_days, 14);
        assert_eq!(config.extractor.max_title_chars, 500);
        assert_eq!(config.reminders.upcoming_window_hours, 24);
    }

    #[test]
    fn configured_offset_wins_over_local() {
        let config = ExtractorConfig {
            utc_offset_minutes: Some(330),
            ..ExtractorConfig::default()
        };
        assert_eq!(config.fixed_offset().unwrap().local_minus_utc(), 330 * 60);
        assert!(ExtractorConfig::default().fixed_offset().is_none());
    }

    #[test]
    fn out_of_range_offset_falls_back_to_utc() {
        let config = ExtractorConfig {
            utc_offset_minutes: Some(100_000),
            ..ExtractorConfig::default()
        };
        assert_eq!(config.fixed_offset().unwrap().local_minus_utc(), 0);
    }

    #[test]
    fn title_limit_never_exceeds_store_cap() {
        let config = AppConfig::from_json_str(r#"{"extractor":{"max_title_chars":10000}}"#)
            .unwrap()
            .extractor;
        assert_eq!(config.title_limit(), 500);

        let short = ExtractorConfig {
            max_title_chars: 80,
            ..ExtractorConfig::default()
        };
        assert_eq!(short.title_limit(), 80);
    }
}
