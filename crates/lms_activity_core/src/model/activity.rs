//! Activity domain model.
//!
//! # Responsibility
//! - Define the durable record for assignments, quizzes, exams and friends.
//! - Provide the input shape used when creating activities.
//!
//! # Invariants
//! - `id` is stable and never reused for another activity.
//! - `title` is non-empty after trimming and at most `MAX_TITLE_CHARS` chars.
//! - `completed_at` is set whenever `status == Completed` was last applied.

use crate::model::extracted::ExtractedActivity;
use crate::model::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a stored activity.
pub type ActivityId = Uuid;

/// Opaque authenticated user id supplied by the caller.
pub type UserId = i64;

/// Upper bound on title length, in characters.
pub const MAX_TITLE_CHARS: usize = 500;

/// Closed set of activity categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Assignment,
    Quiz,
    Exam,
    Project,
    Reading,
    #[default]
    Other,
}

impl ActivityType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Assignment => "assignment",
            Self::Quiz => "quiz",
            Self::Exam => "exam",
            Self::Project => "project",
            Self::Reading => "reading",
            Self::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "assignment" => Some(Self::Assignment),
            "quiz" => Some(Self::Quiz),
            "exam" => Some(Self::Exam),
            "project" => Some(Self::Project),
            "reading" => Some(Self::Reading),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Lifecycle state of a stored activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl ActivityStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// Provenance tag kept for downstream bookkeeping only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivitySource {
    /// Scraped from a generic activity element on an LMS page.
    LmsExtracted,
    /// Scraped from a row of a tabular LMS view.
    LmsTable,
    /// Entered through the quick-add dialog while on an LMS page.
    LmsPage,
    /// Entered by hand outside any LMS page.
    #[default]
    Manual,
}

impl ActivitySource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LmsExtracted => "lms_extracted",
            Self::LmsTable => "lms_table",
            Self::LmsPage => "lms_page",
            Self::Manual => "manual",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "lms_extracted" => Some(Self::LmsExtracted),
            "lms_table" => Some(Self::LmsTable),
            "lms_page" => Some(Self::LmsPage),
            "manual" => Some(Self::Manual),
            _ => None,
        }
    }
}

/// Validation failures for activity input and persisted rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityValidationError {
    EmptyTitle,
    TitleTooLong { chars: usize },
}

impl Display for ActivityValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title is required"),
            Self::TitleTooLong { chars } => write!(
                f,
                "title has {chars} characters; at most {MAX_TITLE_CHARS} are allowed"
            ),
        }
    }
}

impl Error for ActivityValidationError {}

fn validate_title(title: &str) -> Result<(), ActivityValidationError> {
    if title.trim().is_empty() {
        return Err(ActivityValidationError::EmptyTitle);
    }
    let chars = title.chars().count();
    if chars > MAX_TITLE_CHARS {
        return Err(ActivityValidationError::TitleTooLong { chars });
    }
    Ok(())
}

/// Input for creating a stored activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewActivity {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ActivityType,
    #[serde(with = "timestamp")]
    pub deadline: DateTime<Utc>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: ActivityStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub source: ActivitySource,
}

impl NewActivity {
    /// Creates a pending, medium-priority, manually entered activity.
    pub fn new(title: impl Into<String>, kind: ActivityType, deadline: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            kind,
            deadline,
            description: String::new(),
            status: ActivityStatus::Pending,
            priority: Priority::Medium,
            url: None,
            source: ActivitySource::Manual,
        }
    }

    /// Maps a user-confirmed extraction result to store input.
    ///
    /// Imported activities always start as `pending` with `medium` priority.
    pub fn from_extracted(extracted: &ExtractedActivity) -> Self {
        Self {
            title: extracted.title.clone(),
            kind: extracted.kind,
            deadline: extracted.deadline,
            description: extracted.description.clone(),
            status: ActivityStatus::Pending,
            priority: Priority::Medium,
            url: (!extracted.url.is_empty()).then(|| extracted.url.clone()),
            source: extracted.source,
        }
    }

    pub fn validate(&self) -> Result<(), ActivityValidationError> {
        validate_title(&self.title)
    }
}

/// Durable activity record owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    pub user_id: UserId,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ActivityType,
    #[serde(with = "timestamp")]
    pub deadline: DateTime<Utc>,
    pub description: String,
    pub status: ActivityStatus,
    pub priority: Priority,
    pub url: Option<String>,
    pub source: ActivitySource,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
    #[serde(with = "timestamp::option")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Activity {
    /// Materializes a new record with a generated id.
    pub fn from_new(user_id: UserId, input: &NewActivity, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: input.title.trim().to_string(),
            kind: input.kind,
            deadline: timestamp::truncate(input.deadline),
            description: input.description.clone(),
            status: input.status,
            priority: input.priority,
            url: input.url.clone(),
            source: input.source,
            created_at: now,
            updated_at: now,
            completed_at: (input.status == ActivityStatus::Completed).then_some(now),
        }
    }

    pub fn validate(&self) -> Result<(), ActivityValidationError> {
        validate_title(&self.title)
    }

    /// Pending activities are the only ones reminders and badges count.
    pub fn is_pending(&self) -> bool {
        self.status == ActivityStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Activity, ActivitySource, ActivityStatus, ActivityType, ActivityValidationError,
        NewActivity, Priority, MAX_TITLE_CHARS,
    };
    use chrono::{TimeZone, Utc};

    #[test]
    fn enum_text_forms_round_trip() {
        for kind in [
            ActivityType::Assignment,
            ActivityType::Quiz,
            ActivityType::Exam,
            ActivityType::Project,
            ActivityType::Reading,
            ActivityType::Other,
        ] {
            assert_eq!(ActivityType::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ActivityStatus::parse("in_progress"), Some(ActivityStatus::InProgress));
        assert_eq!(Priority::parse("urgent"), None);
        assert_eq!(ActivitySource::parse("lms_table"), Some(ActivitySource::LmsTable));
    }

    #[test]
    fn validate_rejects_blank_and_oversized_titles() {
        let deadline = Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap();
        let blank = NewActivity::new("   ", ActivityType::Quiz, deadline);
        assert_eq!(blank.validate(), Err(ActivityValidationError::EmptyTitle));

        let long = NewActivity::new("x".repeat(MAX_TITLE_CHARS + 1), ActivityType::Quiz, deadline);
        assert_eq!(
            long.validate(),
            Err(ActivityValidationError::TitleTooLong {
                chars: MAX_TITLE_CHARS + 1
            })
        );
    }

    #[test]
    fn from_new_stamps_completion_for_completed_input() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
        let mut input = NewActivity::new(" Lab 2 ", ActivityType::Assignment, now);
        input.status = ActivityStatus::Completed;

        let activity = Activity::from_new(7, &input, now);
        assert_eq!(activity.title, "Lab 2");
        assert_eq!(activity.completed_at, Some(now));
        assert_eq!(activity.created_at, activity.updated_at);
    }
}
