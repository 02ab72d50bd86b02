//! Activity repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide user-scoped CRUD and filter APIs over the `activities` table.
//! - Keep SQL details inside the storage boundary.
//!
//! # Invariants
//! - Every query is scoped by `user_id`; other users' rows are invisible.
//! - Write paths validate before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::activity::{
    Activity, ActivityId, ActivitySource, ActivityStatus, ActivityType, ActivityValidationError,
    NewActivity, Priority, UserId,
};
use crate::model::timestamp;
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const ACTIVITY_SELECT_SQL: &str = "SELECT
    id,
    user_id,
    title,
    type,
    deadline,
    description,
    status,
    priority,
    url,
    source,
    created_at,
    updated_at,
    completed_at
FROM activities";

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    Validation(ActivityValidationError),
    Db(DbError),
    NotFound(ActivityId),
    /// Update request carried no field to change.
    EmptyUpdate,
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "activity not found: {id}"),
            Self::EmptyUpdate => write!(f, "no fields to update"),
            Self::InvalidData(message) => write!(f, "invalid persisted activity data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::EmptyUpdate | Self::InvalidData(_) => None,
        }
    }
}

impl From<ActivityValidationError> for RepoError {
    fn from(value: ActivityValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Query(value))
    }
}

/// Optional filters for listing; results are ordered by deadline ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityFilter {
    pub status: Option<ActivityStatus>,
    pub kind: Option<ActivityType>,
    pub priority: Option<Priority>,
    /// Inclusive lower bound on `deadline`.
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `deadline`.
    pub to: Option<DateTime<Utc>>,
}

/// Partial update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityPatch {
    pub title: Option<String>,
    pub kind: Option<ActivityType>,
    pub deadline: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<ActivityStatus>,
    pub url: Option<String>,
}

impl ActivityPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.kind.is_none()
            && self.deadline.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.status.is_none()
            && self.url.is_none()
    }

    fn apply(&self, activity: &mut Activity, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            activity.title = title.trim().to_string();
        }
        if let Some(kind) = self.kind {
            activity.kind = kind;
        }
        if let Some(deadline) = self.deadline {
            activity.deadline = timestamp::truncate(deadline);
        }
        if let Some(description) = &self.description {
            activity.description = description.clone();
        }
        if let Some(priority) = self.priority {
            activity.priority = priority;
        }
        if let Some(status) = self.status {
            activity.status = status;
            if status == ActivityStatus::Completed {
                activity.completed_at = Some(now);
            }
        }
        if let Some(url) = &self.url {
            activity.url = Some(url.clone());
        }
        activity.updated_at = now;
    }
}

/// Status/priority change applied to many activities at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkUpdate {
    pub status: Option<ActivityStatus>,
    pub priority: Option<Priority>,
}

impl BulkUpdate {
    fn as_patch(self) -> ActivityPatch {
        ActivityPatch {
            status: self.status,
            priority: self.priority,
            ..ActivityPatch::default()
        }
    }
}

/// Repository interface for user-owned activities.
pub trait ActivityRepository {
    fn create_activity(&self, user_id: UserId, input: &NewActivity) -> RepoResult<Activity>;
    fn get_activity(&self, user_id: UserId, id: ActivityId) -> RepoResult<Option<Activity>>;
    fn list_activities(&self, user_id: UserId, filter: &ActivityFilter)
        -> RepoResult<Vec<Activity>>;
    fn update_activity(
        &self,
        user_id: UserId,
        id: ActivityId,
        patch: &ActivityPatch,
    ) -> RepoResult<Activity>;
    fn delete_activity(&self, user_id: UserId, id: ActivityId) -> RepoResult<()>;
    /// Returns only the rows that exist for this user, in `ids` order.
    fn bulk_update(
        &self,
        user_id: UserId,
        ids: &[ActivityId],
        update: BulkUpdate,
    ) -> RepoResult<Vec<Activity>>;
}

/// SQLite-backed activity repository.
pub struct SqliteActivityRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteActivityRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn write_row(&self, activity: &Activity) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "UPDATE activities
             SET
                title = ?1,
                type = ?2,
                deadline = ?3,
                description = ?4,
                status = ?5,
                priority = ?6,
                url = ?7,
                updated_at = ?8,
                completed_at = ?9
             WHERE id = ?10 AND user_id = ?11;",
            params![
                activity.title.as_str(),
                activity.kind.as_str(),
                timestamp::format(&activity.deadline),
                activity.description.as_str(),
                activity.status.as_str(),
                activity.priority.as_str(),
                activity.url.as_deref(),
                timestamp::format(&activity.updated_at),
                activity.completed_at.as_ref().map(timestamp::format),
                activity.id.to_string(),
                activity.user_id,
            ],
        )?;
        Ok(changed)
    }
}

impl ActivityRepository for SqliteActivityRepository<'_> {
    fn create_activity(&self, user_id: UserId, input: &NewActivity) -> RepoResult<Activity> {
        input.validate()?;
        let activity = Activity::from_new(user_id, input, timestamp::now());
        activity.validate()?;

        self.conn.execute(
            "INSERT INTO activities (
                id,
                user_id,
                title,
                type,
                deadline,
                description,
                status,
                priority,
                url,
                source,
                created_at,
                updated_at,
                completed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13);",
            params![
                activity.id.to_string(),
                activity.user_id,
                activity.title.as_str(),
                activity.kind.as_str(),
                timestamp::format(&activity.deadline),
                activity.description.as_str(),
                activity.status.as_str(),
                activity.priority.as_str(),
                activity.url.as_deref(),
                activity.source.as_str(),
                timestamp::format(&activity.created_at),
                timestamp::format(&activity.updated_at),
                activity.completed_at.as_ref().map(timestamp::format),
            ],
        )?;

        Ok(activity)
    }

    fn get_activity(&self, user_id: UserId, id: ActivityId) -> RepoResult<Option<Activity>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ACTIVITY_SELECT_SQL} WHERE id = ?1 AND user_id = ?2;"
        ))?;
        let raw = stmt
            .query_row(params![id.to_string(), user_id], RawActivity::from_row)
            .optional()?;
        raw.map(RawActivity::into_activity).transpose()
    }

    fn list_activities(
        &self,
        user_id: UserId,
        filter: &ActivityFilter,
    ) -> RepoResult<Vec<Activity>> {
        let mut sql = format!("{ACTIVITY_SELECT_SQL} WHERE user_id = ?");
        let mut bind_values: Vec<Value> = vec![Value::Integer(user_id)];

        if let Some(status) = filter.status {
            sql.push_str(" AND status = ?");
            bind_values.push(Value::Text(status.as_str().to_string()));
        }
        if let Some(kind) = filter.kind {
            sql.push_str(" AND type = ?");
            bind_values.push(Value::Text(kind.as_str().to_string()));
        }
        if let Some(priority) = filter.priority {
            sql.push_str(" AND priority = ?");
            bind_values.push(Value::Text(priority.as_str().to_string()));
        }
        if let Some(from) = filter.from {
            sql.push_str(" AND deadline >= ?");
            bind_values.push(Value::Text(timestamp::format(&from)));
        }
        if let Some(to) = filter.to {
            sql.push_str(" AND deadline <= ?");
            bind_values.push(Value::Text(timestamp::format(&to)));
        }
        sql.push_str(" ORDER BY deadline ASC, created_at ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let raw_rows = stmt
            .query_map(params_from_iter(bind_values), RawActivity::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        raw_rows
            .into_iter()
            .map(RawActivity::into_activity)
            .collect()
    }

    fn update_activity(
        &self,
        user_id: UserId,
        id: ActivityId,
        patch: &ActivityPatch,
    ) -> RepoResult<Activity> {
        if patch.is_empty() {
            return Err(RepoError::EmptyUpdate);
        }
        let mut activity = self
            .get_activity(user_id, id)?
            .ok_or(RepoError::NotFound(id))?;
        patch.apply(&mut activity, timestamp::now());
        activity.validate()?;

        if self.write_row(&activity)? == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(activity)
    }

    fn delete_activity(&self, user_id: UserId, id: ActivityId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM activities WHERE id = ?1 AND user_id = ?2;",
            params![id.to_string(), user_id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn bulk_update(
        &self,
        user_id: UserId,
        ids: &[ActivityId],
        update: BulkUpdate,
    ) -> RepoResult<Vec<Activity>> {
        let patch = update.as_patch();
        if patch.is_empty() {
            return Err(RepoError::EmptyUpdate);
        }

        let tx = self.conn.unchecked_transaction()?;
        let now = timestamp::now();
        let mut updated = Vec::with_capacity(ids.len());
        for id in ids {
            let Some(mut activity) = self.get_activity(user_id, *id)? else {
                continue;
            };
            patch.apply(&mut activity, now);
            self.write_row(&activity)?;
            updated.push(activity);
        }
        tx.commit()?;

        Ok(updated)
    }
}

/// Column values read before enum/timestamp decoding.
struct RawActivity {
    id: String,
    user_id: UserId,
    title: String,
    kind: String,
    deadline: String,
    description: String,
    status: String,
    priority: String,
    url: Option<String>,
    source: String,
    created_at: String,
    updated_at: String,
    completed_at: Option<String>,
}

impl RawActivity {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            title: row.get("title")?,
            kind: row.get("type")?,
            deadline: row.get("deadline")?,
            description: row.get("description")?,
            status: row.get("status")?,
            priority: row.get("priority")?,
            url: row.get("url")?,
            source: row.get("source")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
            completed_at: row.get("completed_at")?,
        })
    }

    fn into_activity(self) -> RepoResult<Activity> {
        let id = Uuid::parse_str(&self.id).map_err(|_| {
            RepoError::InvalidData(format!("invalid id `{}` in activities.id", self.id))
        })?;
        let kind = ActivityType::parse(&self.kind)
            .ok_or_else(|| invalid("type", &self.kind))?;
        let status = ActivityStatus::parse(&self.status)
            .ok_or_else(|| invalid("status", &self.status))?;
        let priority =
            Priority::parse(&self.priority).ok_or_else(|| invalid("priority", &self.priority))?;
        let source =
            ActivitySource::parse(&self.source).ok_or_else(|| invalid("source", &self.source))?;
        let completed_at = match self.completed_at.as_deref() {
            Some(value) => Some(parse_column("completed_at", value)?),
            None => None,
        };

        let activity = Activity {
            id,
            user_id: self.user_id,
            title: self.title,
            kind,
            deadline: parse_column("deadline", &self.deadline)?,
            description: self.description,
            status,
            priority,
            url: self.url,
            source,
            created_at: parse_column("created_at", &self.created_at)?,
            updated_at: parse_column("updated_at", &self.updated_at)?,
            completed_at,
        };
        activity.validate()?;
        Ok(activity)
    }
}

fn parse_column(column: &str, value: &str) -> RepoResult<DateTime<Utc>> {
    timestamp::parse(value).ok_or_else(|| invalid(column, value))
}

fn invalid(column: &str, value: &str) -> RepoError {
    RepoError::InvalidData(format!("invalid value `{value}` in activities.{column}"))
}
