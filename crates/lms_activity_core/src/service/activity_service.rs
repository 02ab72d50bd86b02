//! Activity use-case service.
//!
//! # Responsibility
//! - Provide stable CRUD entry points for core callers.
//! - Turn user-confirmed extraction results into stored activities.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - One failing import item never aborts the rest of the batch.

use crate::model::activity::{Activity, ActivityId, NewActivity, UserId};
use crate::model::extracted::ExtractedActivity;
use crate::repo::activity_repo::{
    ActivityFilter, ActivityPatch, ActivityRepository, BulkUpdate, RepoResult,
};
use log::{info, warn};

/// Use-case service wrapper for activity persistence.
pub struct ActivityService<R: ActivityRepository> {
    repo: R,
}

/// One extracted item that could not be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFailure {
    pub title: String,
    pub reason: String,
}

/// Outcome of importing a batch of extracted activities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: Vec<Activity>,
    pub failed: Vec<ImportFailure>,
}

impl ImportReport {
    pub fn imported_count(&self) -> usize {
        self.imported.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }
}

impl<R: ActivityRepository> ActivityService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one activity from manual or quick-add input.
    pub fn add_activity(&self, user_id: UserId, input: &NewActivity) -> RepoResult<Activity> {
        self.repo.create_activity(user_id, input)
    }

    /// Stores every extracted activity as `pending` / `medium`.
    ///
    /// Per-item failures are collected in the report.
    pub fn import_extracted(&self, user_id: UserId, items: &[ExtractedActivity]) -> ImportReport {
        let mut report = ImportReport::default();
        for item in items {
            let input = NewActivity::from_extracted(item);
            match self.repo.create_activity(user_id, &input) {
                Ok(activity) => report.imported.push(activity),
                Err(err) => {
                    warn!(
                        "event=activity_import module=service status=error source={} error={}",
                        item.source.as_str(),
                        err
                    );
                    report.failed.push(ImportFailure {
                        title: item.title.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }
        info!(
            "event=activity_import module=service status=ok imported={} failed={}",
            report.imported_count(),
            report.failed_count()
        );
        report
    }

    pub fn get_activity(&self, user_id: UserId, id: ActivityId) -> RepoResult<Option<Activity>> {
        self.repo.get_activity(user_id, id)
    }

    pub fn list_activities(
        &self,
        user_id: UserId,
        filter: &ActivityFilter,
    ) -> RepoResult<Vec<Activity>> {
        self.repo.list_activities(user_id, filter)
    }

    pub fn update_activity(
        &self,
        user_id: UserId,
        id: ActivityId,
        patch: &ActivityPatch,
    ) -> RepoResult<Activity> {
        self.repo.update_activity(user_id, id, patch)
    }

    pub fn delete_activity(&self, user_id: UserId, id: ActivityId) -> RepoResult<()> {
        self.repo.delete_activity(user_id, id)
    }

    pub fn bulk_update(
        &self,
        user_id: UserId,
        ids: &[ActivityId],
        update: BulkUpdate,
    ) -> RepoResult<Vec<Activity>> {
        self.repo.bulk_update(user_id, ids, update)
    }
}
