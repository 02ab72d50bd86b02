//! Core logic for the LMS activity tracker.
//! Heuristic deadline extraction from course pages, plus the store and
//! reminder policy that consume its results.

pub mod config;
pub mod db;
pub mod extract;
pub mod logging;
pub mod message;
pub mod model;
pub mod reminder;
pub mod repo;
pub mod service;

pub use config::{AppConfig, ConfigError, ExtractorConfig, ReminderConfig};
pub use db::{open_db, open_db_in_memory, Connection, DbError, DbResult};
pub use extract::{
    ActivityList, DocumentAccessor, DomError, DomResult, Extractor, HtmlDocument, HtmlPage,
    PageWatcher,
};
pub use logging::{init_logging, logging_status, LogLevel, LoggingError};
pub use message::{handle_message, handle_request, ContentRequest, ContentResponse, SyncOutcome};
pub use model::activity::{
    Activity, ActivityId, ActivitySource, ActivityStatus, ActivityType, ActivityValidationError,
    NewActivity, Priority, UserId,
};
pub use model::extracted::ExtractedActivity;
pub use repo::activity_repo::{
    ActivityFilter, ActivityPatch, ActivityRepository, BulkUpdate, RepoError, RepoResult,
    SqliteActivityRepository,
};
pub use service::activity_service::{ActivityService, ImportFailure, ImportReport};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
