//! Candidate element location.
//!
//! Each pattern is evaluated on its own. A failing pattern is logged and
//! yields no nodes; the cascade always continues with the next one.

use crate::extract::dom::DocumentAccessor;
use log::{debug, warn};

/// Generic activity patterns, most specific first.
pub const ACTIVITY_PATTERNS: &[&str] = &[
    ".activity.modtype_assign, .activity.modtype_quiz, .activity.modtype_assignment",
    ".modtype_assign, .modtype_quiz, .modtype_assignment",
    r#"[data-mod="assign"], [data-mod="quiz"], [data-mod="assignment"]"#,
    r#".course-content ul li[class*="modtype"]"#,
    ".section li.activity, .section li[data-modid]",
    ".activity, .assignment, .quiz, .course-item, .event-item",
    r#"[class*="assignment"], [class*="quiz"], [class*="deadline"]"#,
    ".event, .deadline-item, .due-item",
    r#"li[class*="assign"], li[class*="quiz"], li[class*="deadline"]"#,
    ".block_calendar_month .event, .block_calendar_upcoming .event",
];

pub const CALENDAR_PATTERN: &str = r#".calendar_event, .event, .fc-event, [class*="event"]"#;
pub const TIMELINE_PATTERN: &str = r#".timeline-item, .upcoming-event, [class*="timeline"]"#;
pub const TABLE_PATTERN: &str = "table, .table";
pub const TABLE_ROW_PATTERN: &str = "tr";
pub const UPCOMING_BLOCK_PATTERN: &str =
    r#".block_calendar_upcoming, .block_timeline, [id*="calendar"]"#;
pub const UPCOMING_EVENT_PATTERN: &str = r#".event, .event_title, a[href*="mod"]"#;

/// Evaluates one document-wide pattern.
///
/// Never fails: selector errors are logged and produce an empty list.
pub fn locate<D: DocumentAccessor>(doc: &D, pattern: &str) -> Vec<D::Node> {
    match doc.select_all(pattern) {
        Ok(nodes) => {
            debug!(
                "event=locate module=extract status=ok pattern={:?} matches={}",
                pattern,
                nodes.len()
            );
            nodes
        }
        Err(err) => {
            warn!(
                "event=locate module=extract status=error pattern={:?} error={}",
                pattern, err
            );
            Vec::new()
        }
    }
}

/// Evaluates a pattern inside each scope matched by `scope_pattern`.
///
/// A failure inside one scope skips only that scope.
pub fn locate_nested<D: DocumentAccessor>(
    doc: &D,
    scope_pattern: &str,
    inner_pattern: &str,
) -> Vec<D::Node> {
    let mut nodes = Vec::new();
    for scope in locate(doc, scope_pattern) {
        match doc.select_within(scope, inner_pattern) {
            Ok(found) => nodes.extend(found),
            Err(err) => warn!(
                "event=locate module=extract status=error pattern={:?} scope={:?} error={}",
                inner_pattern, scope_pattern, err
            ),
        }
    }
    nodes
}
