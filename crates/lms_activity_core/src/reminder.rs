//! Deadline reminder policy.
//!
//! # Responsibility
//! - Decide which stored activities deserve a reminder right now.
//! - Compute one-shot notification times, badge counts and urgency levels.
//!
//! # Invariants
//! - Only `pending` activities produce reminders or count toward the badge.
//! - All functions are pure; scheduling and display belong to callers.

use crate::config::ReminderConfig;
use crate::model::activity::{Activity, ActivityId};
use chrono::{DateTime, Duration, Utc};

const MS_PER_HOUR: f64 = 3_600_000.0;
const MS_PER_DAY: i64 = 86_400_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderKind {
    Upcoming,
    Overdue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub activity_id: ActivityId,
    pub kind: ReminderKind,
    pub title: String,
    pub message: String,
}

/// Visual urgency of a deadline relative to now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Overdue,
    DueSoon,
    Normal,
}

/// Reminders for pending activities inside the upcoming or overdue window.
pub fn due_reminders(
    activities: &[Activity],
    now: DateTime<Utc>,
    config: &ReminderConfig,
) -> Vec<Reminder> {
    let upcoming = config.upcoming_window_hours as f64;
    let overdue = config.overdue_window_hours as f64;

    activities
        .iter()
        .filter(|activity| activity.is_pending())
        .filter_map(|activity| {
            let hours = hours_until(activity.deadline, now);
            if hours > 0.0 && hours <= upcoming {
                Some(Reminder {
                    activity_id: activity.id,
                    kind: ReminderKind::Upcoming,
                    title: "Upcoming Deadline!".to_string(),
                    message: format!("{} is due in {}", activity.title, format_time_until(hours)),
                })
            } else if hours < 0.0 && hours > -overdue {
                Some(Reminder {
                    activity_id: activity.id,
                    kind: ReminderKind::Overdue,
                    title: "Overdue Activity!".to_string(),
                    message: format!(
                        "{} was due {} ago",
                        activity.title,
                        format_time_until(hours.abs())
                    ),
                })
            } else {
                None
            }
        })
        .collect()
}

/// Human phrasing of a non-negative number of hours.
pub fn format_time_until(hours: f64) -> String {
    if hours < 1.0 {
        let minutes = (hours * 60.0).round() as i64;
        return format!("{minutes} minutes");
    }
    if hours < 24.0 {
        let whole = hours.round() as i64;
        return format!("{whole} hour{}", plural(whole));
    }
    let days = (hours / 24.0).round() as i64;
    format!("{days} day{}", plural(days))
}

/// When a one-shot advance notice should fire, if still in the future.
///
/// A notice window outside the representable range schedules nothing.
pub fn notification_time(
    deadline: DateTime<Utc>,
    now: DateTime<Utc>,
    config: &ReminderConfig,
) -> Option<DateTime<Utc>> {
    let notice = Duration::try_hours(config.advance_notice_hours)?;
    let fire_at = deadline.checked_sub_signed(notice)?;
    (fire_at > now).then_some(fire_at)
}

pub fn pending_badge_count(activities: &[Activity]) -> usize {
    activities.iter().filter(|activity| activity.is_pending()).count()
}

/// Badge text; empty when nothing is pending.
pub fn badge_text(activities: &[Activity]) -> String {
    match pending_badge_count(activities) {
        0 => String::new(),
        count => count.to_string(),
    }
}

pub fn deadline_urgency(
    deadline: DateTime<Utc>,
    now: DateTime<Utc>,
    config: &ReminderConfig,
) -> Urgency {
    let days_until = (deadline - now).num_milliseconds().div_euclid(MS_PER_DAY);
    if days_until < 0 {
        Urgency::Overdue
    } else if days_until <= config.due_soon_days {
        Urgency::DueSoon
    } else {
        Urgency::Normal
    }
}

fn hours_until(deadline: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (deadline - now).num_milliseconds() as f64 / MS_PER_HOUR
}

fn plural(count: i64) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
mod tests {
    use super::{
        badge_text, deadline_urgency, due_reminders, format_time_until, notification_time,
        ReminderKind, Urgency,
    };
    use crate::config::ReminderConfig;
    use crate::model::activity::{Activity, ActivityStatus, ActivityType, NewActivity};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    fn stored(title: &str, deadline: DateTime<Utc>, status: ActivityStatus) -> Activity {
        let mut input = NewActivity::new(title, ActivityType::Assignment, deadline);
        input.status = status;
        Activity::from_new(1, &input, now())
    }

    #[test]
    fn formats_minutes_hours_and_days() {
        assert_eq!(format_time_until(0.75), "45 minutes");
        assert_eq!(format_time_until(1.2), "1 hour");
        assert_eq!(format_time_until(5.0), "5 hours");
        assert_eq!(format_time_until(49.0), "2 days");
        assert_eq!(format_time_until(30.0), "1 day");
    }

    #[test]
    fn reminders_cover_upcoming_and_recently_overdue_pending_only() {
        let config = ReminderConfig::default();
        let activities = vec![
            stored("Essay", now() + Duration::hours(3), ActivityStatus::Pending),
            stored("Quiz", now() - Duration::hours(2), ActivityStatus::Pending),
            stored("Old", now() - Duration::hours(30), ActivityStatus::Pending),
            stored("Later", now() + Duration::days(3), ActivityStatus::Pending),
            stored("Done", now() + Duration::hours(1), ActivityStatus::Completed),
        ];

        let reminders = due_reminders(&activities, now(), &config);
        assert_eq!(reminders.len(), 2);
        assert_eq!(reminders[0].kind, ReminderKind::Upcoming);
        assert_eq!(reminders[0].message, "Essay is due in 3 hours");
        assert_eq!(reminders[1].kind, ReminderKind::Overdue);
        assert_eq!(reminders[1].message, "Quiz was due 2 hours ago");
    }

    #[test]
    fn notification_only_scheduled_in_the_future() {
        let config = ReminderConfig::default();
        let far = now() + Duration::days(3);
        assert_eq!(
            notification_time(far, now(), &config),
            Some(far - Duration::hours(24))
        );
        assert_eq!(notification_time(now() + Duration::hours(5), now(), &config), None);
    }

    #[test]
    fn oversized_notice_window_schedules_nothing() {
        let config = ReminderConfig {
            advance_notice_hours: i64::MAX,
            ..ReminderConfig::default()
        };
        assert_eq!(notification_time(now() + Duration::days(3), now(), &config), None);

        let negative = ReminderConfig {
            advance_notice_hours: -9_000_000_000_000,
            ..ReminderConfig::default()
        };
        assert_eq!(notification_time(now(), now(), &negative), None);
    }

    #[test]
    fn urgency_levels() {
        let config = ReminderConfig::default();
        assert_eq!(
            deadline_urgency(now() - Duration::hours(1), now(), &config),
            Urgency::Overdue
        );
        assert_eq!(
            deadline_urgency(now() + Duration::hours(60), now(), &config),
            Urgency::DueSoon
        );
        assert_eq!(
            deadline_urgency(now() + Duration::days(5), now(), &config),
            Urgency::Normal
        );
    }

    #[test]
    fn badge_is_blank_without_pending_work() {
        let done = stored("Done", now(), ActivityStatus::Completed);
        assert_eq!(badge_text(&[done.clone()]), "");
        let pending = stored("Todo", now(), ActivityStatus::Pending);
        assert_eq!(badge_text(&[done, pending]), "1");
    }
}
