//! Deadline text normalization.
//!
//! # Responsibility
//! - Turn loosely formatted deadline text into an absolute timestamp.
//! - Provide the shared "looks like a date" heuristic.
//! - Compute the synthetic end-of-day fallback deadline.
//!
//! # Invariants
//! - Date-only input resolves to 23:59:59.999 of that day, never midnight.
//! - An explicit `HH:MM` component is kept as given.
//! - Wall-clock input without an offset is read in the caller's zone, using
//!   the rules in force on that date (a summer deadline gets summer time).
//! - Repeated local times take the earlier instant; skipped ones move past
//!   the gap.
//! - Numeric `A/B/YYYY` with `A > 12` is day-first, otherwise month-first.
//!   `03/04/2025` is therefore March 4; genuinely day-first dates with both
//!   parts <= 12 are misread. Kept for compatibility.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

const MIN_DIRECT_YEAR: i32 = 2001;
const MAX_DIRECT_YEAR: i32 = 2099;

static LEADING_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:due|deadline|submission|by|on|date)\b\s*:?\s*")
        .expect("valid leading label regex")
});
static TRAILING_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s+(?:due|deadline|submission|by|on)\b.*$")
        .expect("valid trailing label regex")
});
// Case-sensitive on purpose: only upper-case zone abbreviations (GMT, AEST).
static TRAILING_ZONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\b[A-Z]{3,4}\s*$").expect("valid zone regex"));
static TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|\D)(\d{1,2}):(\d{2})(?::(\d{2}))?(?:\s*([ap])\.?m\.?)?")
        .expect("valid time regex")
});
static NUMERIC_DMY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,2})[/\-](\d{1,2})[/\-](\d{4})").expect("valid numeric dmy regex")
});
static NUMERIC_YMD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{4})[/\-](\d{1,2})[/\-](\d{1,2})").expect("valid numeric ymd regex")
});
static TEXT_DAY_MONTH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d{1,2})\s+(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?,?\s+(\d{4})")
        .expect("valid day-month regex")
});
static TEXT_MONTH_DAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4})",
    )
    .expect("valid month-day regex")
});
static LOOKS_LIKE_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\d{1,2}[/\-]\d{1,2}[/\-]\d{2,4}|\d{4}[/\-]\d{1,2}[/\-]\d{1,2}|jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec",
    )
    .expect("valid date heuristic regex")
});

/// Layouts with a time component, tried during direct construction.
const DATETIME_LAYOUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%b %d, %Y %H:%M",
    "%b %d %Y %H:%M",
    "%d %b %Y %H:%M",
];

/// Date-only layouts; results move to end of day.
const DATE_LAYOUTS: &[&str] = &[
    "%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%m/%d/%y", "%b %d, %Y", "%b %d %Y", "%d %b %Y",
    "%A, %B %d, %Y",
];

/// Ordered structured patterns tried after direct construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DatePattern {
    NumericDayOrMonthFirst,
    NumericYearFirst,
    DayMonthName,
    MonthNameDay,
}

const DATE_PATTERNS: [DatePattern; 4] = [
    DatePattern::NumericDayOrMonthFirst,
    DatePattern::NumericYearFirst,
    DatePattern::DayMonthName,
    DatePattern::MonthNameDay,
];

impl DatePattern {
    fn regex(self) -> &'static Regex {
        match self {
            Self::NumericDayOrMonthFirst => &*NUMERIC_DMY_RE,
            Self::NumericYearFirst => &*NUMERIC_YMD_RE,
            Self::DayMonthName => &*TEXT_DAY_MONTH_RE,
            Self::MonthNameDay => &*TEXT_MONTH_DAY_RE,
        }
    }

    fn to_date(self, caps: &Captures<'_>) -> Option<NaiveDate> {
        let num = |index: usize| caps.get(index)?.as_str().parse::<u32>().ok();
        let year = |index: usize| caps.get(index)?.as_str().parse::<i32>().ok();
        match self {
            Self::NumericDayOrMonthFirst => {
                let (first, second, y) = (num(1)?, num(2)?, year(3)?);
                if first > 12 {
                    NaiveDate::from_ymd_opt(y, second, first)
                } else {
                    NaiveDate::from_ymd_opt(y, first, second)
                }
            }
            Self::NumericYearFirst => NaiveDate::from_ymd_opt(year(1)?, num(2)?, num(3)?),
            Self::DayMonthName => {
                NaiveDate::from_ymd_opt(year(3)?, month_number(caps.get(2)?.as_str())?, num(1)?)
            }
            Self::MonthNameDay => {
                NaiveDate::from_ymd_opt(year(3)?, month_number(caps.get(1)?.as_str())?, num(2)?)
            }
        }
    }
}

/// Returns whether `text` carries something date-shaped.
pub fn looks_like_date(text: &str) -> bool {
    LOOKS_LIKE_DATE_RE.is_match(text)
}

/// Parses raw deadline text into an absolute timestamp.
///
/// Returns `None` when every attempt fails; callers own the fallback policy.
pub fn normalize_deadline<Tz: TimeZone>(raw: &str, zone: &Tz) -> Option<DateTime<Utc>> {
    let cleaned = clean_label_text(raw);
    if cleaned.is_empty() {
        return None;
    }

    if let Some(direct) = parse_direct(&cleaned, zone) {
        if (MIN_DIRECT_YEAR..=MAX_DIRECT_YEAR).contains(&direct.with_timezone(zone).year()) {
            return Some(direct);
        }
    }

    for pattern in DATE_PATTERNS {
        let Some(caps) = pattern.regex().captures(&cleaned) else {
            continue;
        };
        let Some(date) = pattern.to_date(&caps) else {
            // Impossible calendar triplet (31/02); the next pattern may still fit.
            continue;
        };
        let time = explicit_time(&cleaned).unwrap_or_else(end_of_day);
        return to_utc(date.and_time(time), zone);
    }

    parse_direct(&cleaned, zone)
}

/// "`days` from `now`, end of day" in `zone`.
///
/// `None` when the target day is outside the representable calendar.
pub fn fallback_deadline<Tz: TimeZone>(
    now: DateTime<Utc>,
    days: i64,
    zone: &Tz,
) -> Option<DateTime<Utc>> {
    let span = Duration::try_days(days)?;
    let local_day = now.with_timezone(zone).date_naive().checked_add_signed(span)?;
    to_utc(local_day.and_time(end_of_day()), zone)
}

/// Strips label words and a trailing zone abbreviation.
pub fn clean_label_text(raw: &str) -> String {
    let mut cleaned = raw.trim().to_string();
    loop {
        let stripped = LEADING_LABEL_RE.replace(&cleaned, "").into_owned();
        if stripped == cleaned {
            break;
        }
        cleaned = stripped;
    }
    let cleaned = TRAILING_LABEL_RE.replace(&cleaned, "");
    let cleaned = TRAILING_ZONE_RE.replace(&cleaned, "");
    cleaned.trim().to_string()
}

fn parse_direct<Tz: TimeZone>(cleaned: &str, zone: &Tz) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(cleaned) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc2822(cleaned) {
        return Some(parsed.with_timezone(&Utc));
    }
    for layout in DATETIME_LAYOUTS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(cleaned, layout) {
            return to_utc(naive, zone);
        }
    }
    for layout in DATE_LAYOUTS {
        if let Ok(date) = NaiveDate::parse_from_str(cleaned, layout) {
            return to_utc(date.and_time(end_of_day()), zone);
        }
    }
    None
}

fn explicit_time(text: &str) -> Option<NaiveTime> {
    let caps = TIME_RE.captures(text)?;
    let mut hour = caps.get(1)?.as_str().parse::<u32>().ok()?;
    let minute = caps.get(2)?.as_str().parse::<u32>().ok()?;
    let second = match caps.get(3) {
        Some(value) => value.as_str().parse::<u32>().ok()?,
        None => 0,
    };
    if let Some(meridiem) = caps.get(4) {
        let pm = meridiem.as_str().eq_ignore_ascii_case("p");
        hour = match (hour, pm) {
            (12, false) => 0,
            (12, true) => 12,
            (h, true) => h + 12,
            (h, false) => h,
        };
    }
    NaiveTime::from_hms_opt(hour, minute, second)
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN)
}

fn to_utc<Tz: TimeZone>(naive: NaiveDateTime, zone: &Tz) -> Option<DateTime<Utc>> {
    zone.from_local_datetime(&naive)
        .earliest()
        .or_else(|| {
            // Skipped by a forward transition.
            let shifted = naive.checked_add_signed(Duration::hours(1))?;
            zone.from_local_datetime(&shifted).earliest()
        })
        .map(|local| local.with_timezone(&Utc))
}

fn month_number(name: &str) -> Option<u32> {
    let prefix = name.get(..3)?.to_ascii_lowercase();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}
