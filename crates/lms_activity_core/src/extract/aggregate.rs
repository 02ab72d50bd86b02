//! Extraction pass orchestration and deduplication.
//!
//! # Responsibility
//! - Run the generic locator cascade and the supplementary sweeps.
//! - Apply the default-deadline policy so every record has a deadline.
//! - Merge everything into one insertion-ordered, duplicate-free list.
//!
//! # Invariants
//! - No two results share both `title` and `deadline`.
//! - Supplementary sweeps skip any record whose `title` is already present.
//! - Per-node failures are logged and skipped; a pass never fails as a whole.
//! - One clock reading per pass: all fallback deadlines in a pass are equal.
//! - Naive dates follow the configured fixed offset, else the host zone.

use crate::config::{ExtractorConfig, DEFAULT_FALLBACK_DAYS};
use crate::extract::date::{fallback_deadline, normalize_deadline};
use crate::extract::dom::DocumentAccessor;
use crate::extract::fields::{
    extract_fields, extract_table_row, find_bare_date_near_keyword, CandidateFields,
};
use crate::extract::locator::{
    locate, locate_nested, ACTIVITY_PATTERNS, CALENDAR_PATTERN, TABLE_PATTERN, TABLE_ROW_PATTERN,
    TIMELINE_PATTERN, UPCOMING_BLOCK_PATTERN, UPCOMING_EVENT_PATTERN,
};
use crate::model::activity::ActivitySource;
use crate::model::extracted::ExtractedActivity;
use chrono::{DateTime, Local, TimeZone, Utc};
use log::{debug, info, warn};
use std::time::Instant;

const MIN_TABLE_CELLS: usize = 2;

/// Insertion-ordered activity list enforcing the dedup contract.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityList {
    items: Vec<ExtractedActivity>,
}

impl ActivityList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a list from candidates using the full `(title, deadline)` key.
    pub fn from_candidates(candidates: impl IntoIterator<Item = ExtractedActivity>) -> Self {
        let mut list = Self::new();
        for candidate in candidates {
            list.push_unique(candidate);
        }
        list
    }

    /// Adds unless an entry matches on both title and deadline.
    pub fn push_unique(&mut self, activity: ExtractedActivity) -> bool {
        if self.items.iter().any(|existing| existing.same_entry(&activity)) {
            return false;
        }
        self.items.push(activity);
        true
    }

    /// Adds unless an entry matches on title alone.
    pub fn push_unique_title(&mut self, activity: ExtractedActivity) -> bool {
        if self.items.iter().any(|existing| existing.title == activity.title) {
            return false;
        }
        self.items.push(activity);
        true
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[ExtractedActivity] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<ExtractedActivity> {
        self.items
    }
}

/// Which dedup key a sweep uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DedupKey {
    TitleAndDeadline,
    Title,
}

/// Heuristic activity extractor.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    config: ExtractorConfig,
}

impl Extractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Runs one extraction pass against the current clock.
    pub fn extract<D: DocumentAccessor>(&self, doc: &D) -> Vec<ExtractedActivity> {
        self.extract_at(doc, Utc::now())
    }

    /// Runs one extraction pass with an explicit `now`.
    pub fn extract_at<D: DocumentAccessor>(
        &self,
        doc: &D,
        now: DateTime<Utc>,
    ) -> Vec<ExtractedActivity> {
        match self.config.fixed_offset() {
            Some(offset) => self.extract_in(doc, now, &offset),
            None => self.extract_in(doc, now, &Local),
        }
    }

    /// Runs one extraction pass reading naive dates in `zone`.
    ///
    /// Ignores `utc_offset_minutes`; `extract_at` picks the zone from it.
    pub fn extract_in<D: DocumentAccessor, Tz: TimeZone>(
        &self,
        doc: &D,
        now: DateTime<Utc>,
        zone: &Tz,
    ) -> Vec<ExtractedActivity> {
        let started_at = Instant::now();
        let pass = Pass {
            doc,
            config: &self.config,
            now,
            zone,
        };
        let mut list = ActivityList::new();

        for pattern in ACTIVITY_PATTERNS {
            pass.sweep(&mut list, pattern, &locate(doc, pattern), DedupKey::TitleAndDeadline);
        }
        pass.sweep(&mut list, "calendar", &locate(doc, CALENDAR_PATTERN), DedupKey::Title);
        pass.sweep(&mut list, "timeline", &locate(doc, TIMELINE_PATTERN), DedupKey::Title);
        pass.sweep_tables(&mut list);
        pass.sweep(
            &mut list,
            "upcoming",
            &locate_nested(doc, UPCOMING_BLOCK_PATTERN, UPCOMING_EVENT_PATTERN),
            DedupKey::Title,
        );

        info!(
            "event=extract_pass module=extract status=ok page={} activities={} duration_ms={}",
            doc.page_url(),
            list.len(),
            started_at.elapsed().as_millis()
        );
        list.into_vec()
    }
}

/// State shared by every sweep of one pass.
struct Pass<'a, D: DocumentAccessor, Tz: TimeZone> {
    doc: &'a D,
    config: &'a ExtractorConfig,
    now: DateTime<Utc>,
    zone: &'a Tz,
}

impl<D: DocumentAccessor, Tz: TimeZone> Pass<'_, D, Tz> {
    fn sweep(&self, list: &mut ActivityList, label: &str, nodes: &[D::Node], key: DedupKey) {
        for (index, node) in nodes.iter().enumerate() {
            let fields = match extract_fields(self.doc, *node, self.config.fallback_title_chars) {
                Ok(Some(fields)) => fields,
                Ok(None) => continue,
                Err(err) => {
                    warn!(
                        "event=parse_node module=extract status=error sweep={:?} index={} error={}",
                        label, index, err
                    );
                    continue;
                }
            };
            let activity = self.build(fields);
            let added = match key {
                DedupKey::TitleAndDeadline => list.push_unique(activity),
                DedupKey::Title => list.push_unique_title(activity),
            };
            if !added {
                debug!(
                    "event=dedup module=extract status=skip sweep={:?} index={}",
                    label, index
                );
            }
        }
    }

    fn sweep_tables(&self, list: &mut ActivityList) {
        let rows = locate_nested(self.doc, TABLE_PATTERN, TABLE_ROW_PATTERN);
        for (index, row) in rows.into_iter().enumerate() {
            let fields = match extract_table_row(self.doc, row, MIN_TABLE_CELLS) {
                Ok(Some(fields)) => fields,
                Ok(None) => continue,
                Err(err) => {
                    warn!(
                        "event=parse_row module=extract status=error index={} error={}",
                        index, err
                    );
                    continue;
                }
            };
            // Rows without a parseable deadline are dropped, not defaulted.
            let Some(deadline) = fields
                .deadline_text
                .as_deref()
                .and_then(|text| normalize_deadline(text, self.zone))
            else {
                continue;
            };
            let activity = ExtractedActivity {
                title: truncate_chars(&fields.title, self.config.title_limit()),
                kind: fields.kind,
                deadline,
                url: fields
                    .url
                    .unwrap_or_else(|| self.doc.page_url().to_string()),
                description: String::new(),
                source: ActivitySource::LmsTable,
            };
            if !list.push_unique_title(activity) {
                debug!("event=dedup module=extract status=skip sweep=\"table\" index={}", index);
            }
        }
    }

    fn build(&self, fields: CandidateFields) -> ExtractedActivity {
        let parsed = fields
            .deadline_text
            .as_deref()
            .and_then(|text| normalize_deadline(text, self.zone))
            .or_else(|| {
                find_bare_date_near_keyword(&fields.node_text)
                    .and_then(|text| normalize_deadline(text, self.zone))
            });
        let deadline = match parsed {
            Some(deadline) => deadline,
            None => {
                debug!(
                    "event=fallback_deadline module=extract status=ok days={}",
                    self.config.fallback_deadline_days
                );
                self.fallback()
            }
        };

        ExtractedActivity {
            title: truncate_chars(&fields.title, self.config.title_limit()),
            kind: fields.kind,
            deadline,
            url: fields
                .url
                .unwrap_or_else(|| self.doc.page_url().to_string()),
            description: String::new(),
            source: ActivitySource::LmsExtracted,
        }
    }

    /// Synthetic deadline; an unrepresentable configured span uses the default.
    fn fallback(&self) -> DateTime<Utc> {
        let days = self.config.fallback_deadline_days;
        if let Some(deadline) = fallback_deadline(self.now, days, self.zone) {
            return deadline;
        }
        warn!(
            "event=fallback_deadline module=extract status=error days={} reason=out_of_range",
            days
        );
        fallback_deadline(self.now, DEFAULT_FALLBACK_DAYS, self.zone).unwrap_or(self.now)
    }
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}
