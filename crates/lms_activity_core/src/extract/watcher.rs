//! Debounced re-extraction on page mutations.
//!
//! # Responsibility
//! - Coalesce bursts of mutation batches into one re-extraction.
//! - Own the single pending deadline; callers drive time explicitly.
//!
//! # Invariants
//! - At most one deadline is pending; a new batch overwrites it.
//! - Batches without added nodes never schedule anything.
//! - A stopped watcher holds no pending deadline.

use crate::config::ExtractorConfig;
use crate::extract::aggregate::Extractor;
use crate::extract::dom::DocumentAccessor;
use crate::model::extracted::ExtractedActivity;
use log::debug;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct PageWatcher {
    debounce: Duration,
    running: bool,
    pending: Option<Instant>,
}

impl PageWatcher {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            running: false,
            pending: None,
        }
    }

    pub fn from_config(config: &ExtractorConfig) -> Self {
        Self::new(config.debounce())
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    /// Stops observing and drops any pending re-extraction.
    pub fn stop(&mut self) {
        self.running = false;
        self.pending = None;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn pending_deadline(&self) -> Option<Instant> {
        self.pending
    }

    /// Records one mutation batch observed at `at`.
    ///
    /// Returns whether the batch (re)scheduled a re-extraction.
    pub fn on_mutations(&mut self, added_nodes: usize, at: Instant) -> bool {
        if !self.running || added_nodes == 0 {
            return false;
        }
        self.pending = Some(at + self.debounce);
        true
    }

    /// Returns `true` once when the pending deadline has passed.
    pub fn poll(&mut self, at: Instant) -> bool {
        match self.pending {
            Some(deadline) if self.running && at >= deadline => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    /// Polls and, when due, runs a full extraction pass.
    pub fn poll_extract<D: DocumentAccessor>(
        &mut self,
        doc: &D,
        extractor: &Extractor,
        at: Instant,
    ) -> Option<Vec<ExtractedActivity>> {
        if !self.poll(at) {
            return None;
        }
        debug!("event=mutation_rescan module=extract status=start");
        Some(extractor.extract(doc))
    }
}

#[cfg(test)]
mod tests {
    use super::PageWatcher;
    use std::time::{Duration, Instant};

    fn watcher() -> PageWatcher {
        let mut watcher = PageWatcher::new(Duration::from_millis(1_000));
        watcher.start();
        watcher
    }

    #[test]
    fn burst_collapses_to_last_scheduled_deadline() {
        let mut watcher = watcher();
        let t0 = Instant::now();
        assert!(watcher.on_mutations(3, t0));
        assert!(watcher.on_mutations(1, t0 + Duration::from_millis(600)));

        assert!(!watcher.poll(t0 + Duration::from_millis(1_200)));
        assert!(watcher.poll(t0 + Duration::from_millis(1_600)));
        assert!(!watcher.poll(t0 + Duration::from_millis(5_000)));
    }

    #[test]
    fn batches_without_added_nodes_are_ignored() {
        let mut watcher = watcher();
        assert!(!watcher.on_mutations(0, Instant::now()));
        assert!(watcher.pending_deadline().is_none());
    }

    #[test]
    fn stop_drops_pending_work() {
        let mut watcher = watcher();
        let t0 = Instant::now();
        watcher.on_mutations(2, t0);
        watcher.stop();
        assert!(!watcher.is_running());
        assert!(!watcher.poll(t0 + Duration::from_secs(10)));
        assert!(!watcher.on_mutations(2, t0));
    }
}
