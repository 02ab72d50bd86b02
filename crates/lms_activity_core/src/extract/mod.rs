//! Heuristic activity extraction from LMS pages.
//!
//! # Responsibility
//! - Locate activity-like elements, derive their fields, normalize deadlines
//!   and merge the results of every sweep into one list.
//!
//! # Invariants
//! - Best effort: failures are logged and recovered locally.
//! - Synchronous: a pass completes before the next one can start.
//! - Every returned record has a concrete deadline.

pub mod aggregate;
pub mod date;
pub mod dom;
pub mod fields;
pub mod locator;
pub mod watcher;

pub use aggregate::{ActivityList, Extractor};
pub use date::{looks_like_date, normalize_deadline};
pub use dom::{DocumentAccessor, DomError, DomResult, HtmlDocument, HtmlPage};
pub use watcher::PageWatcher;
