//! Domain model for tracked academic activities.
//!
//! # Responsibility
//! - Define the durable `Activity` record owned by the store.
//! - Define the ephemeral `ExtractedActivity` produced by one extraction pass.
//!
//! # Invariants
//! - Every stored activity is identified by a stable `ActivityId`.
//! - Timestamps cross every boundary as RFC 3339 UTC with millisecond precision.

pub mod activity;
pub mod extracted;
pub mod timestamp;
