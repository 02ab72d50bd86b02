//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define user-scoped data access contracts for stored activities.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes enforce `Activity::validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`, `EmptyUpdate`) in
//!   addition to DB transport errors.

pub mod activity_repo;
