//! Domain model for records and their derived visuals.
//!
//! # Responsibility
//! - Define the persisted record shape and its typed projection.
//! - Define the derived visual element consumed by every output.
//!
//! # Invariants
//! - Category and role labels are resolved into closed enums once, at load.
//! - Visuals are pure outputs of `(record, angle)`.

pub mod record;
pub mod visual;
