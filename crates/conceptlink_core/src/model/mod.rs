//! Domain model for the concept link graph.
//!
//! # Responsibility
//! - Define canonical records for concepts, link name pairs and links.
//! - Own label/notes normalization and the symmetric-label rule.
//!
//! # Invariants
//! - Every record is identified by a stable UUID.
//! - Link name pairs are retired by tombstone (`is_deleted`), never removed.

pub mod concept;
pub mod link;
pub mod link_name;
