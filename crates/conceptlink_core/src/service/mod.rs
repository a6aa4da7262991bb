//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into graph use-cases.
//! - Translate repository failures into the user-facing error taxonomy.

pub mod concept_service;
pub mod error;
pub mod link_name_service;
pub mod link_service;
pub mod proposal_service;
