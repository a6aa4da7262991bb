//! Concept node as seen by the graph engine.
//!
//! Concepts are owned by the knowledge base; the graph only needs their id,
//! title and trash state.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a concept node.
pub type ConceptId = Uuid;

/// Concept lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConceptStatus {
    Active,
    /// Soft-deleted; restorable until purged.
    Trashed,
}

impl ConceptStatus {
    pub(crate) fn as_db(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Trashed => "trashed",
        }
    }

    pub(crate) fn from_db(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "trashed" => Some(Self::Trashed),
            _ => None,
        }
    }
}

/// Concept read model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Concept {
    pub id: ConceptId,
    pub title: String,
    pub status: ConceptStatus,
    /// Epoch ms when the concept entered the trash. `None` while active.
    pub trashed_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Concept {
    pub fn is_active(&self) -> bool {
        self.status == ConceptStatus::Active
    }
}
