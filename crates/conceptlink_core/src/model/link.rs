//! Directed, typed link between two concepts.

use crate::model::concept::ConceptId;
use crate::model::link_name::LinkNamePairId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a link. The only key a link is deleted by.
pub type LinkId = Uuid;

/// Persisted link record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub id: LinkId,
    pub source_id: ConceptId,
    pub target_id: ConceptId,
    pub link_name_id: LinkNamePairId,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Insert payload for one link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLink {
    pub id: LinkId,
    pub source_id: ConceptId,
    pub target_id: ConceptId,
    pub link_name_id: LinkNamePairId,
    pub notes: Option<String>,
}

impl NewLink {
    pub fn new(
        source_id: ConceptId,
        target_id: ConceptId,
        link_name_id: LinkNamePairId,
        notes: Option<&str>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_id,
            target_id,
            link_name_id,
            notes: normalize_notes(notes),
        }
    }
}

/// Partial update for one link. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkUpdate {
    pub link_name_id: Option<LinkNamePairId>,
    /// A blank value clears the notes.
    pub notes: Option<String>,
}

impl LinkUpdate {
    pub fn is_empty(&self) -> bool {
        self.link_name_id.is_none() && self.notes.is_none()
    }
}

/// Trims notes; blank notes are stored as absent.
pub fn normalize_notes(notes: Option<&str>) -> Option<String> {
    notes
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::{normalize_notes, LinkUpdate};

    #[test]
    fn blank_notes_become_none() {
        assert_eq!(normalize_notes(Some("   ")), None);
        assert_eq!(normalize_notes(None), None);
        assert_eq!(normalize_notes(Some(" why ")).as_deref(), Some("why"));
    }

    #[test]
    fn default_update_is_empty() {
        assert!(LinkUpdate::default().is_empty());
    }
}
