//! Link name pair (relationship type) model.
//!
//! # Responsibility
//! - Define the vocabulary record used to label links in both directions.
//! - Provide the one coupling function that enforces the symmetric rule.
//!
//! # Invariants
//! - `forward_name` is never blank.
//! - `is_symmetric == true` implies `reverse_name == forward_name`.
//! - Labels are stored trimmed with internal whitespace collapsed.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Stable identifier of a link name pair.
pub type LinkNamePairId = Uuid;

/// Direction in which a link is read from one of its endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkDirection {
    /// Read from the source concept; uses the forward label.
    Outgoing,
    /// Read from the target concept; uses the reverse label.
    Incoming,
}

/// Validation failures for link name labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkNameValidationError {
    NilId,
    BlankForwardName,
    SymmetricLabelMismatch { forward: String, reverse: String },
}

impl Display for LinkNameValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "link name id must not be nil"),
            Self::BlankForwardName => write!(f, "forward name must not be blank"),
            Self::SymmetricLabelMismatch { forward, reverse } => write!(
                f,
                "symmetric link name requires matching labels, got `{forward}` and `{reverse}`"
            ),
        }
    }
}

impl Error for LinkNameValidationError {}

/// Forward/reverse labels after normalization and coupling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkLabels {
    pub forward_name: String,
    pub reverse_name: String,
}

/// Couples forward and reverse labels for one link name.
///
/// This is the only place the symmetric rule is applied; create and rename
/// both go through it.
///
/// - Symmetric: reverse is always the forward label, caller input ignored.
/// - Not symmetric: blank or missing reverse falls back to the forward label.
pub fn couple_labels(
    forward_name: &str,
    reverse_name: Option<&str>,
    is_symmetric: bool,
) -> Result<LinkLabels, LinkNameValidationError> {
    let forward_name =
        normalize_label(forward_name).ok_or(LinkNameValidationError::BlankForwardName)?;
    let reverse_name = if is_symmetric {
        forward_name.clone()
    } else {
        reverse_name
            .and_then(normalize_label)
            .unwrap_or_else(|| forward_name.clone())
    };

    Ok(LinkLabels {
        forward_name,
        reverse_name,
    })
}

/// Trims a label and collapses internal whitespace runs.
///
/// Returns `None` for blank input.
pub fn normalize_label(value: &str) -> Option<String> {
    let collapsed = WHITESPACE_RE.replace_all(value.trim(), " ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed.into_owned())
    }
}

/// Case-insensitive label comparison key.
pub fn label_key(value: &str) -> Option<String> {
    normalize_label(value).map(|label| label.to_lowercase())
}

/// Persisted relationship-type vocabulary entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "LinkNamePairWire")]
pub struct LinkNamePair {
    pub id: LinkNamePairId,
    /// Label read from source to target.
    pub forward_name: String,
    /// Label read from target to source.
    pub reverse_name: String,
    pub is_symmetric: bool,
    /// Seed entry shipped with the schema; cannot be deleted.
    pub is_default: bool,
    /// Tombstone set by the safe-delete protocol.
    pub is_deleted: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl LinkNamePair {
    /// Checks record-level invariants.
    pub fn validate(&self) -> Result<(), LinkNameValidationError> {
        if self.id.is_nil() {
            return Err(LinkNameValidationError::NilId);
        }
        if self.forward_name.trim().is_empty() {
            return Err(LinkNameValidationError::BlankForwardName);
        }
        if self.is_symmetric && self.forward_name != self.reverse_name {
            return Err(LinkNameValidationError::SymmetricLabelMismatch {
                forward: self.forward_name.clone(),
                reverse: self.reverse_name.clone(),
            });
        }
        Ok(())
    }

    /// Returns the label used when reading a link in `direction`.
    pub fn label_for(&self, direction: LinkDirection) -> &str {
        match direction {
            LinkDirection::Outgoing => self.forward_name.as_str(),
            LinkDirection::Incoming => self.reverse_name.as_str(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LinkNamePairWire {
    id: LinkNamePairId,
    forward_name: String,
    reverse_name: String,
    is_symmetric: bool,
    is_default: bool,
    #[serde(default)]
    is_deleted: bool,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<LinkNamePairWire> for LinkNamePair {
    type Error = LinkNameValidationError;

    fn try_from(value: LinkNamePairWire) -> Result<Self, Self::Error> {
        let pair = Self {
            id: value.id,
            forward_name: value.forward_name,
            reverse_name: value.reverse_name,
            is_symmetric: value.is_symmetric,
            is_default: value.is_default,
            is_deleted: value.is_deleted,
            created_at: value.created_at,
            updated_at: value.updated_at,
        };
        pair.validate()?;
        Ok(pair)
    }
}

/// New link name pair, labels already coupled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLinkNamePair {
    pub id: LinkNamePairId,
    pub labels: LinkLabels,
    pub is_symmetric: bool,
}

impl NewLinkNamePair {
    pub fn new(
        forward_name: &str,
        reverse_name: Option<&str>,
        is_symmetric: bool,
    ) -> Result<Self, LinkNameValidationError> {
        Ok(Self {
            id: Uuid::new_v4(),
            labels: couple_labels(forward_name, reverse_name, is_symmetric)?,
            is_symmetric,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{couple_labels, label_key, normalize_label, LinkNameValidationError};

    #[test]
    fn symmetric_coupling_ignores_caller_reverse() {
        let labels = couple_labels("relates to", Some("is related from"), true).unwrap();
        assert_eq!(labels.forward_name, "relates to");
        assert_eq!(labels.reverse_name, "relates to");
    }

    #[test]
    fn asymmetric_coupling_falls_back_to_forward_for_blank_reverse() {
        let labels = couple_labels("supports", Some("   "), false).unwrap();
        assert_eq!(labels.reverse_name, "supports");

        let labels = couple_labels("supports", Some("supported by"), false).unwrap();
        assert_eq!(labels.reverse_name, "supported by");
    }

    #[test]
    fn blank_forward_is_rejected() {
        let err = couple_labels(" \t ", Some("x"), false).unwrap_err();
        assert_eq!(err, LinkNameValidationError::BlankForwardName);
    }

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(
            normalize_label("  is   part\tof ").as_deref(),
            Some("is part of")
        );
        assert_eq!(normalize_label("\n"), None);
        assert_eq!(label_key(" Is  Part of").as_deref(), Some("is part of"));
    }
}
