//! User-facing error taxonomy for graph use-cases.
//!
//! Every failure is scoped to one operation and leaves prior state
//! untouched; recovery is always caller-driven.

use crate::model::concept::ConceptId;
use crate::model::link::LinkId;
use crate::model::link_name::{LinkNamePairId, LinkNameValidationError};
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type GraphResult<T> = Result<T, GraphError>;

/// Which kind of record an unresolved id was meant to point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
    Concept(ConceptId),
    LinkName(LinkNamePairId),
    Link(LinkId),
}

impl Display for Reference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Concept(id) => write!(f, "concept {id}"),
            Self::LinkName(id) => write!(f, "link name {id}"),
            Self::Link(id) => write!(f, "link {id}"),
        }
    }
}

/// Error returned by graph services.
#[derive(Debug)]
pub enum GraphError {
    /// An id does not resolve to a live record.
    ReferenceNotFound(Reference),
    /// Link name still in use and no replacement was supplied.
    PairInUse {
        id: LinkNamePairId,
        usage_count: u64,
    },
    /// Caller input violates a graph rule.
    InvalidInput(String),
    /// Storage failure.
    Repo(RepoError),
}

impl Display for GraphError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReferenceNotFound(reference) => write!(f, "{reference} not found"),
            Self::PairInUse { id, usage_count } => write!(
                f,
                "link name {id} is used by {usage_count} link(s); choose a replacement"
            ),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for GraphError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for GraphError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::ConceptNotFound(id) => Self::ReferenceNotFound(Reference::Concept(id)),
            RepoError::LinkNotFound(id) => Self::ReferenceNotFound(Reference::Link(id)),
            RepoError::LinkNameNotFound(id) => Self::ReferenceNotFound(Reference::LinkName(id)),
            RepoError::PairInUse { id, usage_count } => Self::PairInUse { id, usage_count },
            RepoError::Validation(err) => err.into(),
            RepoError::ConceptTrashed(_)
            | RepoError::ConceptNotTrashed(_)
            | RepoError::DefaultPairProtected(_)
            | RepoError::ReplacementIsSame(_) => Self::InvalidInput(value.to_string()),
            other => Self::Repo(other),
        }
    }
}

impl From<LinkNameValidationError> for GraphError {
    fn from(value: LinkNameValidationError) -> Self {
        Self::InvalidInput(value.to_string())
    }
}

impl GraphError {
    /// Stable machine-readable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ReferenceNotFound(_) => "reference_not_found",
            Self::PairInUse { .. } => "pair_in_use",
            Self::InvalidInput(_) => "invalid_input",
            Self::Repo(_) => "storage",
        }
    }
}
