//! Typed, directed links between knowledge-base concepts.
//! This crate owns the link graph invariants: relationship vocabulary,
//! per-concept link views and proposal filtering.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status, LoggingError};
pub use model::concept::{Concept, ConceptId, ConceptStatus};
pub use model::link::{Link, LinkId, LinkUpdate, NewLink};
pub use model::link_name::{
    LinkDirection, LinkLabels, LinkNamePair, LinkNamePairId, LinkNameValidationError,
    NewLinkNamePair,
};
pub use repo::concept_repo::{ConceptRepository, ConceptStore, PurgeReport, SqliteConceptStore};
pub use repo::link_name_repo::{
    LinkNameDeletion, LinkNameRepository, LinkNameUsage, SqliteLinkNameRepository,
};
pub use repo::link_repo::{
    ConceptLinkItem, ConceptLinks, LinkDetail, LinkRepository, LinkSummary, SqliteLinkRepository,
};
pub use repo::{RepoError, RepoResult};
pub use service::concept_service::ConceptService;
pub use service::error::{GraphError, GraphResult, Reference};
pub use service::link_name_service::LinkNameRegistry;
pub use service::link_service::{LinkGraphService, LinkListQuery, LinkListing};
pub use service::proposal_service::{
    resolve, ConfidenceTier, LinkCandidate, LinkProposalFilter, PendingProposal, ProposalQueue,
    ResolvedProposal,
};

/// Minimal health-check API for embedding hosts.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
