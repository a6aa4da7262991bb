//! Concept lifecycle use-cases needed by the graph.
//!
//! # Invariants
//! - Titles are stored normalized and never blank.
//! - Purging a concept removes every link touching it in the same
//!   transaction; trashing leaves links in place.

use crate::model::concept::{Concept, ConceptId};
use crate::model::link_name::normalize_label;
use crate::repo::concept_repo::{ConceptRepository, PurgeReport};
use crate::service::error::{GraphError, GraphResult, Reference};
use log::info;
use std::time::{SystemTime, UNIX_EPOCH};

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Concept lifecycle facade.
pub struct ConceptService<R: ConceptRepository> {
    repo: R,
}

impl<R: ConceptRepository> ConceptService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create(&self, title: &str) -> GraphResult<Concept> {
        let title = normalize_label(title).ok_or_else(|| {
            GraphError::InvalidInput("concept title must not be blank".to_string())
        })?;
        self.repo.create_concept(&title).map_err(Into::into)
    }

    pub fn get(&self, id: ConceptId) -> GraphResult<Concept> {
        self.repo
            .get_concept(id)?
            .ok_or(GraphError::ReferenceNotFound(Reference::Concept(id)))
    }

    /// Moves a concept to the trash. Its links stay readable.
    pub fn trash(&self, id: ConceptId) -> GraphResult<()> {
        self.repo.trash_concept(id).map_err(Into::into)
    }

    pub fn restore(&self, id: ConceptId) -> GraphResult<()> {
        self.repo.restore_concept(id).map_err(Into::into)
    }

    /// Permanently removes one trashed concept and its links.
    pub fn purge(&self, id: ConceptId) -> GraphResult<PurgeReport> {
        let report = self.repo.purge_concept(id)?;
        info!(
            "event=concept_purge module=concept status=ok concept_id={} links_removed={}",
            id, report.links_removed
        );
        Ok(report)
    }

    /// Purges concepts that have been in the trash longer than
    /// `retention_days`, measured from now.
    pub fn purge_expired(&self, retention_days: u32) -> GraphResult<PurgeReport> {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as i64)
            .unwrap_or(0);
        self.purge_expired_at(now_ms, retention_days)
    }

    /// Same as [`Self::purge_expired`] with an explicit clock.
    pub fn purge_expired_at(&self, now_ms: i64, retention_days: u32) -> GraphResult<PurgeReport> {
        let cutoff = now_ms - i64::from(retention_days) * MS_PER_DAY;
        let report = self.repo.purge_trashed_before(cutoff)?;
        info!(
            "event=concept_purge_expired module=concept status=ok concepts_purged={} links_removed={}",
            report.concepts_purged, report.links_removed
        );
        Ok(report)
    }
}
