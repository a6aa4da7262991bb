//! Link name registry use-cases.
//!
//! # Responsibility
//! - Create and rename relationship-type vocabulary.
//! - Report live usage counts.
//! - Retire vocabulary through the safe-delete/replace protocol.
//!
//! # Invariants
//! - Symmetric pairs never diverge: labels go through `couple_labels` on
//!   every create and rename.
//! - A pair in use is only removed after all its links were repointed, in the
//!   same transaction.

use crate::model::link_name::{LinkNamePair, LinkNamePairId, NewLinkNamePair};
use crate::repo::link_name_repo::{LinkNameDeletion, LinkNameRepository, LinkNameUsage};
use crate::service::error::{GraphError, GraphResult, Reference};
use log::{info, warn};

/// Registry facade over link name persistence.
pub struct LinkNameRegistry<R: LinkNameRepository> {
    repo: R,
}

impl<R: LinkNameRepository> LinkNameRegistry<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a new, non-default link name pair.
    ///
    /// A symmetric pair always gets `reverse_name == forward_name`, whatever
    /// the caller passed. A non-symmetric pair without a reverse label reads
    /// the same in both directions.
    pub fn create(
        &self,
        forward_name: &str,
        reverse_name: Option<&str>,
        is_symmetric: bool,
    ) -> GraphResult<LinkNamePair> {
        let draft = NewLinkNamePair::new(forward_name, reverse_name, is_symmetric)?;
        let pair = self.repo.create_link_name(&draft)?;
        info!(
            "event=link_name_create module=registry status=ok link_name_id={} symmetric={}",
            pair.id, pair.is_symmetric
        );
        Ok(pair)
    }

    /// Renames a live pair and re-applies the symmetric rule.
    ///
    /// `reverse_name = None` keeps the stored reverse label.
    pub fn rename(
        &self,
        id: LinkNamePairId,
        forward_name: &str,
        reverse_name: Option<&str>,
    ) -> GraphResult<LinkNamePair> {
        let pair = self
            .repo
            .rename_link_name(id, forward_name, reverse_name)
            .map_err(GraphError::from)
            .inspect_err(|err| {
                warn!(
                    "event=link_name_rename module=registry status=error link_name_id={} error_code={}",
                    id,
                    err.code()
                );
            })?;
        info!("event=link_name_rename module=registry status=ok link_name_id={id}");
        Ok(pair)
    }

    /// Number of links currently referencing `id`, computed on read.
    pub fn usage_count(&self, id: LinkNamePairId) -> GraphResult<u64> {
        self.repo.usage_count(id).map_err(Into::into)
    }

    /// Retires a pair.
    ///
    /// - Unused: removed immediately; `replacement_id` is ignored.
    /// - In use with a replacement: every referencing link moves to the
    ///   replacement, then the pair is removed, atomically.
    /// - In use without a replacement: [`GraphError::PairInUse`], no change.
    pub fn delete(
        &self,
        id: LinkNamePairId,
        replacement_id: Option<LinkNamePairId>,
    ) -> GraphResult<LinkNameDeletion> {
        match self.repo.delete_link_name(id, replacement_id) {
            Ok(deletion) => {
                info!(
                    "event=link_name_delete module=registry status=ok link_name_id={} repointed={} replacement_id={}",
                    id,
                    deletion.repointed,
                    deletion
                        .replacement_id
                        .map_or_else(|| "none".to_string(), |value| value.to_string())
                );
                Ok(deletion)
            }
            Err(err) => {
                let err = GraphError::from(err);
                warn!(
                    "event=link_name_delete module=registry status=error link_name_id={} error_code={}",
                    id,
                    err.code()
                );
                Err(err)
            }
        }
    }

    /// Loads one live pair.
    pub fn get(&self, id: LinkNamePairId) -> GraphResult<LinkNamePair> {
        self.repo
            .get_link_name(id, false)?
            .ok_or(GraphError::ReferenceNotFound(Reference::LinkName(id)))
    }

    /// Lists live pairs in creation order.
    pub fn list(&self) -> GraphResult<Vec<LinkNamePair>> {
        self.repo.list_link_names(false).map_err(Into::into)
    }

    /// Lists live pairs with their usage counts.
    pub fn list_with_usage(&self) -> GraphResult<Vec<LinkNameUsage>> {
        self.repo.list_link_names_with_usage().map_err(Into::into)
    }
}
