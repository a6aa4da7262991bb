//! Link graph use-case service.
//!
//! # Responsibility
//! - Validate endpoints and relationship type above the repository layer.
//! - Provide create/update/delete by link id and the concept-centric and
//!   graph-wide read models.
//!
//! # Invariants
//! - Both endpoints must exist and be active to create a link.
//! - A concept never links to itself.
//! - The same (source, target, type) triple is never created twice.
//! - Links are deleted by their own id only; (source, target) lookups are
//!   read-only.

use crate::model::concept::ConceptId;
use crate::model::link::{Link, LinkId, LinkUpdate, NewLink};
use crate::model::link_name::LinkNamePairId;
use crate::repo::concept_repo::ConceptStore;
use crate::repo::link_name_repo::LinkNameRepository;
use crate::repo::link_repo::{ConceptLinks, LinkDetail, LinkRepository, LinkSummary};
use crate::service::error::{GraphError, GraphResult, Reference};
use log::{info, warn};
use std::collections::BTreeSet;

/// Options for [`LinkGraphService::get_all`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkListQuery {
    /// Identifiers only when `true`; joined titles and labels otherwise.
    pub summary: bool,
}

/// Graph-wide link listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkListing {
    Summary(Vec<LinkSummary>),
    Detailed(Vec<LinkDetail>),
}

impl LinkListing {
    pub fn len(&self) -> usize {
        match self {
            Self::Summary(items) => items.len(),
            Self::Detailed(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Link graph service facade.
pub struct LinkGraphService<C, N, L>
where
    C: ConceptStore,
    N: LinkNameRepository,
    L: LinkRepository,
{
    concepts: C,
    link_names: N,
    links: L,
}

impl<C, N, L> LinkGraphService<C, N, L>
where
    C: ConceptStore,
    N: LinkNameRepository,
    L: LinkRepository,
{
    pub fn new(concepts: C, link_names: N, links: L) -> Self {
        Self {
            concepts,
            link_names,
            links,
        }
    }

    /// Creates one directed link.
    ///
    /// # Errors
    /// - `ReferenceNotFound` when a concept or the link name does not resolve.
    /// - `InvalidInput` for self-links, trashed endpoints and duplicates.
    pub fn create_link(
        &self,
        source_id: ConceptId,
        target_id: ConceptId,
        link_name_id: LinkNamePairId,
        notes: Option<&str>,
    ) -> GraphResult<Link> {
        let result = self.try_create_link(source_id, target_id, link_name_id, notes);
        match &result {
            Ok(link) => info!(
                "event=link_create module=graph status=ok link_id={} link_name_id={}",
                link.id, link.link_name_id
            ),
            Err(err) => warn!(
                "event=link_create module=graph status=error error_code={}",
                err.code()
            ),
        }
        result
    }

    /// Applies a partial update to one link.
    ///
    /// An empty update returns the stored link unchanged.
    pub fn update_link(&self, link_id: LinkId, update: &LinkUpdate) -> GraphResult<Link> {
        let current = self.get_link(link_id)?;
        if update.is_empty() {
            return Ok(current);
        }

        if let Some(link_name_id) = update.link_name_id {
            self.ensure_link_name_available(link_name_id)?;
            if link_name_id != current.link_name_id
                && self.links.link_exists(
                    current.source_id,
                    current.target_id,
                    link_name_id,
                    Some(link_id),
                )?
            {
                return Err(GraphError::InvalidInput(
                    "an identical link already exists between these concepts".to_string(),
                ));
            }
        }

        let link = self.links.update_link(link_id, update)?;
        info!("event=link_update module=graph status=ok link_id={link_id}");
        Ok(link)
    }

    /// Deletes exactly one link by id.
    pub fn delete_link(&self, link_id: LinkId) -> GraphResult<()> {
        self.links.delete_link(link_id).map_err(GraphError::from)?;
        info!("event=link_delete module=graph status=ok link_id={link_id}");
        Ok(())
    }

    /// Returns the links around one concept, split and labelled by direction.
    pub fn get_by_concept(&self, concept_id: ConceptId) -> GraphResult<ConceptLinks> {
        if !self.concepts.exists(concept_id)? {
            return Err(GraphError::ReferenceNotFound(Reference::Concept(concept_id)));
        }
        self.links.list_for_concept(concept_id).map_err(Into::into)
    }

    /// Lists every link, either as identifiers or fully resolved.
    pub fn get_all(&self, query: LinkListQuery) -> GraphResult<LinkListing> {
        if query.summary {
            Ok(LinkListing::Summary(self.links.list_summaries()?))
        } else {
            Ok(LinkListing::Detailed(self.links.list_details()?))
        }
    }

    pub fn get_link(&self, link_id: LinkId) -> GraphResult<Link> {
        self.links
            .get_link(link_id)?
            .ok_or(GraphError::ReferenceNotFound(Reference::Link(link_id)))
    }

    /// Links between two concepts in either direction, for navigation.
    pub fn links_between(&self, a: ConceptId, b: ConceptId) -> GraphResult<Vec<Link>> {
        self.links.links_between(a, b).map_err(Into::into)
    }

    /// Concepts already connected to `concept_id`, in either direction.
    pub fn linked_peers(&self, concept_id: ConceptId) -> GraphResult<BTreeSet<ConceptId>> {
        self.links.linked_peer_ids(concept_id).map_err(Into::into)
    }

    fn try_create_link(
        &self,
        source_id: ConceptId,
        target_id: ConceptId,
        link_name_id: LinkNamePairId,
        notes: Option<&str>,
    ) -> GraphResult<Link> {
        if source_id == target_id {
            return Err(GraphError::InvalidInput(
                "a concept cannot link to itself".to_string(),
            ));
        }
        self.ensure_concept_available(source_id)?;
        self.ensure_concept_available(target_id)?;
        self.ensure_link_name_available(link_name_id)?;

        if self
            .links
            .link_exists(source_id, target_id, link_name_id, None)?
        {
            return Err(GraphError::InvalidInput(
                "an identical link already exists between these concepts".to_string(),
            ));
        }

        let link = NewLink::new(source_id, target_id, link_name_id, notes);
        self.links.create_link(&link).map_err(Into::into)
    }

    fn ensure_concept_available(&self, concept_id: ConceptId) -> GraphResult<()> {
        if !self.concepts.exists(concept_id)? {
            return Err(GraphError::ReferenceNotFound(Reference::Concept(concept_id)));
        }
        if !self.concepts.is_active(concept_id)? {
            return Err(GraphError::InvalidInput(format!(
                "concept is in trash: {concept_id}"
            )));
        }
        Ok(())
    }

    fn ensure_link_name_available(&self, link_name_id: LinkNamePairId) -> GraphResult<()> {
        match self.link_names.get_link_name(link_name_id, false)? {
            Some(_) => Ok(()),
            None => Err(GraphError::ReferenceNotFound(Reference::LinkName(
                link_name_id,
            ))),
        }
    }
}
