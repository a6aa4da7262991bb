//! Link proposal filtering and confirmation.
//!
//! # Responsibility
//! - Drop externally generated candidates that would duplicate an existing
//!   edge.
//! - Pre-select a link name per candidate.
//! - Track pending proposals until they are confirmed or dismissed.
//!
//! # Invariants
//! - Filtering ignores confidence and relationship type.
//! - Filtering is idempotent for the same candidates and edge set.
//! - One confirmation issues exactly one `create_link`.

use crate::model::concept::ConceptId;
use crate::model::link::Link;
use crate::model::link_name::{label_key, LinkNamePair, LinkNamePairId};
use crate::repo::concept_repo::ConceptStore;
use crate::repo::link_name_repo::LinkNameRepository;
use crate::repo::link_repo::LinkRepository;
use crate::service::error::{GraphError, GraphResult};
use crate::service::link_service::LinkGraphService;
use log::{debug, info};
use std::collections::HashSet;
use uuid::Uuid;

const HIGH_CONFIDENCE: f64 = 0.8;
const MEDIUM_CONFIDENCE: f64 = 0.6;

/// Candidate edge produced by an external recommender.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkCandidate {
    pub target_id: ConceptId,
    /// Suggested forward label, matched against the vocabulary.
    pub proposed_label: String,
    /// Score in `[0, 1]`; only used for display tiering.
    pub confidence: f64,
    pub rationale: String,
}

/// Display tier derived from candidate confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfidenceTier {
    Low,
    Medium,
    High,
}

impl ConfidenceTier {
    pub fn from_score(score: f64) -> Self {
        if score >= HIGH_CONFIDENCE {
            Self::High
        } else if score >= MEDIUM_CONFIDENCE {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Candidate with its pre-selected link name.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedProposal {
    pub candidate: LinkCandidate,
    pub tier: ConfidenceTier,
    /// `None` only when no link name exists at all.
    pub link_name_id: Option<LinkNamePairId>,
    /// `false` means the pre-selection is a fallback the user must confirm.
    pub label_matched: bool,
}

/// Filters candidates against the current graph.
pub struct LinkProposalFilter<C: ConceptStore, L: LinkRepository> {
    concepts: C,
    links: L,
}

impl<C: ConceptStore, L: LinkRepository> LinkProposalFilter<C, L> {
    pub fn new(concepts: C, links: L) -> Self {
        Self { concepts, links }
    }

    /// Removes candidates that must not be proposed for `source_id`.
    ///
    /// Dropped:
    /// - targets already linked to or from the source, any type;
    /// - the source itself;
    /// - targets that do not resolve to an active concept;
    /// - repeated targets (the first, highest-ranked one is kept).
    ///
    /// Input order is preserved.
    pub fn filter(
        &self,
        source_id: ConceptId,
        candidates: &[LinkCandidate],
    ) -> GraphResult<Vec<LinkCandidate>> {
        let linked = self.links.linked_peer_ids(source_id)?;
        let mut seen = HashSet::new();
        let mut kept = Vec::new();

        for candidate in candidates {
            let target_id = candidate.target_id;
            if target_id == source_id || linked.contains(&target_id) {
                continue;
            }
            if !seen.insert(target_id) {
                continue;
            }
            if !self.concepts.is_active(target_id)? {
                continue;
            }
            kept.push(candidate.clone());
        }

        debug!(
            "event=proposal_filter module=proposal status=ok received={} kept={}",
            candidates.len(),
            kept.len()
        );
        Ok(kept)
    }
}

/// Pre-selects a link name for every candidate.
///
/// The proposed label is matched case-insensitively against live forward
/// names; the first pair in `pairs` order wins. Without a match the first
/// pair is used as a fallback.
pub fn resolve(candidates: Vec<LinkCandidate>, pairs: &[LinkNamePair]) -> Vec<ResolvedProposal> {
    let live = pairs
        .iter()
        .filter(|pair| !pair.is_deleted)
        .collect::<Vec<_>>();
    let fallback = live.first().map(|pair| pair.id);

    candidates
        .into_iter()
        .map(|candidate| {
            let matched = label_key(&candidate.proposed_label).and_then(|wanted| {
                live.iter()
                    .find(|pair| label_key(&pair.forward_name).as_deref() == Some(wanted.as_str()))
                    .map(|pair| pair.id)
            });
            ResolvedProposal {
                tier: ConfidenceTier::from_score(candidate.confidence),
                link_name_id: matched.or(fallback),
                label_matched: matched.is_some(),
                candidate,
            }
        })
        .collect()
}

/// Proposal waiting for the user's decision.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingProposal {
    /// Instance id; a re-run of the proposal step yields new ids.
    pub id: Uuid,
    pub proposal: ResolvedProposal,
}

/// Pending proposals for one source concept.
#[derive(Debug, Clone, PartialEq)]
pub struct ProposalQueue {
    source_id: ConceptId,
    pending: Vec<PendingProposal>,
}

impl ProposalQueue {
    pub fn new(source_id: ConceptId, proposals: Vec<ResolvedProposal>) -> Self {
        let pending = proposals
            .into_iter()
            .map(|proposal| PendingProposal {
                id: Uuid::new_v4(),
                proposal,
            })
            .collect();
        Self { source_id, pending }
    }

    pub fn source_id(&self) -> ConceptId {
        self.source_id
    }

    pub fn pending(&self) -> &[PendingProposal] {
        &self.pending
    }

    /// Accepts one proposal by creating its link.
    ///
    /// `link_name_id` overrides the pre-selection. The rationale becomes the
    /// link notes. The proposal leaves the queue only when the link was
    /// created; on error it stays pending.
    pub fn confirm<C, N, L>(
        &mut self,
        proposal_id: Uuid,
        link_name_id: Option<LinkNamePairId>,
        graph: &LinkGraphService<C, N, L>,
    ) -> GraphResult<Link>
    where
        C: ConceptStore,
        N: LinkNameRepository,
        L: LinkRepository,
    {
        let index = self.position(proposal_id)?;
        let pending = &self.pending[index];
        let tier = pending.proposal.tier;
        let link_name_id = link_name_id
            .or(pending.proposal.link_name_id)
            .ok_or_else(|| GraphError::InvalidInput("no link name selected".to_string()))?;

        let link = graph.create_link(
            self.source_id,
            pending.proposal.candidate.target_id,
            link_name_id,
            Some(pending.proposal.candidate.rationale.as_str()),
        )?;
        self.pending.remove(index);
        info!(
            "event=proposal_confirm module=proposal status=ok link_id={} tier={}",
            link.id,
            tier.as_str()
        );
        Ok(link)
    }

    /// Drops one proposal without touching the graph.
    pub fn dismiss(&mut self, proposal_id: Uuid) -> GraphResult<PendingProposal> {
        let index = self.position(proposal_id)?;
        Ok(self.pending.remove(index))
    }

    fn position(&self, proposal_id: Uuid) -> GraphResult<usize> {
        self.pending
            .iter()
            .position(|pending| pending.id == proposal_id)
            .ok_or_else(|| {
                GraphError::InvalidInput(format!("proposal is not pending: {proposal_id}"))
            })
    }
}
