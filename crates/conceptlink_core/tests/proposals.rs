use conceptlink_core::db::open_db_in_memory;
use conceptlink_core::{
    resolve, ConceptRepository, ConfidenceTier, GraphError, LinkCandidate, LinkGraphService,
    LinkNameRegistry, LinkProposalFilter, ProposalQueue, SqliteConceptStore,
    SqliteLinkNameRepository, SqliteLinkRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

type SqliteGraph<'conn> = LinkGraphService<
    SqliteConceptStore<'conn>,
    SqliteLinkNameRepository<'conn>,
    SqliteLinkRepository<'conn>,
>;

fn graph(conn: &Connection) -> SqliteGraph<'_> {
    LinkGraphService::new(
        SqliteConceptStore::try_new(conn).unwrap(),
        SqliteLinkNameRepository::try_new(conn).unwrap(),
        SqliteLinkRepository::try_new(conn).unwrap(),
    )
}

fn filter(conn: &Connection) -> LinkProposalFilter<SqliteConceptStore<'_>, SqliteLinkRepository<'_>> {
    LinkProposalFilter::new(
        SqliteConceptStore::try_new(conn).unwrap(),
        SqliteLinkRepository::try_new(conn).unwrap(),
    )
}

fn registry(conn: &Connection) -> LinkNameRegistry<SqliteLinkNameRepository<'_>> {
    LinkNameRegistry::new(SqliteLinkNameRepository::try_new(conn).unwrap())
}

fn concept(conn: &Connection, title: &str) -> Uuid {
    SqliteConceptStore::try_new(conn)
        .unwrap()
        .create_concept(title)
        .unwrap()
        .id
}

fn candidate(target_id: Uuid, label: &str, confidence: f64) -> LinkCandidate {
    LinkCandidate {
        target_id,
        proposed_label: label.to_string(),
        confidence,
        rationale: format!("suggested as `{label}`"),
    }
}

fn targets(candidates: &[LinkCandidate]) -> Vec<Uuid> {
    candidates.iter().map(|item| item.target_id).collect()
}

#[test]
fn filter_drops_targets_linked_in_either_direction_with_any_type() {
    let conn = open_db_in_memory().unwrap();
    let graph = graph(&conn);
    let pair = registry(&conn).create("supports", Some("supported by"), false).unwrap();
    let source = concept(&conn, "Source");
    let outgoing = concept(&conn, "Outgoing");
    let incoming = concept(&conn, "Incoming");
    let fresh = concept(&conn, "Fresh");
    graph.create_link(source, outgoing, pair.id, None).unwrap();
    graph.create_link(incoming, source, pair.id, None).unwrap();

    let candidates = vec![
        candidate(outgoing, "causes", 0.95),
        candidate(fresh, "supports", 0.5),
        candidate(incoming, "contrasts with", 0.99),
    ];
    let kept = filter(&conn).filter(source, &candidates).unwrap();

    assert_eq!(targets(&kept), vec![fresh]);
    assert_eq!(kept[0], candidates[1]);
}

#[test]
fn filter_drops_self_missing_trashed_and_repeated_targets() {
    let conn = open_db_in_memory().unwrap();
    let source = concept(&conn, "Source");
    let first = concept(&conn, "First");
    let second = concept(&conn, "Second");
    let trashed = concept(&conn, "Trashed");
    SqliteConceptStore::try_new(&conn)
        .unwrap()
        .trash_concept(trashed)
        .unwrap();

    let candidates = vec![
        candidate(second, "related to", 0.9),
        candidate(source, "related to", 0.9),
        candidate(Uuid::new_v4(), "related to", 0.9),
        candidate(trashed, "related to", 0.9),
        candidate(first, "causes", 0.4),
        candidate(second, "causes", 0.3),
    ];
    let kept = filter(&conn).filter(source, &candidates).unwrap();

    assert_eq!(targets(&kept), vec![second, first]);
    assert_eq!(kept[0].confidence, 0.9);
}

#[test]
fn filter_is_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let graph = graph(&conn);
    let related_to = registry(&conn).list().unwrap()[0].id;
    let source = concept(&conn, "Source");
    let linked = concept(&conn, "Linked");
    let open = concept(&conn, "Open");
    graph.create_link(linked, source, related_to, None).unwrap();

    let candidates = vec![
        candidate(linked, "related to", 0.7),
        candidate(open, "related to", 0.7),
    ];
    let filter = filter(&conn);
    let once = filter.filter(source, &candidates).unwrap();
    let twice = filter.filter(source, &once).unwrap();

    assert_eq!(once, twice);
    assert_eq!(targets(&once), vec![open]);
}

#[test]
fn confirm_creates_link_and_filter_then_excludes_target() {
    let conn = open_db_in_memory().unwrap();
    let graph = graph(&conn);
    let registry = registry(&conn);
    let source = concept(&conn, "Source");
    let target = concept(&conn, "Target");

    let candidates = vec![candidate(target, "Causes", 0.85)];
    let kept = filter(&conn).filter(source, &candidates).unwrap();
    let resolved = resolve(kept, &registry.list().unwrap());
    assert_eq!(resolved[0].tier, ConfidenceTier::High);
    assert!(resolved[0].label_matched);

    let mut queue = ProposalQueue::new(source, resolved);
    let proposal_id = queue.pending()[0].id;
    let link = queue.confirm(proposal_id, None, &graph).unwrap();

    assert!(queue.pending().is_empty());
    assert_eq!(link.source_id, source);
    assert_eq!(link.target_id, target);
    assert_eq!(link.notes.as_deref(), Some("suggested as `Causes`"));
    assert_eq!(
        graph.get_by_concept(target).unwrap().incoming[0].label,
        "caused by"
    );

    let rerun = filter(&conn).filter(source, &candidates).unwrap();
    assert!(rerun.is_empty());

    let again = queue.confirm(proposal_id, None, &graph).unwrap_err();
    assert!(matches!(again, GraphError::InvalidInput(_)));
    assert_eq!(graph.links_between(source, target).unwrap().len(), 1);
}

#[test]
fn confirm_honours_user_selected_link_name() {
    let conn = open_db_in_memory().unwrap();
    let graph = graph(&conn);
    let registry = registry(&conn);
    let chosen = registry.create("refines", Some("refined by"), false).unwrap();
    let source = concept(&conn, "Source");
    let target = concept(&conn, "Target");

    let resolved = resolve(
        vec![candidate(target, "no such label", 0.65)],
        &registry.list().unwrap(),
    );
    assert!(!resolved[0].label_matched);
    assert_eq!(resolved[0].tier, ConfidenceTier::Medium);

    let mut queue = ProposalQueue::new(source, resolved);
    let proposal_id = queue.pending()[0].id;
    let link = queue.confirm(proposal_id, Some(chosen.id), &graph).unwrap();
    assert_eq!(link.link_name_id, chosen.id);
}

#[test]
fn failed_confirm_keeps_proposal_pending() {
    let conn = open_db_in_memory().unwrap();
    let graph = graph(&conn);
    let registry = registry(&conn);
    let source = concept(&conn, "Source");
    let target = concept(&conn, "Target");

    let resolved = resolve(
        vec![candidate(target, "related to", 0.9)],
        &registry.list().unwrap(),
    );
    let mut queue = ProposalQueue::new(source, resolved);
    let proposal_id = queue.pending()[0].id;

    SqliteConceptStore::try_new(&conn)
        .unwrap()
        .trash_concept(target)
        .unwrap();
    let err = queue.confirm(proposal_id, None, &graph).unwrap_err();
    assert!(matches!(err, GraphError::InvalidInput(_)));
    assert_eq!(queue.pending().len(), 1);
    assert!(graph.links_between(source, target).unwrap().is_empty());
}

#[test]
fn dismiss_removes_proposal_without_touching_graph() {
    let conn = open_db_in_memory().unwrap();
    let graph = graph(&conn);
    let registry = registry(&conn);
    let source = concept(&conn, "Source");
    let first = concept(&conn, "First");
    let second = concept(&conn, "Second");

    let resolved = resolve(
        vec![
            candidate(first, "related to", 0.9),
            candidate(second, "related to", 0.2),
        ],
        &registry.list().unwrap(),
    );
    let mut queue = ProposalQueue::new(source, resolved);
    assert_eq!(queue.source_id(), source);
    let dismissed_id = queue.pending()[0].id;

    let dismissed = queue.dismiss(dismissed_id).unwrap();
    assert_eq!(dismissed.proposal.candidate.target_id, first);
    assert_eq!(queue.pending().len(), 1);
    assert_eq!(queue.pending()[0].proposal.tier, ConfidenceTier::Low);
    assert!(graph.linked_peers(source).unwrap().is_empty());

    assert!(matches!(
        queue.dismiss(dismissed_id).unwrap_err(),
        GraphError::InvalidInput(_)
    ));
}
