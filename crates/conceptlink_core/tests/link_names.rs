use conceptlink_core::db::open_db_in_memory;
use conceptlink_core::{
    ConceptRepository, GraphError, LinkGraphService, LinkNameRegistry, Reference,
    SqliteConceptStore, SqliteLinkNameRepository, SqliteLinkRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

const RELATED_TO: &str = "00000000-0000-4000-8000-000000000101";

type SqliteGraph<'conn> = LinkGraphService<
    SqliteConceptStore<'conn>,
    SqliteLinkNameRepository<'conn>,
    SqliteLinkRepository<'conn>,
>;

fn registry(conn: &Connection) -> LinkNameRegistry<SqliteLinkNameRepository<'_>> {
    LinkNameRegistry::new(SqliteLinkNameRepository::try_new(conn).unwrap())
}

fn graph(conn: &Connection) -> SqliteGraph<'_> {
    LinkGraphService::new(
        SqliteConceptStore::try_new(conn).unwrap(),
        SqliteLinkNameRepository::try_new(conn).unwrap(),
        SqliteLinkRepository::try_new(conn).unwrap(),
    )
}

fn concept(conn: &Connection, title: &str) -> Uuid {
    SqliteConceptStore::try_new(conn)
        .unwrap()
        .create_concept(title)
        .unwrap()
        .id
}

#[test]
fn create_normalizes_labels_and_defaults_reverse() {
    let conn = open_db_in_memory().unwrap();
    let registry = registry(&conn);

    let directed = registry
        .create("  depends   on ", Some(" required  by "), false)
        .unwrap();
    assert_eq!(directed.forward_name, "depends on");
    assert_eq!(directed.reverse_name, "required by");
    assert!(!directed.is_default);
    assert!(!directed.is_deleted);

    let no_reverse = registry.create("mirrors", None, false).unwrap();
    assert_eq!(no_reverse.reverse_name, "mirrors");

    let err = registry.create("   ", Some("x"), false).unwrap_err();
    assert!(matches!(err, GraphError::InvalidInput(_)));
}

#[test]
fn symmetric_pair_stays_coupled_through_create_and_rename() {
    let conn = open_db_in_memory().unwrap();
    let registry = registry(&conn);

    let created = registry
        .create("relates to", Some("is related from"), true)
        .unwrap();
    assert_eq!(created.forward_name, "relates to");
    assert_eq!(created.reverse_name, "relates to");

    let renamed = registry
        .rename(created.id, "connects with", Some("ignored"))
        .unwrap();
    assert_eq!(renamed.forward_name, "connects with");
    assert_eq!(renamed.reverse_name, "connects with");
    assert!(renamed.is_symmetric);

    let reloaded = registry.get(created.id).unwrap();
    assert_eq!(reloaded, renamed);
}

#[test]
fn rename_without_reverse_keeps_stored_reverse() {
    let conn = open_db_in_memory().unwrap();
    let registry = registry(&conn);

    let pair = registry
        .create("supports", Some("supported by"), false)
        .unwrap();
    let renamed = registry.rename(pair.id, "backs", None).unwrap();
    assert_eq!(renamed.forward_name, "backs");
    assert_eq!(renamed.reverse_name, "supported by");

    let renamed = registry
        .rename(pair.id, "backs", Some("backed by"))
        .unwrap();
    assert_eq!(renamed.reverse_name, "backed by");
}

#[test]
fn rename_of_unknown_pair_is_reference_not_found() {
    let conn = open_db_in_memory().unwrap();
    let missing = Uuid::new_v4();

    let err = registry(&conn).rename(missing, "anything", None).unwrap_err();
    assert!(matches!(
        err,
        GraphError::ReferenceNotFound(Reference::LinkName(id)) if id == missing
    ));
}

#[test]
fn usage_count_is_computed_live() {
    let conn = open_db_in_memory().unwrap();
    let registry = registry(&conn);
    let graph = graph(&conn);
    let pair = registry.create("cites", Some("cited by"), false).unwrap();
    let a = concept(&conn, "A");
    let b = concept(&conn, "B");
    let c = concept(&conn, "C");

    assert_eq!(registry.usage_count(pair.id).unwrap(), 0);
    let first = graph.create_link(a, b, pair.id, None).unwrap();
    graph.create_link(a, c, pair.id, None).unwrap();
    assert_eq!(registry.usage_count(pair.id).unwrap(), 2);

    graph.delete_link(first.id).unwrap();
    assert_eq!(registry.usage_count(pair.id).unwrap(), 1);

    let listed = registry
        .list_with_usage()
        .unwrap()
        .into_iter()
        .find(|entry| entry.pair.id == pair.id)
        .unwrap();
    assert_eq!(listed.usage_count, 1);

    assert!(matches!(
        registry.usage_count(Uuid::new_v4()).unwrap_err(),
        GraphError::ReferenceNotFound(Reference::LinkName(_))
    ));
}

#[test]
fn deleting_unused_pair_removes_it_immediately() {
    let conn = open_db_in_memory().unwrap();
    let registry = registry(&conn);
    let pair = registry.create("unused", None, false).unwrap();

    let deletion = registry.delete(pair.id, Some(Uuid::new_v4())).unwrap();
    assert_eq!(deletion.repointed, 0);
    assert_eq!(deletion.replacement_id, None);

    assert!(registry.list().unwrap().iter().all(|live| live.id != pair.id));
    assert!(matches!(
        registry.get(pair.id).unwrap_err(),
        GraphError::ReferenceNotFound(_)
    ));
    // The tombstoned pair still reports zero usage.
    assert_eq!(registry.usage_count(pair.id).unwrap(), 0);
}

#[test]
fn deleting_used_pair_without_replacement_reports_pair_in_use() {
    let conn = open_db_in_memory().unwrap();
    let registry = registry(&conn);
    let graph = graph(&conn);
    let pair = registry.create("builds on", None, false).unwrap();
    let a = concept(&conn, "A");
    let b = concept(&conn, "B");
    let c = concept(&conn, "C");
    let first = graph.create_link(a, b, pair.id, None).unwrap();
    let second = graph.create_link(c, b, pair.id, None).unwrap();

    match registry.delete(pair.id, None).unwrap_err() {
        GraphError::PairInUse { id, usage_count } => {
            assert_eq!(id, pair.id);
            assert_eq!(usage_count, 2);
        }
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(registry.get(pair.id).unwrap(), pair);
    assert_eq!(graph.get_link(first.id).unwrap().link_name_id, pair.id);
    assert_eq!(graph.get_link(second.id).unwrap().link_name_id, pair.id);
}

#[test]
fn deleting_used_pair_with_replacement_repoints_every_link() {
    let conn = open_db_in_memory().unwrap();
    let registry = registry(&conn);
    let graph = graph(&conn);
    let old = registry.create("builds on", Some("built upon by"), false).unwrap();
    let replacement = registry.create("extends", Some("extended by"), false).unwrap();
    let a = concept(&conn, "A");
    let b = concept(&conn, "B");
    let c = concept(&conn, "C");

    graph.create_link(a, b, old.id, None).unwrap();
    graph.create_link(b, c, old.id, None).unwrap();
    graph.create_link(c, a, old.id, Some("kept")).unwrap();
    // Same endpoints as a repointed link; both survive the repoint.
    graph.create_link(a, b, replacement.id, None).unwrap();
    let before = registry.usage_count(replacement.id).unwrap();

    let deletion = registry.delete(old.id, Some(replacement.id)).unwrap();
    assert_eq!(deletion.repointed, 3);
    assert_eq!(deletion.replacement_id, Some(replacement.id));

    assert_eq!(registry.usage_count(old.id).unwrap(), 0);
    assert_eq!(registry.usage_count(replacement.id).unwrap(), before + 3);
    assert!(registry.get(old.id).is_err());

    let incoming = graph.get_by_concept(a).unwrap().incoming;
    assert_eq!(incoming.len(), 1);
    assert_eq!(incoming[0].label, "extended by");
    assert_eq!(incoming[0].notes.as_deref(), Some("kept"));
}

#[test]
fn delete_rejections_leave_storage_untouched() {
    let conn = open_db_in_memory().unwrap();
    let registry = registry(&conn);
    let graph = graph(&conn);
    let pair = registry.create("influences", None, false).unwrap();
    let a = concept(&conn, "A");
    let b = concept(&conn, "B");
    graph.create_link(a, b, pair.id, None).unwrap();

    let same = registry.delete(pair.id, Some(pair.id)).unwrap_err();
    assert!(matches!(same, GraphError::InvalidInput(_)));

    let missing = Uuid::new_v4();
    let unknown = registry.delete(pair.id, Some(missing)).unwrap_err();
    assert!(matches!(
        unknown,
        GraphError::ReferenceNotFound(Reference::LinkName(id)) if id == missing
    ));

    let retired = registry.create("retired", None, false).unwrap();
    registry.delete(retired.id, None).unwrap();
    let to_retired = registry.delete(pair.id, Some(retired.id)).unwrap_err();
    assert!(matches!(to_retired, GraphError::ReferenceNotFound(_)));

    assert_eq!(registry.usage_count(pair.id).unwrap(), 1);
    assert!(registry.get(pair.id).is_ok());
}

#[test]
fn default_pairs_cannot_be_deleted() {
    let conn = open_db_in_memory().unwrap();
    let registry = registry(&conn);
    let related_to = Uuid::parse_str(RELATED_TO).unwrap();

    let err = registry.delete(related_to, None).unwrap_err();
    assert!(matches!(err, GraphError::InvalidInput(_)));
    assert!(registry.get(related_to).unwrap().is_default);
}

#[test]
fn list_returns_live_pairs_in_creation_order() {
    let conn = open_db_in_memory().unwrap();
    let registry = registry(&conn);
    let first = registry.create("first custom", None, false).unwrap();
    let second = registry.create("second custom", None, true).unwrap();
    registry.delete(first.id, None).unwrap();

    let listed = registry.list().unwrap();
    assert_eq!(listed.len(), 7);
    assert_eq!(listed[0].forward_name, "related to");
    assert_eq!(listed.last().unwrap().id, second.id);
}

#[test]
fn link_name_serializes_in_camel_case() {
    let conn = open_db_in_memory().unwrap();
    let pair = registry(&conn)
        .create("refines", Some("refined by"), false)
        .unwrap();

    let value = serde_json::to_value(&pair).unwrap();
    assert_eq!(value["forwardName"], "refines");
    assert_eq!(value["reverseName"], "refined by");
    assert_eq!(value["isSymmetric"], false);
    assert_eq!(value["isDeleted"], false);
}
