//! Link repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist directed links between concepts.
//! - Shape concept-centric and graph-wide read models with titles and
//!   labels joined in SQL.
//!
//! # Invariants
//! - Inserts only land when the referenced link name is live and both
//!   endpoints are active; the check runs inside the insert statement.
//! - Reads are ordered by `created_at ASC, rowid ASC`.
//! - Links are deleted by id only.

use crate::model::concept::{ConceptId, ConceptStatus};
use crate::model::link::{normalize_notes, Link, LinkId, LinkUpdate, NewLink};
use crate::model::link_name::{LinkDirection, LinkNamePairId};
use crate::repo::link_name_repo::load_link_name;
use crate::repo::{ensure_table_ready, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use serde::Serialize;
use std::collections::BTreeSet;

const LINK_SELECT_SQL: &str = "SELECT
    id,
    source_id,
    target_id,
    link_name_id,
    notes,
    created_at,
    updated_at
FROM links";

/// One link as seen from a concept, labelled for its direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptLinkItem {
    pub link_id: LinkId,
    pub direction: LinkDirection,
    /// Target for outgoing items, source for incoming items.
    pub peer_id: ConceptId,
    pub peer_title: String,
    /// `false` when the peer concept sits in the trash.
    pub peer_active: bool,
    pub link_name_id: LinkNamePairId,
    /// Forward label for outgoing, reverse label for incoming.
    pub label: String,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Links around one concept, split by direction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConceptLinks {
    pub outgoing: Vec<ConceptLinkItem>,
    pub incoming: Vec<ConceptLinkItem>,
}

/// Identifier-only projection for counting/dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkSummary {
    pub id: LinkId,
    pub source_id: ConceptId,
    pub target_id: ConceptId,
    pub link_name_id: LinkNamePairId,
}

/// Link joined with endpoint titles and both labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkDetail {
    #[serde(flatten)]
    pub link: Link,
    pub source_title: String,
    pub target_title: String,
    pub forward_name: String,
    pub reverse_name: String,
}

/// Repository interface for link persistence.
pub trait LinkRepository {
    fn create_link(&self, link: &NewLink) -> RepoResult<Link>;
    fn get_link(&self, id: LinkId) -> RepoResult<Option<Link>>;
    /// Applies a partial update and returns the stored result.
    fn update_link(&self, id: LinkId, update: &LinkUpdate) -> RepoResult<Link>;
    fn delete_link(&self, id: LinkId) -> RepoResult<()>;
    /// Whether a link with this exact (source, target, type) exists,
    /// ignoring `excluding`.
    fn link_exists(
        &self,
        source_id: ConceptId,
        target_id: ConceptId,
        link_name_id: LinkNamePairId,
        excluding: Option<LinkId>,
    ) -> RepoResult<bool>;
    fn list_for_concept(&self, concept_id: ConceptId) -> RepoResult<ConceptLinks>;
    fn list_summaries(&self) -> RepoResult<Vec<LinkSummary>>;
    fn list_details(&self) -> RepoResult<Vec<LinkDetail>>;
    /// Links between two concepts in either direction. Read-only navigation.
    fn links_between(&self, a: ConceptId, b: ConceptId) -> RepoResult<Vec<Link>>;
    /// Concepts connected to `concept_id` in either direction, any type.
    fn linked_peer_ids(&self, concept_id: ConceptId) -> RepoResult<BTreeSet<ConceptId>>;
}

/// SQLite-backed link repository.
pub struct SqliteLinkRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLinkRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(
            conn,
            "links",
            &[
                "id",
                "source_id",
                "target_id",
                "link_name_id",
                "notes",
                "created_at",
                "updated_at",
            ],
        )?;
        Ok(Self { conn })
    }
}

impl LinkRepository for SqliteLinkRepository<'_> {
    fn create_link(&self, link: &NewLink) -> RepoResult<Link> {
        let inserted = self.conn.execute(
            "INSERT INTO links (id, source_id, target_id, link_name_id, notes)
             SELECT ?1, ?2, ?3, ?4, ?5
             WHERE EXISTS (
                    SELECT 1 FROM concepts WHERE id = ?2 AND status = 'active'
                )
               AND EXISTS (
                    SELECT 1 FROM concepts WHERE id = ?3 AND status = 'active'
                )
               AND EXISTS (
                    SELECT 1 FROM link_name_pairs WHERE id = ?4 AND is_deleted = 0
                );",
            params![
                link.id.to_string(),
                link.source_id.to_string(),
                link.target_id.to_string(),
                link.link_name_id.to_string(),
                link.notes.as_deref(),
            ],
        )?;

        if inserted == 0 {
            ensure_endpoint_active(self.conn, link.source_id)?;
            ensure_endpoint_active(self.conn, link.target_id)?;
            return Err(RepoError::LinkNameNotFound(link.link_name_id));
        }

        load_link(self.conn, link.id)?.ok_or(RepoError::LinkNotFound(link.id))
    }

    fn get_link(&self, id: LinkId) -> RepoResult<Option<Link>> {
        load_link(self.conn, id)
    }

    fn update_link(&self, id: LinkId, update: &LinkUpdate) -> RepoResult<Link> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let current = load_link(&tx, id)?.ok_or(RepoError::LinkNotFound(id))?;

        let link_name_id = update.link_name_id.unwrap_or(current.link_name_id);
        if load_link_name(&tx, link_name_id, false)?.is_none() {
            return Err(RepoError::LinkNameNotFound(link_name_id));
        }
        let notes = match update.notes.as_deref() {
            Some(value) => normalize_notes(Some(value)),
            None => current.notes,
        };

        tx.execute(
            "UPDATE links
             SET link_name_id = ?2,
                 notes = ?3,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id.to_string(), link_name_id.to_string(), notes.as_deref()],
        )?;

        let updated = load_link(&tx, id)?.ok_or(RepoError::LinkNotFound(id))?;
        tx.commit()?;
        Ok(updated)
    }

    fn delete_link(&self, id: LinkId) -> RepoResult<()> {
        let removed = self
            .conn
            .execute("DELETE FROM links WHERE id = ?1;", [id.to_string()])?;
        if removed == 0 {
            return Err(RepoError::LinkNotFound(id));
        }
        Ok(())
    }

    fn link_exists(
        &self,
        source_id: ConceptId,
        target_id: ConceptId,
        link_name_id: LinkNamePairId,
        excluding: Option<LinkId>,
    ) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM links
                WHERE source_id = ?1
                  AND target_id = ?2
                  AND link_name_id = ?3
                  AND (?4 IS NULL OR id <> ?4)
            );",
            params![
                source_id.to_string(),
                target_id.to_string(),
                link_name_id.to_string(),
                excluding.map(|value| value.to_string()),
            ],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn list_for_concept(&self, concept_id: ConceptId) -> RepoResult<ConceptLinks> {
        Ok(ConceptLinks {
            outgoing: list_directional(self.conn, concept_id, LinkDirection::Outgoing)?,
            incoming: list_directional(self.conn, concept_id, LinkDirection::Incoming)?,
        })
    }

    fn list_summaries(&self) -> RepoResult<Vec<LinkSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, source_id, target_id, link_name_id
             FROM links
             ORDER BY created_at ASC, rowid ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(LinkSummary {
                id: uuid_column(row, "id", "links.id")?,
                source_id: uuid_column(row, "source_id", "links.source_id")?,
                target_id: uuid_column(row, "target_id", "links.target_id")?,
                link_name_id: uuid_column(row, "link_name_id", "links.link_name_id")?,
            });
        }
        Ok(items)
    }

    fn list_details(&self) -> RepoResult<Vec<LinkDetail>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                l.id AS id,
                l.source_id AS source_id,
                l.target_id AS target_id,
                l.link_name_id AS link_name_id,
                l.notes AS notes,
                l.created_at AS created_at,
                l.updated_at AS updated_at,
                s.title AS source_title,
                t.title AS target_title,
                p.forward_name AS forward_name,
                p.reverse_name AS reverse_name
             FROM links l
             INNER JOIN concepts s ON s.id = l.source_id
             INNER JOIN concepts t ON t.id = l.target_id
             INNER JOIN link_name_pairs p ON p.id = l.link_name_id
             ORDER BY l.created_at ASC, l.rowid ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(LinkDetail {
                link: parse_link_row(row)?,
                source_title: row.get("source_title")?,
                target_title: row.get("target_title")?,
                forward_name: row.get("forward_name")?,
                reverse_name: row.get("reverse_name")?,
            });
        }
        Ok(items)
    }

    fn links_between(&self, a: ConceptId, b: ConceptId) -> RepoResult<Vec<Link>> {
        let mut stmt = self.conn.prepare(&format!(
            "{LINK_SELECT_SQL}
             WHERE (source_id = ?1 AND target_id = ?2)
                OR (source_id = ?2 AND target_id = ?1)
             ORDER BY created_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query(params![a.to_string(), b.to_string()])?;
        let mut links = Vec::new();
        while let Some(row) = rows.next()? {
            links.push(parse_link_row(row)?);
        }
        Ok(links)
    }

    fn linked_peer_ids(&self, concept_id: ConceptId) -> RepoResult<BTreeSet<ConceptId>> {
        let mut stmt = self.conn.prepare(
            "SELECT target_id AS peer_id FROM links WHERE source_id = ?1
             UNION
             SELECT source_id AS peer_id FROM links WHERE target_id = ?1;",
        )?;
        let mut rows = stmt.query([concept_id.to_string()])?;
        let mut peers = BTreeSet::new();
        while let Some(row) = rows.next()? {
            peers.insert(uuid_column(row, "peer_id", "links.peer_id")?);
        }
        Ok(peers)
    }
}

fn list_directional(
    conn: &Connection,
    concept_id: ConceptId,
    direction: LinkDirection,
) -> RepoResult<Vec<ConceptLinkItem>> {
    let sql = match direction {
        LinkDirection::Outgoing => {
            "SELECT
                l.id AS link_id,
                l.target_id AS peer_id,
                c.title AS peer_title,
                c.status AS peer_status,
                l.link_name_id AS link_name_id,
                p.forward_name AS label,
                l.notes AS notes,
                l.created_at AS created_at,
                l.updated_at AS updated_at
             FROM links l
             INNER JOIN concepts c ON c.id = l.target_id
             INNER JOIN link_name_pairs p ON p.id = l.link_name_id
             WHERE l.source_id = ?1
             ORDER BY l.created_at ASC, l.rowid ASC;"
        }
        LinkDirection::Incoming => {
            "SELECT
                l.id AS link_id,
                l.source_id AS peer_id,
                c.title AS peer_title,
                c.status AS peer_status,
                l.link_name_id AS link_name_id,
                p.reverse_name AS label,
                l.notes AS notes,
                l.created_at AS created_at,
                l.updated_at AS updated_at
             FROM links l
             INNER JOIN concepts c ON c.id = l.source_id
             INNER JOIN link_name_pairs p ON p.id = l.link_name_id
             WHERE l.target_id = ?1
             ORDER BY l.created_at ASC, l.rowid ASC;"
        }
    };

    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([concept_id.to_string()])?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        let status_text: String = row.get("peer_status")?;
        let peer_status = ConceptStatus::from_db(&status_text).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid concept status `{status_text}` in concepts.status"
            ))
        })?;
        items.push(ConceptLinkItem {
            link_id: uuid_column(row, "link_id", "links.id")?,
            direction,
            peer_id: uuid_column(row, "peer_id", "links.peer_id")?,
            peer_title: row.get("peer_title")?,
            peer_active: peer_status == ConceptStatus::Active,
            link_name_id: uuid_column(row, "link_name_id", "links.link_name_id")?,
            label: row.get("label")?,
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        });
    }
    Ok(items)
}

fn load_link(conn: &Connection, id: LinkId) -> RepoResult<Option<Link>> {
    let mut stmt = conn.prepare(&format!("{LINK_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_link_row(row)?));
    }
    Ok(None)
}

fn ensure_endpoint_active(conn: &Connection, id: ConceptId) -> RepoResult<()> {
    let status: Option<String> = conn
        .query_row(
            "SELECT status FROM concepts WHERE id = ?1;",
            [id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    match status.as_deref().and_then(ConceptStatus::from_db) {
        None => Err(RepoError::ConceptNotFound(id)),
        Some(ConceptStatus::Trashed) => Err(RepoError::ConceptTrashed(id)),
        Some(ConceptStatus::Active) => Ok(()),
    }
}

fn parse_link_row(row: &Row<'_>) -> RepoResult<Link> {
    Ok(Link {
        id: uuid_column(row, "id", "links.id")?,
        source_id: uuid_column(row, "source_id", "links.source_id")?,
        target_id: uuid_column(row, "target_id", "links.target_id")?,
        link_name_id: uuid_column(row, "link_name_id", "links.link_name_id")?,
        notes: row.get("notes")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn uuid_column(row: &Row<'_>, name: &str, column: &'static str) -> RepoResult<uuid::Uuid> {
    let value: String = row.get(name)?;
    parse_uuid(&value, column)
}
