//! Concept store boundary and a SQLite implementation.
//!
//! # Responsibility
//! - Answer the graph's endpoint questions: does a concept exist, is it
//!   active, what is its title.
//! - Provide the minimal concept lifecycle (create, trash, restore, purge)
//!   needed to run the graph standalone.
//!
//! # Invariants
//! - Trashing keeps the row; links of trashed concepts stay intact.
//! - Purging deletes the concept and every link touching it in one
//!   transaction.

use crate::model::concept::{Concept, ConceptId, ConceptStatus};
use crate::repo::{ensure_table_ready, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const CONCEPT_SELECT_SQL: &str = "SELECT
    id,
    title,
    status,
    trashed_at,
    created_at,
    updated_at
FROM concepts";

/// Read-only questions the graph asks about concept endpoints.
pub trait ConceptStore {
    /// Whether the concept row exists (active or trashed).
    fn exists(&self, id: ConceptId) -> RepoResult<bool>;
    /// Whether the concept exists and is not in the trash.
    fn is_active(&self, id: ConceptId) -> RepoResult<bool>;
    fn get_title(&self, id: ConceptId) -> RepoResult<Option<String>>;
}

/// Result of one purge pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeReport {
    pub concepts_purged: usize,
    pub links_removed: usize,
}

/// Concept lifecycle persistence.
pub trait ConceptRepository: ConceptStore {
    fn create_concept(&self, title: &str) -> RepoResult<Concept>;
    fn get_concept(&self, id: ConceptId) -> RepoResult<Option<Concept>>;
    fn trash_concept(&self, id: ConceptId) -> RepoResult<()>;
    fn restore_concept(&self, id: ConceptId) -> RepoResult<()>;
    /// Hard-deletes one trashed concept together with its links.
    fn purge_concept(&self, id: ConceptId) -> RepoResult<PurgeReport>;
    /// Purges every concept trashed before `cutoff_epoch_ms`.
    fn purge_trashed_before(&self, cutoff_epoch_ms: i64) -> RepoResult<PurgeReport>;
}

/// SQLite-backed concept store.
pub struct SqliteConceptStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteConceptStore<'conn> {
    /// Creates a store from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(
            conn,
            "concepts",
            &[
                "id",
                "title",
                "status",
                "trashed_at",
                "created_at",
                "updated_at",
            ],
        )?;
        Ok(Self { conn })
    }
}

impl ConceptStore for SqliteConceptStore<'_> {
    fn exists(&self, id: ConceptId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM concepts WHERE id = ?1);",
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn is_active(&self, id: ConceptId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM concepts WHERE id = ?1 AND status = 'active'
            );",
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn get_title(&self, id: ConceptId) -> RepoResult<Option<String>> {
        let title = self
            .conn
            .query_row(
                "SELECT title FROM concepts WHERE id = ?1;",
                [id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(title)
    }
}

impl ConceptRepository for SqliteConceptStore<'_> {
    fn create_concept(&self, title: &str) -> RepoResult<Concept> {
        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO concepts (id, title, status) VALUES (?1, ?2, ?3);",
            params![id.to_string(), title, ConceptStatus::Active.as_db()],
        )?;
        self.get_concept(id)?.ok_or(RepoError::ConceptNotFound(id))
    }

    fn get_concept(&self, id: ConceptId) -> RepoResult<Option<Concept>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CONCEPT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_concept_row(row)?));
        }
        Ok(None)
    }

    fn trash_concept(&self, id: ConceptId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE concepts
             SET status = 'trashed',
                 trashed_at = COALESCE(trashed_at, strftime('%s', 'now') * 1000),
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::ConceptNotFound(id));
        }
        Ok(())
    }

    fn restore_concept(&self, id: ConceptId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE concepts
             SET status = 'active',
                 trashed_at = NULL,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::ConceptNotFound(id));
        }
        Ok(())
    }

    fn purge_concept(&self, id: ConceptId) -> RepoResult<PurgeReport> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let status: Option<String> = tx
            .query_row(
                "SELECT status FROM concepts WHERE id = ?1;",
                [id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        match status.as_deref() {
            None => return Err(RepoError::ConceptNotFound(id)),
            Some("trashed") => {}
            Some(_) => return Err(RepoError::ConceptNotTrashed(id)),
        }

        let links_removed = delete_links_touching(&tx, id)?;
        tx.execute("DELETE FROM concepts WHERE id = ?1;", [id.to_string()])?;
        tx.commit()?;

        Ok(PurgeReport {
            concepts_purged: 1,
            links_removed,
        })
    }

    fn purge_trashed_before(&self, cutoff_epoch_ms: i64) -> RepoResult<PurgeReport> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let expired = {
            let mut stmt = tx.prepare(
                "SELECT id
                 FROM concepts
                 WHERE status = 'trashed'
                   AND trashed_at < ?1
                 ORDER BY trashed_at ASC, id ASC;",
            )?;
            let mut rows = stmt.query([cutoff_epoch_ms])?;
            let mut ids = Vec::new();
            while let Some(row) = rows.next()? {
                let value: String = row.get(0)?;
                ids.push(parse_uuid(&value, "concepts.id")?);
            }
            ids
        };

        let mut report = PurgeReport::default();
        for id in expired {
            report.links_removed += delete_links_touching(&tx, id)?;
            tx.execute("DELETE FROM concepts WHERE id = ?1;", [id.to_string()])?;
            report.concepts_purged += 1;
        }
        tx.commit()?;

        Ok(report)
    }
}

fn delete_links_touching(conn: &Connection, id: ConceptId) -> RepoResult<usize> {
    let removed = conn.execute(
        "DELETE FROM links WHERE source_id = ?1 OR target_id = ?1;",
        [id.to_string()],
    )?;
    Ok(removed)
}

fn parse_concept_row(row: &Row<'_>) -> RepoResult<Concept> {
    let id_text: String = row.get("id")?;
    let status_text: String = row.get("status")?;
    let status = ConceptStatus::from_db(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid concept status `{status_text}` in concepts.status"
        ))
    })?;

    Ok(Concept {
        id: parse_uuid(&id_text, "concepts.id")?,
        title: row.get("title")?,
        status,
        trashed_at: row.get("trashed_at")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
