//! Link name pair repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist relationship-type vocabulary.
//! - Compute usage counts live from the `links` table.
//! - Own the safe-delete protocol (repoint, then tombstone) in one
//!   transaction.
//!
//! # Invariants
//! - Usage counts are never stored.
//! - A tombstoned pair is referenced by zero links.
//! - `PairInUse` and every other delete failure leave storage untouched.

use crate::model::link_name::{couple_labels, LinkNamePair, LinkNamePairId, NewLinkNamePair};
use crate::repo::{bool_to_int, ensure_table_ready, parse_flag, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

const LINK_NAME_SELECT_SQL: &str = "SELECT
    id,
    forward_name,
    reverse_name,
    is_symmetric,
    is_default,
    is_deleted,
    created_at,
    updated_at
FROM link_name_pairs";

/// Link name pair together with its live usage count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkNameUsage {
    pub pair: LinkNamePair,
    pub usage_count: u64,
}

/// Outcome of a successful safe delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkNameDeletion {
    pub id: LinkNamePairId,
    /// Replacement the links were moved to; `None` when the pair was unused.
    pub replacement_id: Option<LinkNamePairId>,
    pub repointed: usize,
}

/// Repository interface for link name vocabulary.
pub trait LinkNameRepository {
    fn create_link_name(&self, pair: &NewLinkNamePair) -> RepoResult<LinkNamePair>;
    /// Loads one pair. Tombstoned pairs only when `include_deleted`.
    fn get_link_name(
        &self,
        id: LinkNamePairId,
        include_deleted: bool,
    ) -> RepoResult<Option<LinkNamePair>>;
    /// Lists pairs in creation order.
    fn list_link_names(&self, include_deleted: bool) -> RepoResult<Vec<LinkNamePair>>;
    /// Lists live pairs with usage counts in creation order.
    fn list_link_names_with_usage(&self) -> RepoResult<Vec<LinkNameUsage>>;
    /// Renames a live pair; `reverse_name = None` keeps the stored reverse.
    fn rename_link_name(
        &self,
        id: LinkNamePairId,
        forward_name: &str,
        reverse_name: Option<&str>,
    ) -> RepoResult<LinkNamePair>;
    fn usage_count(&self, id: LinkNamePairId) -> RepoResult<u64>;
    /// Runs the safe-delete protocol for one live pair.
    fn delete_link_name(
        &self,
        id: LinkNamePairId,
        replacement_id: Option<LinkNamePairId>,
    ) -> RepoResult<LinkNameDeletion>;
}

/// SQLite-backed link name repository.
pub struct SqliteLinkNameRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLinkNameRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(
            conn,
            "link_name_pairs",
            &[
                "id",
                "forward_name",
                "reverse_name",
                "is_symmetric",
                "is_default",
                "is_deleted",
                "created_at",
                "updated_at",
            ],
        )?;
        Ok(Self { conn })
    }
}

impl LinkNameRepository for SqliteLinkNameRepository<'_> {
    fn create_link_name(&self, pair: &NewLinkNamePair) -> RepoResult<LinkNamePair> {
        self.conn.execute(
            "INSERT INTO link_name_pairs (
                id,
                forward_name,
                reverse_name,
                is_symmetric,
                is_default,
                is_deleted
            ) VALUES (?1, ?2, ?3, ?4, 0, 0);",
            params![
                pair.id.to_string(),
                pair.labels.forward_name.as_str(),
                pair.labels.reverse_name.as_str(),
                bool_to_int(pair.is_symmetric),
            ],
        )?;
        load_link_name(self.conn, pair.id, false)?.ok_or(RepoError::LinkNameNotFound(pair.id))
    }

    fn get_link_name(
        &self,
        id: LinkNamePairId,
        include_deleted: bool,
    ) -> RepoResult<Option<LinkNamePair>> {
        load_link_name(self.conn, id, include_deleted)
    }

    fn list_link_names(&self, include_deleted: bool) -> RepoResult<Vec<LinkNamePair>> {
        let mut stmt = self.conn.prepare(&format!(
            "{LINK_NAME_SELECT_SQL}
             WHERE (?1 = 1 OR is_deleted = 0)
             ORDER BY created_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([bool_to_int(include_deleted)])?;
        let mut pairs = Vec::new();
        while let Some(row) = rows.next()? {
            pairs.push(parse_link_name_row(row)?);
        }
        Ok(pairs)
    }

    fn list_link_names_with_usage(&self) -> RepoResult<Vec<LinkNameUsage>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                p.id AS id,
                p.forward_name AS forward_name,
                p.reverse_name AS reverse_name,
                p.is_symmetric AS is_symmetric,
                p.is_default AS is_default,
                p.is_deleted AS is_deleted,
                p.created_at AS created_at,
                p.updated_at AS updated_at,
                (SELECT COUNT(*) FROM links l WHERE l.link_name_id = p.id) AS usage_count
             FROM link_name_pairs p
             WHERE p.is_deleted = 0
             ORDER BY p.created_at ASC, p.rowid ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            let usage_count: i64 = row.get("usage_count")?;
            items.push(LinkNameUsage {
                pair: parse_link_name_row(row)?,
                usage_count: usage_count as u64,
            });
        }
        Ok(items)
    }

    fn rename_link_name(
        &self,
        id: LinkNamePairId,
        forward_name: &str,
        reverse_name: Option<&str>,
    ) -> RepoResult<LinkNamePair> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let current = load_link_name(&tx, id, false)?.ok_or(RepoError::LinkNameNotFound(id))?;

        let labels = couple_labels(
            forward_name,
            reverse_name.or(Some(current.reverse_name.as_str())),
            current.is_symmetric,
        )?;

        tx.execute(
            "UPDATE link_name_pairs
             SET forward_name = ?2,
                 reverse_name = ?3,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND is_deleted = 0;",
            params![
                id.to_string(),
                labels.forward_name.as_str(),
                labels.reverse_name.as_str(),
            ],
        )?;

        let renamed = load_link_name(&tx, id, false)?.ok_or(RepoError::LinkNameNotFound(id))?;
        tx.commit()?;
        Ok(renamed)
    }

    fn usage_count(&self, id: LinkNamePairId) -> RepoResult<u64> {
        if load_link_name(self.conn, id, true)?.is_none() {
            return Err(RepoError::LinkNameNotFound(id));
        }
        count_usage(self.conn, id)
    }

    fn delete_link_name(
        &self,
        id: LinkNamePairId,
        replacement_id: Option<LinkNamePairId>,
    ) -> RepoResult<LinkNameDeletion> {
        // Dropping `tx` on any early return rolls the whole protocol back.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let pair = load_link_name(&tx, id, false)?.ok_or(RepoError::LinkNameNotFound(id))?;
        if pair.is_default {
            return Err(RepoError::DefaultPairProtected(id));
        }

        let usage_count = count_usage(&tx, id)?;
        if usage_count == 0 {
            tombstone_link_name(&tx, id)?;
            tx.commit()?;
            return Ok(LinkNameDeletion {
                id,
                replacement_id: None,
                repointed: 0,
            });
        }

        let Some(replacement_id) = replacement_id else {
            return Err(RepoError::PairInUse { id, usage_count });
        };
        if replacement_id == id {
            return Err(RepoError::ReplacementIsSame(id));
        }
        if load_link_name(&tx, replacement_id, false)?.is_none() {
            return Err(RepoError::LinkNameNotFound(replacement_id));
        }

        let repointed = tx.execute(
            "UPDATE links
             SET link_name_id = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE link_name_id = ?1;",
            params![id.to_string(), replacement_id.to_string()],
        )?;
        if repointed as u64 != usage_count {
            return Err(RepoError::InvalidData(format!(
                "repointed {repointed} link(s) for link name {id}, expected {usage_count}"
            )));
        }

        tombstone_link_name(&tx, id)?;
        tx.commit()?;

        Ok(LinkNameDeletion {
            id,
            replacement_id: Some(replacement_id),
            repointed,
        })
    }
}

pub(crate) fn load_link_name(
    conn: &Connection,
    id: LinkNamePairId,
    include_deleted: bool,
) -> RepoResult<Option<LinkNamePair>> {
    let mut stmt = conn.prepare(&format!(
        "{LINK_NAME_SELECT_SQL}
         WHERE id = ?1
           AND (?2 = 1 OR is_deleted = 0);"
    ))?;
    let mut rows = stmt.query(params![id.to_string(), bool_to_int(include_deleted)])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_link_name_row(row)?));
    }
    Ok(None)
}

fn count_usage(conn: &Connection, id: LinkNamePairId) -> RepoResult<u64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM links WHERE link_name_id = ?1;",
        [id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count as u64)
}

fn tombstone_link_name(conn: &Connection, id: LinkNamePairId) -> RepoResult<()> {
    conn.execute(
        "UPDATE link_name_pairs
         SET is_deleted = 1,
             updated_at = (strftime('%s', 'now') * 1000)
         WHERE id = ?1;",
        [id.to_string()],
    )?;
    Ok(())
}

fn parse_link_name_row(row: &Row<'_>) -> RepoResult<LinkNamePair> {
    let id_text: String = row.get("id")?;
    let pair = LinkNamePair {
        id: parse_uuid(&id_text, "link_name_pairs.id")?,
        forward_name: row.get("forward_name")?,
        reverse_name: row.get("reverse_name")?,
        is_symmetric: parse_flag(row.get("is_symmetric")?, "link_name_pairs.is_symmetric")?,
        is_default: parse_flag(row.get("is_default")?, "link_name_pairs.is_default")?,
        is_deleted: parse_flag(row.get("is_deleted")?, "link_name_pairs.is_deleted")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    pair.validate()
        .map_err(|err| RepoError::InvalidData(format!("link name {id_text}: {err}")))?;
    Ok(pair)
}
