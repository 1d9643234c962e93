use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, OptionalExtension, Params, Row, TransactionBehavior, params};

use super::Store;
use super::name::validate_name;
use super::schema::SCHEMA;
use crate::config::{DeletePolicy, HierarchyConfig};
use crate::error::{Error, Result};
use crate::types::*;

pub struct SqliteStore {
    conn: Mutex<Connection>,
    config: HierarchyConfig,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        Self::with_config(db_path, HierarchyConfig::default())
    }

    pub fn with_config<P: AsRef<Path>>(db_path: P, config: HierarchyConfig) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "journal_mode", "WAL")?;

        Self::from_connection(conn, config)
    }

    pub fn open_in_memory(config: HierarchyConfig) -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?, config)
    }

    fn from_connection(conn: Connection, config: HierarchyConfig) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(config.busy_timeout())?;

        Ok(Self {
            conn: Mutex::new(conn),
            config,
        })
    }

    pub fn config(&self) -> &HierarchyConfig {
        &self.config
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a guard to the underlying database connection.
    /// This allows consuming applications to execute custom SQL.
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn()
    }
}

fn folder_from_row(row: &Row<'_>) -> rusqlite::Result<Folder> {
    Ok(Folder {
        id: row.get(0)?,
        name: row.get(1)?,
        parent_id: row.get(2)?,
    })
}

fn fetch_folder(conn: &Connection, id: i64) -> Result<Option<Folder>> {
    conn.query_row(
        "SELECT id, name, parent_id FROM folders WHERE id = ?1",
        params![id],
        folder_from_row,
    )
    .optional()
    .map_err(Error::from)
}

fn require_folder(conn: &Connection, id: i64) -> Result<Folder> {
    fetch_folder(conn, id)?.ok_or(Error::NotFound)
}

fn query_folders<P: Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<Folder>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, folder_from_row)?;

    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Error::from)
}

fn is_descendant(conn: &Connection, ancestor_id: i64, descendant_id: i64) -> Result<bool> {
    let found: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM paths WHERE ancestor_id = ?1 AND descendant_id = ?2)",
        params![ancestor_id, descendant_id],
        |row| row.get(0),
    )?;
    Ok(found)
}

/// Writes the closure rows of a newly inserted folder: every ancestor row of
/// the parent extended by one link, plus the self row. A root has no rows yet,
/// so using its own id as the parent leaves only the self row.
fn insert_paths(conn: &Connection, id: i64, parent_id: Option<i64>) -> Result<usize> {
    let rows = conn.execute(
        "INSERT INTO paths (ancestor_id, descendant_id, depth)
         SELECT ancestor_id, ?1, depth + 1 FROM paths WHERE descendant_id = ?2
         UNION ALL SELECT ?1, ?1, 0",
        params![id, parent_id.unwrap_or(id)],
    )?;
    Ok(rows)
}

/// Severs the subtree rooted at `id` from the strict ancestors of `id`.
/// Rows inside the subtree, including the self row of `id`, are kept.
fn unbind_paths(conn: &Connection, id: i64) -> Result<usize> {
    let rows = conn.execute(
        "DELETE FROM paths
         WHERE descendant_id IN (
             SELECT descendant_id FROM paths WHERE ancestor_id = ?1
         )
         AND ancestor_id IN (
             SELECT ancestor_id FROM paths
             WHERE descendant_id = ?1 AND ancestor_id <> ?1
         )",
        params![id],
    )?;
    Ok(rows)
}

/// Connects every ancestor of `parent_id` (itself included) to every member
/// of the subtree rooted at `id`, across the new parent link.
fn bind_paths(conn: &Connection, id: i64, parent_id: i64) -> Result<usize> {
    let rows = conn.execute(
        "INSERT INTO paths (ancestor_id, descendant_id, depth)
         SELECT supertree.ancestor_id, subtree.descendant_id,
                supertree.depth + subtree.depth + 1
         FROM paths AS supertree
         CROSS JOIN paths AS subtree
         WHERE supertree.descendant_id = ?1
         AND subtree.ancestor_id = ?2",
        params![parent_id, id],
    )?;
    Ok(rows)
}

/// Orders folders so every parent comes before its children. Folders whose
/// parent chain never reaches a root are reported as a conflict.
fn parent_first_order(folders: &[Folder]) -> Result<Vec<(i64, Option<i64>)>> {
    let mut children: HashMap<i64, Vec<i64>> = HashMap::new();
    let mut queue = VecDeque::new();

    for folder in folders {
        match folder.parent_id {
            Some(parent_id) => children.entry(parent_id).or_default().push(folder.id),
            None => queue.push_back((folder.id, None)),
        }
    }

    let mut order = Vec::with_capacity(folders.len());
    while let Some((id, parent_id)) = queue.pop_front() {
        order.push((id, parent_id));
        if let Some(kids) = children.remove(&id) {
            queue.extend(kids.into_iter().map(|child| (child, Some(id))));
        }
    }

    if order.len() != folders.len() {
        let mut unreachable: Vec<i64> = children.into_values().flatten().collect();
        unreachable.sort_unstable();
        return Err(Error::Conflict(format!(
            "Folders not reachable from a root: {unreachable:?}"
        )));
    }

    Ok(order)
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // Folder operations

    fn create_folder(&self, name: &str, parent_id: Option<i64>) -> Result<Folder> {
        validate_name(name)?;

        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if let Some(parent_id) = parent_id {
            if fetch_folder(&tx, parent_id)?.is_none() {
                tracing::warn!("Rejected folder '{}': parent {} does not exist", name, parent_id);
                return Err(Error::ParentNotFound(parent_id));
            }
        }

        tx.execute(
            "INSERT INTO folders (name, parent_id) VALUES (?1, ?2)",
            params![name, parent_id],
        )?;
        let id = tx.last_insert_rowid();
        let edges = insert_paths(&tx, id, parent_id)?;

        tx.commit()?;
        tracing::debug!("Created folder {} under {:?} ({} paths)", id, parent_id, edges);

        Ok(Folder {
            id,
            name: name.to_string(),
            parent_id,
        })
    }

    fn get_folder(&self, id: i64) -> Result<Option<Folder>> {
        fetch_folder(&self.conn(), id)
    }

    fn list_roots(&self) -> Result<Vec<Folder>> {
        query_folders(
            &self.conn(),
            "SELECT id, name, parent_id FROM folders WHERE parent_id IS NULL ORDER BY id",
            [],
        )
    }

    fn rename_folder(&self, id: i64, name: &str) -> Result<Folder> {
        validate_name(name)?;

        let conn = self.conn();
        let rows = conn.execute(
            "UPDATE folders SET name = ?1 WHERE id = ?2",
            params![name, id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        require_folder(&conn, id)
    }

    fn move_folder(&self, id: i64, new_parent_id: Option<i64>) -> Result<Folder> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut folder = require_folder(&tx, id)?;

        if let Some(parent_id) = new_parent_id {
            if fetch_folder(&tx, parent_id)?.is_none() {
                tracing::warn!("Rejected move of folder {}: parent {} does not exist", id, parent_id);
                return Err(Error::ParentNotFound(parent_id));
            }

            if is_descendant(&tx, id, parent_id)? {
                return Err(Error::BadRequest(
                    "Cannot move folder into itself or its descendants".to_string(),
                ));
            }
        }

        if folder.parent_id == new_parent_id {
            return Ok(folder);
        }

        tx.execute(
            "UPDATE folders SET parent_id = ?1 WHERE id = ?2",
            params![new_parent_id, id],
        )?;

        let unbound = unbind_paths(&tx, id)?;
        let bound = match new_parent_id {
            Some(parent_id) => bind_paths(&tx, id, parent_id)?,
            None => 0,
        };

        tx.commit()?;
        tracing::debug!(
            "Moved folder {} from {:?} to {:?} (-{} +{} paths)",
            id,
            folder.parent_id,
            new_parent_id,
            unbound,
            bound
        );

        folder.parent_id = new_parent_id;
        Ok(folder)
    }

    fn delete_folder(&self, id: i64) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if fetch_folder(&tx, id)?.is_none() {
            return Ok(false);
        }

        let child_count: i64 = tx.query_row(
            "SELECT COUNT(*) FROM folders WHERE parent_id = ?1",
            params![id],
            |row| row.get(0),
        )?;

        if child_count > 0 {
            match self.config.delete_policy {
                DeletePolicy::Reject => {
                    tracing::warn!("Rejected delete of folder {}: {} children", id, child_count);
                    return Err(Error::HasChildren(id));
                }
                DeletePolicy::Cascade => {
                    let removed = tx.execute(
                        "DELETE FROM folders WHERE id IN (
                             SELECT descendant_id FROM paths
                             WHERE ancestor_id = ?1 AND depth > 0
                         )",
                        params![id],
                    )?;
                    tracing::debug!("Cascading delete of folder {} to {} descendants", id, removed);
                }
            }
        }

        let edges = tx.execute(
            "DELETE FROM paths
             WHERE descendant_id IN (
                 SELECT descendant_id FROM paths WHERE ancestor_id = ?1
             )",
            params![id],
        )?;
        let rows = tx.execute("DELETE FROM folders WHERE id = ?1", params![id])?;

        tx.commit()?;
        tracing::debug!("Deleted folder {} ({} paths)", id, edges);

        Ok(rows > 0)
    }

    // Hierarchy queries

    fn children(&self, id: i64) -> Result<Vec<Folder>> {
        let conn = self.conn();
        require_folder(&conn, id)?;

        query_folders(
            &conn,
            "SELECT id, name, parent_id FROM folders WHERE parent_id = ?1 ORDER BY id",
            params![id],
        )
    }

    fn siblings(&self, id: i64) -> Result<Vec<Folder>> {
        let conn = self.conn();
        let folder = require_folder(&conn, id)?;

        query_folders(
            &conn,
            "SELECT id, name, parent_id FROM folders
             WHERE parent_id IS ?1 AND id <> ?2 ORDER BY id",
            params![folder.parent_id, id],
        )
    }

    fn ancestors(&self, id: i64) -> Result<Vec<Folder>> {
        let conn = self.conn();
        require_folder(&conn, id)?;

        query_folders(
            &conn,
            "SELECT f.id, f.name, f.parent_id FROM folders f
             INNER JOIN paths p ON p.ancestor_id = f.id
             WHERE p.descendant_id = ?1 AND p.depth > 0
             ORDER BY p.depth DESC",
            params![id],
        )
    }

    fn descendants(&self, id: i64) -> Result<Vec<Folder>> {
        let conn = self.conn();
        require_folder(&conn, id)?;

        query_folders(
            &conn,
            "SELECT f.id, f.name, f.parent_id FROM folders f
             INNER JOIN paths p ON p.descendant_id = f.id
             WHERE p.ancestor_id = ?1 AND p.depth > 0
             ORDER BY p.depth, f.id",
            params![id],
        )
    }

    fn depth(&self, id: i64) -> Result<i64> {
        let conn = self.conn();
        let depth: Option<i64> = conn.query_row(
            "SELECT MAX(depth) FROM paths WHERE descendant_id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        depth.ok_or(Error::NotFound)
    }

    // Closure table maintenance

    fn list_paths(&self) -> Result<Vec<PathEdge>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT ancestor_id, descendant_id, depth FROM paths
             ORDER BY descendant_id, depth DESC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(PathEdge {
                ancestor_id: row.get(0)?,
                descendant_id: row.get(1)?,
                depth: row.get(2)?,
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn rebuild_paths(&self) -> Result<usize> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let folders = query_folders(&tx, "SELECT id, name, parent_id FROM folders ORDER BY id", [])?;
        let order = parent_first_order(&folders)?;

        tx.execute("DELETE FROM paths", [])?;

        let mut edges = 0;
        for (id, parent_id) in order {
            edges += insert_paths(&tx, id, parent_id)?;
        }

        tx.commit()?;
        tracing::info!("Rebuilt closure table: {} folders, {} paths", folders.len(), edges);

        Ok(edges)
    }

    fn close(&self) -> Result<()> {
        self.conn().execute_batch("PRAGMA optimize;")?;
        Ok(())
    }
}
