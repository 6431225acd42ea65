//! Task store: SQLite persistence for the task tree.
//!
//! Owns the connection, the schema, and the row-level operations. The row
//! helpers are free functions over `&Connection` so the repository can run
//! them either directly or inside a transaction (`rusqlite::Transaction`
//! derefs to `Connection`).

use crate::types::{DEFAULT_PRIORITY, Status, Task};
use chrono::{DateTime, Utc};
use eyre::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use std::fs;
use std::path::{Path, PathBuf};

/// Storage handle for the task database.
pub struct Storage {
    db: Connection,
    path: PathBuf,
}

impl Storage {
    /// Open (creating if necessary) the task database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir).context("Failed to create database directory")?;
        }

        let db = Connection::open(path).context("Failed to open SQLite database")?;
        db.execute_batch("PRAGMA foreign_keys = ON;")
            .context("Failed to enable foreign keys")?;

        let storage = Self {
            db,
            path: path.to_path_buf(),
        };
        storage.init_schema()?;

        Ok(storage)
    }

    /// Initialize the schema.
    fn init_schema(&self) -> Result<()> {
        self.db
            .execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS tasks (
                    id          INTEGER PRIMARY KEY,
                    parent_id   INTEGER REFERENCES tasks(id),
                    title       TEXT NOT NULL,
                    description TEXT,
                    status      TEXT NOT NULL DEFAULT 'todo'
                                CHECK (status IN ('todo', 'in_progress', 'done')),
                    priority    INTEGER NOT NULL DEFAULT 3 CHECK (priority BETWEEN 1 AND 5),
                    category    TEXT,
                    due_at      TEXT,
                    order_index INTEGER NOT NULL DEFAULT 0,
                    created_at  TEXT NOT NULL,
                    updated_at  TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_tasks_parent ON tasks(parent_id);
                CREATE INDEX IF NOT EXISTS idx_tasks_title ON tasks(title);
                CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);
                CREATE INDEX IF NOT EXISTS idx_tasks_priority ON tasks(priority);
                CREATE INDEX IF NOT EXISTS idx_tasks_due ON tasks(due_at);
                CREATE INDEX IF NOT EXISTS idx_tasks_order ON tasks(parent_id, order_index);
            "#,
            )
            .context("Failed to initialize schema")?;

        Ok(())
    }

    /// Path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read-only access to the connection.
    pub(crate) fn conn(&self) -> &Connection {
        &self.db
    }

    /// Start a transaction. Dropping it without commit rolls back.
    pub(crate) fn transaction(&mut self) -> Result<Transaction<'_>> {
        Ok(self.db.transaction()?)
    }

    /// Copy the database file into `dest_dir` under a timestamped name
    /// (`tasks_YYYYMMDD_HHMMSS.db`), creating the directory if absent.
    ///
    /// The store runs in rollback-journal mode, so a copy taken between
    /// operations is a consistent snapshot. Backing up while another process
    /// writes the same file is the caller's responsibility to avoid.
    pub fn backup(&self, dest_dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dest_dir).context("Failed to create backup directory")?;

        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let dest = dest_dir.join(format!("tasks_{}.db", stamp));
        fs::copy(&self.path, &dest).context("Failed to copy database file")?;

        log::info!("Backed up {} to {}", self.path.display(), dest.display());
        Ok(dest)
    }
}

/// Point lookup by id.
pub(crate) fn get_task(conn: &Connection, id: i64) -> Result<Option<Task>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, parent_id, title, description, status, priority, category,
               due_at, order_index, created_at, updated_at
        FROM tasks WHERE id = ?1
        "#,
    )?;

    let task = stmt.query_row(params![id], row_to_task).optional()?;
    Ok(task)
}

/// Direct children of `parent_id` (or roots for `None`), ordered by
/// `order_index`.
pub(crate) fn children_of(conn: &Connection, parent_id: Option<i64>) -> Result<Vec<Task>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, parent_id, title, description, status, priority, category,
               due_at, order_index, created_at, updated_at
        FROM tasks WHERE parent_id IS ?1
        ORDER BY order_index, id
        "#,
    )?;

    let tasks = stmt
        .query_map(params![parent_id], row_to_task)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(tasks)
}

/// Ids of the direct children of `parent_id`, ordered by `order_index`.
pub(crate) fn child_ids(conn: &Connection, parent_id: Option<i64>) -> Result<Vec<i64>> {
    let mut stmt =
        conn.prepare("SELECT id FROM tasks WHERE parent_id IS ?1 ORDER BY order_index, id")?;
    let ids = stmt
        .query_map(params![parent_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(ids)
}

/// Whether the task has any direct children.
pub(crate) fn has_children(conn: &Connection, id: i64) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM tasks WHERE parent_id = ?1",
        params![id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// The order index for a new child of `parent_id`: one past the current
/// maximum, 0 when there are no siblings yet.
pub(crate) fn next_order_index(conn: &Connection, parent_id: Option<i64>) -> Result<i64> {
    let next: i64 = conn.query_row(
        "SELECT COALESCE(MAX(order_index), -1) + 1 FROM tasks WHERE parent_id IS ?1",
        params![parent_id],
        |row| row.get(0),
    )?;
    Ok(next)
}

/// Insert a new task row with default status and priority; returns the
/// assigned id.
pub(crate) fn insert_task(
    conn: &Connection,
    parent_id: Option<i64>,
    title: &str,
    description: Option<&str>,
    order_index: i64,
    now: DateTime<Utc>,
) -> Result<i64> {
    conn.execute(
        r#"
        INSERT INTO tasks (parent_id, title, description, status, priority,
                           order_index, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
        "#,
        params![
            parent_id,
            title,
            description,
            Status::Todo.as_str(),
            DEFAULT_PRIORITY,
            order_index,
            now.to_rfc3339(),
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

/// Write every mutable column of the task back to its row.
pub(crate) fn persist_task(conn: &Connection, task: &Task) -> Result<()> {
    conn.execute(
        r#"
        UPDATE tasks
        SET parent_id = ?2, title = ?3, description = ?4, status = ?5,
            priority = ?6, category = ?7, due_at = ?8, order_index = ?9,
            updated_at = ?10
        WHERE id = ?1
        "#,
        params![
            task.id,
            task.parent_id,
            task.title,
            task.description,
            task.status.as_str(),
            task.priority,
            task.category,
            task.due_at.map(|dt| dt.to_rfc3339()),
            task.order_index,
            task.updated_at.to_rfc3339(),
        ],
    )?;

    Ok(())
}

/// Reparent a row and refresh its `updated_at`.
pub(crate) fn set_parent(
    conn: &Connection,
    id: i64,
    parent_id: Option<i64>,
    now: DateTime<Utc>,
) -> Result<()> {
    conn.execute(
        "UPDATE tasks SET parent_id = ?2, updated_at = ?3 WHERE id = ?1",
        params![id, parent_id, now.to_rfc3339()],
    )?;
    Ok(())
}

/// Assign an order index to a row, skipping the write if it already holds it.
pub(crate) fn set_order_index(conn: &Connection, id: i64, order_index: i64) -> Result<()> {
    conn.execute(
        "UPDATE tasks SET order_index = ?2 WHERE id = ?1 AND order_index != ?2",
        params![id, order_index],
    )?;
    Ok(())
}

/// Delete a single row.
pub(crate) fn delete_task(conn: &Connection, id: i64) -> Result<()> {
    conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
    Ok(())
}

/// Restore the `0..n` contiguity of one sibling group, preserving the
/// current relative order. Idempotent.
pub(crate) fn reindex_siblings(conn: &Connection, parent_id: Option<i64>) -> Result<()> {
    let ids = child_ids(conn, parent_id)?;
    for (position, id) in ids.iter().enumerate() {
        set_order_index(conn, *id, position as i64)?;
    }
    Ok(())
}

/// Substring scan over title and description. SQLite's LIKE is
/// case-insensitive for ASCII, which is the documented behavior here.
pub(crate) fn search_tasks(conn: &Connection, query: &str) -> Result<Vec<Task>> {
    let like = format!("%{}%", query);
    let mut stmt = conn.prepare(
        r#"
        SELECT id, parent_id, title, description, status, priority, category,
               due_at, order_index, created_at, updated_at
        FROM tasks WHERE title LIKE ?1 OR description LIKE ?1
        "#,
    )?;

    let tasks = stmt
        .query_map(params![like], row_to_task)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(tasks)
}

/// Convert a database row to a Task.
fn row_to_task(row: &rusqlite::Row) -> rusqlite::Result<Task> {
    let status_str: String = row.get(4)?;
    let status = Status::parse(&status_str).unwrap_or(Status::Todo);

    let due_at_str: Option<String> = row.get(7)?;
    let created_at_str: String = row.get(9)?;
    let updated_at_str: String = row.get(10)?;

    Ok(Task {
        id: row.get(0)?,
        parent_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        status,
        priority: row.get(5)?,
        category: row.get(6)?,
        due_at: due_at_str.and_then(|s| parse_timestamp(&s)),
        order_index: row.get(8)?,
        created_at: parse_timestamp(&created_at_str).unwrap_or_else(Utc::now),
        updated_at: parse_timestamp(&updated_at_str).unwrap_or_else(Utc::now),
    })
}

/// Lenient RFC 3339 parse; malformed rows are logged, not fatal.
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(s) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(e) => {
            log::warn!("Failed to parse timestamp {:?}: {}", s, e);
            None
        }
    }
}
