//! Ordered-tree repository over the task store.
//!
//! Every mutating operation runs as one transaction: either all row changes
//! commit or none do. After any operation completes, each sibling group's
//! `order_index` values are exactly `0..n` — adds append at the end, deletes
//! and moves reindex the groups they touch.

use crate::storage::{self, Storage};
use crate::types::{DEFAULT_PRIORITY, Status, Task, TaskPatch, ValidationError, validate_title};
use chrono::Utc;
use eyre::{Context, Result};
use rusqlite::Connection;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Errors that can occur during repository operations.
///
/// Missing ids are not errors: lookups return `Option` and mutations on
/// absent rows are no-ops, so callers can tell "nothing to do" from
/// "something broke".
#[derive(Debug)]
pub enum RepoError {
    /// The requested parent does not exist.
    ParentNotFound(i64),
    /// The move target is the task itself or one of its descendants.
    CycleDetected,
    /// Non-cascading delete of a task that still has children.
    HasChildren(i64),
    /// Field validation failed.
    Validation(ValidationError),
}

impl std::fmt::Display for RepoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepoError::ParentNotFound(id) => write!(f, "parent task not found: {}", id),
            RepoError::CycleDetected => {
                write!(f, "cannot move a task under itself or its own descendant")
            }
            RepoError::HasChildren(id) => {
                write!(f, "task {} still has children; delete with cascade", id)
            }
            RepoError::Validation(e) => write!(f, "validation error: {}", e),
        }
    }
}

impl std::error::Error for RepoError {}

/// The ordered-tree task repository.
pub struct TaskRepository {
    storage: Storage,
}

impl TaskRepository {
    /// Open the repository over the database at `path`, creating it if
    /// necessary.
    pub fn open(path: &Path) -> Result<Self> {
        let storage = Storage::open(path)?;
        Ok(Self { storage })
    }

    /// The underlying store.
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Create a task as the last child of `parent_id` (or as the last root).
    ///
    /// The new row gets `order_index = 1 + max(sibling indices)`, so no
    /// reindexing is needed.
    pub fn add(
        &mut self,
        parent_id: Option<i64>,
        title: &str,
        description: Option<&str>,
    ) -> Result<Task> {
        validate_title(title).map_err(|e| eyre::eyre!(RepoError::Validation(e)))?;

        let tx = self.storage.transaction()?;
        if let Some(pid) = parent_id
            && storage::get_task(&tx, pid)?.is_none()
        {
            return Err(eyre::eyre!(RepoError::ParentNotFound(pid)));
        }

        let now = Utc::now();
        let order_index = storage::next_order_index(&tx, parent_id)?;
        let id = storage::insert_task(&tx, parent_id, title, description, order_index, now)
            .context("Failed to insert task")?;
        tx.commit()?;

        Ok(Task {
            id,
            parent_id,
            title: title.to_string(),
            description: description.map(String::from),
            status: Status::Todo,
            priority: DEFAULT_PRIORITY,
            category: None,
            due_at: None,
            order_index,
            created_at: now,
            updated_at: now,
        })
    }

    /// Point lookup by id.
    pub fn get(&self, task_id: i64) -> Result<Option<Task>> {
        storage::get_task(self.storage.conn(), task_id)
    }

    /// Apply a partial update and refresh `updated_at`. Returns `None` when
    /// the id does not exist. Never touches `parent_id` or `order_index`.
    pub fn update(&mut self, task_id: i64, patch: &TaskPatch) -> Result<Option<Task>> {
        let tx = self.storage.transaction()?;
        let Some(mut task) = storage::get_task(&tx, task_id)? else {
            return Ok(None);
        };

        patch.apply_to(&mut task);
        task.updated_at = Utc::now();
        task.validate()
            .map_err(|e| eyre::eyre!(RepoError::Validation(e)))?;

        storage::persist_task(&tx, &task).context("Failed to persist update")?;
        tx.commit()?;

        Ok(Some(task))
    }

    /// Delete a task; with `cascade`, its whole subtree. Missing ids are a
    /// no-op. Without `cascade`, a task that still has children is rejected
    /// so the tree never holds orphaned rows. The remaining siblings of the
    /// deleted node's former parent are reindexed.
    pub fn delete(&mut self, task_id: i64, cascade: bool) -> Result<()> {
        let tx = self.storage.transaction()?;
        let Some(task) = storage::get_task(&tx, task_id)? else {
            return Ok(());
        };

        if !cascade && storage::has_children(&tx, task_id)? {
            return Err(eyre::eyre!(RepoError::HasChildren(task_id)));
        }

        let doomed = if cascade {
            subtree_ids(&tx, task_id)?
        } else {
            vec![task_id]
        };

        // Reverse preorder deletes children before their parents, which the
        // foreign key on parent_id requires.
        for id in doomed.iter().rev() {
            storage::delete_task(&tx, *id)?;
        }

        storage::reindex_siblings(&tx, task.parent_id)?;
        tx.commit()?;

        log::debug!("Deleted task {} ({} row(s))", task_id, doomed.len());
        Ok(())
    }

    /// Reparent a task and place it at `new_order_index` among its new
    /// siblings, clamped to `[0, sibling_count]`. Missing ids are a no-op.
    ///
    /// The target may not be the task itself or any of its descendants.
    /// Both the source and the destination sibling groups come out
    /// contiguous; a same-parent move is a pure reorder.
    pub fn move_task(
        &mut self,
        task_id: i64,
        new_parent_id: Option<i64>,
        new_order_index: i64,
    ) -> Result<()> {
        let tx = self.storage.transaction()?;
        let Some(task) = storage::get_task(&tx, task_id)? else {
            return Ok(());
        };

        if let Some(pid) = new_parent_id {
            if pid == task_id || is_descendant(&tx, task_id, pid)? {
                return Err(eyre::eyre!(RepoError::CycleDetected));
            }
            if storage::get_task(&tx, pid)?.is_none() {
                return Err(eyre::eyre!(RepoError::ParentNotFound(pid)));
            }
        }

        let old_parent_id = task.parent_id;

        let mut destination: Vec<i64> = storage::child_ids(&tx, new_parent_id)?
            .into_iter()
            .filter(|&id| id != task_id)
            .collect();
        let slot = new_order_index.clamp(0, destination.len() as i64) as usize;
        destination.insert(slot, task_id);

        storage::set_parent(&tx, task_id, new_parent_id, Utc::now())?;
        for (position, id) in destination.iter().enumerate() {
            storage::set_order_index(&tx, *id, position as i64)?;
        }
        if old_parent_id != new_parent_id {
            storage::reindex_siblings(&tx, old_parent_id)?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Assign `order_index = position` to each listed id whose current
    /// parent is `parent_id`; other ids are silently skipped. A trailing
    /// reindex pass keeps the group contiguous even for partial lists.
    pub fn reorder_siblings(&mut self, parent_id: Option<i64>, ordered_ids: &[i64]) -> Result<()> {
        let tx = self.storage.transaction()?;

        for (position, id) in ordered_ids.iter().enumerate() {
            let Some(task) = storage::get_task(&tx, *id)? else {
                continue;
            };
            if task.parent_id != parent_id {
                continue;
            }
            storage::set_order_index(&tx, *id, position as i64)?;
        }

        storage::reindex_siblings(&tx, parent_id)?;
        tx.commit()?;
        Ok(())
    }

    /// Direct children of `parent_id`, ordered by `order_index`.
    pub fn children(&self, parent_id: Option<i64>) -> Result<Vec<Task>> {
        storage::children_of(self.storage.conn(), parent_id)
    }

    /// All root tasks, ordered by `order_index`.
    pub fn all_roots(&self) -> Result<Vec<Task>> {
        self.children(None)
    }

    /// The task and its full descendant set, depth-first, children in
    /// `order_index` order at each level. Empty when the root is missing.
    pub fn subtree(&self, root_id: i64) -> Result<Vec<Task>> {
        let conn = self.storage.conn();
        let Some(root) = storage::get_task(conn, root_id)? else {
            return Ok(Vec::new());
        };

        // Explicit stack; deep trees must not recurse.
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(task) = stack.pop() {
            let mut children = storage::children_of(conn, Some(task.id))?;
            out.push(task);
            while let Some(child) = children.pop() {
                stack.push(child);
            }
        }

        Ok(out)
    }

    /// Substring search over title and description (ASCII
    /// case-insensitive). Result order is unspecified.
    pub fn search(&self, query: &str) -> Result<Vec<Task>> {
        storage::search_tasks(self.storage.conn(), query)
    }

    /// Copy the database file into `dest_dir` with a timestamped name.
    pub fn backup(&self, dest_dir: &Path) -> Result<PathBuf> {
        self.storage.backup(dest_dir)
    }
}

/// Preorder ids of the subtree rooted at `root_id` (root first, children by
/// `order_index`), collected with an explicit stack.
fn subtree_ids(conn: &Connection, root_id: i64) -> Result<Vec<i64>> {
    let mut out = Vec::new();
    let mut stack = vec![root_id];
    while let Some(id) = stack.pop() {
        out.push(id);
        let mut children = storage::child_ids(conn, Some(id))?;
        while let Some(child) = children.pop() {
            stack.push(child);
        }
    }
    Ok(out)
}

/// DFS from `ancestor_id` down the tree, checking whether `candidate_id`
/// appears among its descendants.
fn is_descendant(conn: &Connection, ancestor_id: i64, candidate_id: i64) -> Result<bool> {
    let mut visited = HashSet::new();
    let mut stack = vec![ancestor_id];

    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        for child in storage::child_ids(conn, Some(id))? {
            if child == candidate_id {
                return Ok(true);
            }
            stack.push(child);
        }
    }

    Ok(false)
}
