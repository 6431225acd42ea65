//! Shared test infrastructure for integration tests.
//!
//! Provides TestEnv helper for consistent setup and invariant checks.

#![allow(dead_code)]

use std::path::PathBuf;
use tasktree::{Task, TaskRepository, TaskService};
use tempfile::TempDir;

/// Test environment with automatic cleanup.
pub struct TestEnv {
    pub temp_dir: TempDir,
    pub repo: TaskRepository,
}

impl TestEnv {
    /// Create a new test environment with a fresh database.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let repo =
            TaskRepository::open(&temp_dir.path().join("tasks.db")).expect("Failed to open repo");
        Self { temp_dir, repo }
    }

    /// Path of the database file.
    pub fn db_path(&self) -> PathBuf {
        self.temp_dir.path().join("tasks.db")
    }

    /// Create a root task.
    pub fn add_root(&mut self, title: &str) -> Task {
        self.repo.add(None, title, None).expect("Failed to add root")
    }

    /// Create a child task.
    pub fn add_child(&mut self, parent: &Task, title: &str) -> Task {
        self.repo
            .add(Some(parent.id), title, None)
            .expect("Failed to add child")
    }

    /// Wrap the repository in a service (for use-case tests).
    pub fn into_service(self) -> (TempDir, TaskService) {
        (self.temp_dir, TaskService::new(self.repo))
    }

    /// Ids of the direct children of `parent_id`, in sibling order.
    pub fn child_ids(&self, parent_id: Option<i64>) -> Vec<i64> {
        self.repo
            .children(parent_id)
            .expect("Failed to list children")
            .iter()
            .map(|t| t.id)
            .collect()
    }

    /// Assert that a sibling group's order indices are exactly 0..n.
    pub fn assert_contiguous(&self, parent_id: Option<i64>) {
        let children = self
            .repo
            .children(parent_id)
            .expect("Failed to list children");
        let indices: Vec<i64> = children.iter().map(|t| t.order_index).collect();
        let expected: Vec<i64> = (0..children.len() as i64).collect();
        assert_eq!(
            indices, expected,
            "order indices under {:?} are not contiguous",
            parent_id
        );
    }

    /// Assert the exact sibling order under `parent_id`.
    pub fn assert_order(&self, parent_id: Option<i64>, expected: &[i64]) {
        assert_eq!(
            self.child_ids(parent_id),
            expected,
            "unexpected sibling order under {:?}",
            parent_id
        );
        self.assert_contiguous(parent_id);
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
