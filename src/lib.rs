//! tasktree: an ordered-tree task repository over SQLite.
//!
//! Tasks form a forest with stable sibling ordering: within one parent,
//! `order_index` values are always exactly `0..n`. The repository keeps that
//! invariant across adds, deletes, moves, and reorders, each running as a
//! single transaction. A small use-case layer wraps the repository and
//! announces changes on a typed event bus.
//!
//! # Example
//!
//! ```no_run
//! use tasktree::{TaskPatch, TaskRepository};
//! use std::path::Path;
//!
//! let mut repo = TaskRepository::open(Path::new("tasks.db")).unwrap();
//!
//! // Build a small tree
//! let study = repo.add(None, "Study", None).unwrap();
//! let physics = repo.add(Some(study.id), "Physics", None).unwrap();
//! let math = repo.add(Some(study.id), "Math", None).unwrap();
//! assert_eq!((physics.order_index, math.order_index), (0, 1));
//!
//! // Promote math to first place
//! repo.move_task(math.id, Some(study.id), 0).unwrap();
//!
//! // Rename and reprioritize
//! repo.update(physics.id, &TaskPatch::new().title("Physics II").priority(1))
//!     .unwrap();
//!
//! // Drop the whole branch
//! repo.delete(study.id, true).unwrap();
//! ```

mod config;
mod events;
mod progress;
mod repo;
mod storage;
mod types;
mod usecases;

// Re-export public API
pub use config::Settings;
pub use events::{EventBus, EventKind, TaskEvent};
pub use progress::branch_progress;
pub use repo::{RepoError, TaskRepository};
pub use storage::Storage;
pub use types::{DEFAULT_PRIORITY, Status, Task, TaskPatch, ValidationError};
pub use usecases::{
    AddTaskInput, DeleteTaskInput, MoveTaskInput, ReorderSiblingsInput, TaskService,
    ToggleStatusInput, UpdateTaskInput,
};
