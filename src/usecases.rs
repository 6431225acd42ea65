//! Use-case layer: one repository call per operation, one notification on
//! success.
//!
//! `TaskService` is the only owner of an `EventBus`; the repository stays a
//! pure data layer and can be tested without any pub/sub machinery.

use crate::events::{EventBus, TaskEvent};
use crate::repo::TaskRepository;
use crate::types::{Task, TaskPatch};
use eyre::Result;

/// Input for [`TaskService::add_task`].
#[derive(Debug, Clone)]
pub struct AddTaskInput {
    pub parent_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
}

/// Input for [`TaskService::update_task`].
#[derive(Debug, Clone)]
pub struct UpdateTaskInput {
    pub task_id: i64,
    pub patch: TaskPatch,
}

/// Input for [`TaskService::delete_task`].
#[derive(Debug, Clone)]
pub struct DeleteTaskInput {
    pub task_id: i64,
    pub cascade: bool,
}

/// Input for [`TaskService::move_task`].
#[derive(Debug, Clone)]
pub struct MoveTaskInput {
    pub task_id: i64,
    pub new_parent_id: Option<i64>,
    pub new_order_index: i64,
}

/// Input for [`TaskService::toggle_status`].
#[derive(Debug, Clone)]
pub struct ToggleStatusInput {
    pub task_id: i64,
}

/// Input for [`TaskService::reorder_siblings`].
#[derive(Debug, Clone)]
pub struct ReorderSiblingsInput {
    pub parent_id: Option<i64>,
    pub ordered_ids: Vec<i64>,
}

/// The application's operation surface: repository plus notification bus.
pub struct TaskService {
    repo: TaskRepository,
    bus: EventBus,
}

impl TaskService {
    pub fn new(repo: TaskRepository) -> Self {
        Self {
            repo,
            bus: EventBus::new(),
        }
    }

    /// Read access to the repository (queries need no use-case wrapper).
    pub fn repo(&self) -> &TaskRepository {
        &self.repo
    }

    /// Register subscribers here before issuing operations.
    pub fn bus_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    /// Create a task and announce it.
    pub fn add_task(&mut self, input: AddTaskInput) -> Result<Task> {
        let task = self
            .repo
            .add(input.parent_id, &input.title, input.description.as_deref())?;
        self.bus.emit(&TaskEvent::TaskAdded { task_id: task.id });
        Ok(task)
    }

    /// Apply a patch; announces only when the task existed.
    pub fn update_task(&mut self, input: UpdateTaskInput) -> Result<Option<Task>> {
        let updated = self.repo.update(input.task_id, &input.patch)?;
        if updated.is_some() {
            self.bus.emit(&TaskEvent::TaskUpdated {
                task_id: input.task_id,
            });
        }
        Ok(updated)
    }

    /// Delete a task (optionally with its subtree) and announce it.
    pub fn delete_task(&mut self, input: DeleteTaskInput) -> Result<()> {
        self.repo.delete(input.task_id, input.cascade)?;
        self.bus.emit(&TaskEvent::TaskDeleted {
            task_id: input.task_id,
        });
        Ok(())
    }

    /// Move a task and announce it.
    pub fn move_task(&mut self, input: MoveTaskInput) -> Result<()> {
        self.repo
            .move_task(input.task_id, input.new_parent_id, input.new_order_index)?;
        self.bus.emit(&TaskEvent::TaskMoved {
            task_id: input.task_id,
        });
        Ok(())
    }

    /// Flip DONE to TODO and anything else (TODO or IN_PROGRESS) to DONE.
    /// Announces only when the task existed.
    pub fn toggle_status(&mut self, input: ToggleStatusInput) -> Result<Option<Task>> {
        let Some(task) = self.repo.get(input.task_id)? else {
            return Ok(None);
        };

        let patch = TaskPatch::new().status(task.status.toggled());
        let updated = self.repo.update(input.task_id, &patch)?;
        if updated.is_some() {
            self.bus.emit(&TaskEvent::TaskUpdated {
                task_id: input.task_id,
            });
        }
        Ok(updated)
    }

    /// Reorder one sibling group; announces each submitted id (subscribers
    /// re-query, so ids the repository skipped are harmless).
    pub fn reorder_siblings(&mut self, input: ReorderSiblingsInput) -> Result<()> {
        self.repo
            .reorder_siblings(input.parent_id, &input.ordered_ids)?;
        for task_id in input.ordered_ids {
            self.bus.emit(&TaskEvent::TaskMoved { task_id });
        }
        Ok(())
    }
}
