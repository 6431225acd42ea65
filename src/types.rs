//! Core data types for the task tree.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single task in the tree.
///
/// Tasks form a forest: `parent_id = None` marks a root, and siblings under
/// one parent are ranked by `order_index`, which the repository keeps
/// contiguous (`0..n`) after every mutation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    /// Row id assigned by the store on insert. Immutable.
    pub id: i64,

    /// Parent task, or `None` for a root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,

    /// Short display string, never empty.
    pub title: String,

    /// Optional longer description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Current state.
    pub status: Status,

    /// Priority 1-5 (1 = highest, 5 = lowest). Defaults to 3.
    pub priority: u8,

    /// Freeform grouping label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Optional deadline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_at: Option<DateTime<Utc>>,

    /// Zero-based rank among siblings sharing `parent_id`.
    pub order_index: i64,

    /// When created.
    pub created_at: DateTime<Utc>,

    /// Last field mutation (including reparenting).
    pub updated_at: DateTime<Utc>,
}

/// Default priority for new tasks.
pub const DEFAULT_PRIORITY: u8 = 3;

/// Task status states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Todo,
    InProgress,
    Done,
}

impl Status {
    /// Stored string form, matching the `tasks.status` column values.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Todo => "todo",
            Status::InProgress => "in_progress",
            Status::Done => "done",
        }
    }

    /// Parse the stored string form.
    pub fn parse(s: &str) -> Option<Status> {
        match s {
            "todo" => Some(Status::Todo),
            "in_progress" => Some(Status::InProgress),
            "done" => Some(Status::Done),
            _ => None,
        }
    }

    /// The status a toggle lands on. Anything not done (including
    /// in-progress) becomes done; done goes back to todo.
    pub fn toggled(&self) -> Status {
        match self {
            Status::Done => Status::Todo,
            _ => Status::Done,
        }
    }
}

/// A partial update for a task: one slot per mutable column.
///
/// Clearable columns use a double `Option` — `Some(None)` writes NULL,
/// `None` leaves the column alone. `parent_id` and `order_index` are not
/// here on purpose; those move through `move_task` / `reorder_siblings`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<Status>,
    pub priority: Option<u8>,
    pub category: Option<Option<String>>,
    pub due_at: Option<Option<DateTime<Utc>>>,
}

impl TaskPatch {
    /// An empty patch (applies nothing but still refreshes `updated_at`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(Some(description.into()));
        self
    }

    /// Clear the description.
    pub fn clear_description(mut self) -> Self {
        self.description = Some(None);
        self
    }

    /// Set the status.
    pub fn status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    /// Set the priority.
    pub fn priority(mut self, priority: u8) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Set the category.
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(Some(category.into()));
        self
    }

    /// Clear the category.
    pub fn clear_category(mut self) -> Self {
        self.category = Some(None);
        self
    }

    /// Set the due date.
    pub fn due_at(mut self, due_at: DateTime<Utc>) -> Self {
        self.due_at = Some(Some(due_at));
        self
    }

    /// Clear the due date.
    pub fn clear_due_at(mut self) -> Self {
        self.due_at = Some(None);
        self
    }

    /// True if no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply this patch to a task in place. Does not touch `updated_at`.
    pub(crate) fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(category) = &self.category {
            task.category = category.clone();
        }
        if let Some(due_at) = self.due_at {
            task.due_at = due_at;
        }
    }
}

/// Validation errors for task fields.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyTitle,
    TitleTooLong,
    InvalidCharacters,
    InvalidPriority,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::EmptyTitle => write!(f, "title cannot be empty"),
            ValidationError::TitleTooLong => write!(f, "title exceeds 500 characters"),
            ValidationError::InvalidCharacters => write!(f, "title contains control characters"),
            ValidationError::InvalidPriority => write!(f, "priority must be 1-5"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Title rules shared by add and update: required, 1-500 chars, no control
/// characters.
pub(crate) fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    if title.len() > 500 {
        return Err(ValidationError::TitleTooLong);
    }
    if title.chars().any(|c| c.is_control()) {
        return Err(ValidationError::InvalidCharacters);
    }
    Ok(())
}

impl Task {
    /// Validate the task's fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_title(&self.title)?;

        // Priority: 1-5
        if self.priority < 1 || self.priority > 5 {
            return Err(ValidationError::InvalidPriority);
        }

        Ok(())
    }
}
