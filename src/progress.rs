//! Branch progress: how much of a task group is done.

use crate::types::{Status, Task};

/// Fraction of tasks in `tasks` that are DONE, in `[0.0, 1.0]`.
/// An empty slice counts as zero progress.
pub fn branch_progress(tasks: &[Task]) -> f64 {
    if tasks.is_empty() {
        return 0.0;
    }
    let done = tasks.iter().filter(|t| t.status == Status::Done).count();
    done as f64 / tasks.len() as f64
}
