//! CLI argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "tt",
    about = "Hierarchical task manager backed by SQLite",
    version,
    after_help = "Logs are written to: <data dir>/tasktree/logs/tasktree.log"
)]
pub struct Cli {
    /// Path to the task database (default: $TT_DB_PATH or ./tasks.db)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Add a task
    Add {
        /// Task title
        title: String,

        /// Parent task id (omit for a root task)
        #[arg(short, long)]
        parent: Option<i64>,

        /// Description
        #[arg(short = 'D', long)]
        description: Option<String>,
    },

    /// Show a task by id
    Get {
        /// Task id
        id: i64,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Update fields of a task
    Update {
        /// Task id
        id: i64,

        /// New title
        #[arg(short, long)]
        title: Option<String>,

        /// New description
        #[arg(short = 'D', long)]
        description: Option<String>,

        /// Remove the description
        #[arg(long, conflicts_with = "description")]
        clear_description: bool,

        /// New status (todo, in_progress, done)
        #[arg(short, long)]
        status: Option<String>,

        /// New priority (1=highest, 5=lowest)
        #[arg(short, long)]
        priority: Option<u8>,

        /// New category
        #[arg(short, long)]
        category: Option<String>,

        /// Remove the category
        #[arg(long, conflicts_with = "category")]
        clear_category: bool,

        /// New due date, RFC 3339 (e.g. 2026-09-01T12:00:00Z)
        #[arg(long)]
        due: Option<String>,

        /// Remove the due date
        #[arg(long, conflicts_with = "due")]
        clear_due: bool,
    },

    /// Toggle a task between done and todo
    Done {
        /// Task id
        id: i64,
    },

    /// Delete a task and its subtree
    Delete {
        /// Task id
        id: i64,

        /// Fail instead of deleting when the task has children
        #[arg(long)]
        no_cascade: bool,
    },

    /// Move a task to a new parent and/or position
    Move {
        /// Task id
        id: i64,

        /// New parent id (omit to make it a root)
        #[arg(short, long)]
        parent: Option<i64>,

        /// Position among the new siblings (clamped; default: last)
        #[arg(short, long, default_value = "9223372036854775807")]
        index: i64,
    },

    /// Reorder the children of a parent by listing their ids
    Reorder {
        /// Parent id (omit for root tasks)
        #[arg(short, long)]
        parent: Option<i64>,

        /// Child ids in the desired order
        #[arg(required = true)]
        ids: Vec<i64>,
    },

    /// Print the whole task forest
    Tree,

    /// Print a task's subtree with its progress
    Subtree {
        /// Root task id
        id: i64,
    },

    /// Search tasks by title or description substring
    Search {
        /// Substring to look for (ASCII case-insensitive)
        query: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Copy the database to a timestamped backup file
    Backup {
        /// Destination directory (created if absent)
        dest: PathBuf,
    },
}
