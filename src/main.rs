//! tasktree CLI - hierarchical task manager backed by SQLite.

use chrono::DateTime;
use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;
use tasktree::{
    AddTaskInput, DeleteTaskInput, EventKind, MoveTaskInput, ReorderSiblingsInput, Settings,
    Status, Task, TaskPatch, TaskRepository, TaskService, ToggleStatusInput, UpdateTaskInput,
    branch_progress,
};

mod cli;

use cli::{Cli, Command};

fn setup_logging() -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tasktree")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("tasktree.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn resolve_settings(cli: &Cli) -> Settings {
    match &cli.db {
        Some(path) => Settings::with_db_path(path.clone()),
        None => Settings::from_env(),
    }
}

fn format_status(status: &Status) -> ColoredString {
    match status {
        Status::Todo => "[ ]".yellow(),
        Status::InProgress => "[~]".blue(),
        Status::Done => "[x]".green(),
    }
}

fn print_task_line(task: &Task, depth: usize) {
    let category = task
        .category
        .as_ref()
        .map(|c| format!(" @{}", c))
        .unwrap_or_default();
    let due = task
        .due_at
        .map(|d| format!(" due {}", d.format("%Y-%m-%d")))
        .unwrap_or_default();
    println!(
        "{}{} {} P{} {}{}{}",
        "  ".repeat(depth),
        format_status(&task.status),
        format!("#{}", task.id).cyan(),
        task.priority,
        task.title,
        category.dimmed(),
        due.dimmed(),
    );
}

/// Print a branch, children indented under their parents. Iterative so a
/// pathologically deep tree cannot overflow the stack.
fn print_branch(repo: &TaskRepository, roots: Vec<Task>) -> Result<()> {
    let mut stack: Vec<(Task, usize)> = roots.into_iter().rev().map(|t| (t, 0)).collect();
    while let Some((task, depth)) = stack.pop() {
        print_task_line(&task, depth);
        let children = repo.children(Some(task.id))?;
        for child in children.into_iter().rev() {
            stack.push((child, depth + 1));
        }
    }
    Ok(())
}

fn print_task_details(task: &Task) {
    println!("{}: {}", "Id".bold(), format!("#{}", task.id).cyan());
    if let Some(parent_id) = task.parent_id {
        println!("{}: #{}", "Parent".bold(), parent_id);
    }
    println!("{}: {}", "Title".bold(), task.title);
    println!(
        "{}: {} {}",
        "Status".bold(),
        format_status(&task.status),
        task.status.as_str()
    );
    println!("{}: P{}", "Priority".bold(), task.priority);
    if let Some(category) = &task.category {
        println!("{}: {}", "Category".bold(), category);
    }
    if let Some(description) = &task.description {
        println!("{}: {}", "Description".bold(), description);
    }
    if let Some(due_at) = &task.due_at {
        println!("{}: {}", "Due".bold(), due_at);
    }
    println!("{}: {}", "Position".bold(), task.order_index);
    println!("{}: {}", "Created".bold(), task.created_at);
    println!("{}: {}", "Updated".bold(), task.updated_at);
}

fn build_patch(
    title: Option<String>,
    description: Option<String>,
    clear_description: bool,
    status: Option<String>,
    priority: Option<u8>,
    category: Option<String>,
    clear_category: bool,
    due: Option<String>,
    clear_due: bool,
) -> Result<TaskPatch> {
    let mut patch = TaskPatch::new();

    if let Some(title) = title {
        patch = patch.title(title);
    }
    if let Some(description) = description {
        patch = patch.description(description);
    }
    if clear_description {
        patch = patch.clear_description();
    }
    if let Some(status) = status {
        let status = Status::parse(&status)
            .ok_or_else(|| eyre::eyre!("invalid status {:?} (todo, in_progress, done)", status))?;
        patch = patch.status(status);
    }
    if let Some(priority) = priority {
        patch = patch.priority(priority);
    }
    if let Some(category) = category {
        patch = patch.category(category);
    }
    if clear_category {
        patch = patch.clear_category();
    }
    if let Some(due) = due {
        let due = DateTime::parse_from_rfc3339(&due)
            .map(|dt| dt.with_timezone(&chrono::Utc))
            .with_context(|| format!("invalid due date {:?}, expected RFC 3339", due))?;
        patch = patch.due_at(due);
    }
    if clear_due {
        patch = patch.clear_due_at();
    }

    Ok(patch)
}

fn run(cli: Cli) -> Result<()> {
    let settings = resolve_settings(&cli);
    let repo = TaskRepository::open(&settings.db_path).context("Failed to open task database")?;
    let mut service = TaskService::new(repo);

    // Trace every domain notification into the log file.
    for kind in [
        EventKind::Added,
        EventKind::Updated,
        EventKind::Deleted,
        EventKind::Moved,
    ] {
        service.bus_mut().subscribe(kind, |event| {
            info!("event: {:?}", event);
        });
    }

    match cli.command {
        Command::Add {
            title,
            parent,
            description,
        } => {
            let task = service
                .add_task(AddTaskInput {
                    parent_id: parent,
                    title,
                    description,
                })
                .context("Failed to add task")?;

            println!(
                "{} Added: {} {}",
                "✓".green(),
                format!("#{}", task.id).cyan(),
                task.title
            );
        }

        Command::Get { id, json } => match service.repo().get(id)? {
            Some(task) => {
                if json {
                    println!("{}", serde_json::to_string_pretty(&task)?);
                } else {
                    print_task_details(&task);
                }
            }
            None => {
                eprintln!("{} Task not found: #{}", "✗".red(), id);
                std::process::exit(1);
            }
        },

        Command::Update {
            id,
            title,
            description,
            clear_description,
            status,
            priority,
            category,
            clear_category,
            due,
            clear_due,
        } => {
            let patch = build_patch(
                title,
                description,
                clear_description,
                status,
                priority,
                category,
                clear_category,
                due,
                clear_due,
            )?;
            if patch.is_empty() {
                eyre::bail!("nothing to update; pass at least one field flag");
            }

            match service.update_task(UpdateTaskInput { task_id: id, patch })? {
                Some(task) => {
                    println!(
                        "{} Updated: {} {}",
                        "✓".green(),
                        format!("#{}", task.id).cyan(),
                        task.title
                    );
                }
                None => {
                    eprintln!("{} Task not found: #{}", "✗".red(), id);
                    std::process::exit(1);
                }
            }
        }

        Command::Done { id } => match service.toggle_status(ToggleStatusInput { task_id: id })? {
            Some(task) => {
                println!(
                    "{} {} {} is now {}",
                    "✓".green(),
                    format!("#{}", task.id).cyan(),
                    task.title,
                    task.status.as_str().bold()
                );
            }
            None => {
                eprintln!("{} Task not found: #{}", "✗".red(), id);
                std::process::exit(1);
            }
        },

        Command::Delete { id, no_cascade } => {
            service
                .delete_task(DeleteTaskInput {
                    task_id: id,
                    cascade: !no_cascade,
                })
                .context("Failed to delete task")?;

            println!("{} Deleted: {}", "✓".green(), format!("#{}", id).cyan());
        }

        Command::Move { id, parent, index } => {
            service
                .move_task(MoveTaskInput {
                    task_id: id,
                    new_parent_id: parent,
                    new_order_index: index,
                })
                .context("Failed to move task")?;

            let destination = parent
                .map(|p| format!("under #{}", p))
                .unwrap_or_else(|| "to the root level".to_string());
            println!(
                "{} Moved {} {}",
                "✓".green(),
                format!("#{}", id).cyan(),
                destination
            );
        }

        Command::Reorder { parent, ids } => {
            let count = ids.len();
            service
                .reorder_siblings(ReorderSiblingsInput {
                    parent_id: parent,
                    ordered_ids: ids,
                })
                .context("Failed to reorder siblings")?;

            println!("{} Reordered {} task(s)", "✓".green(), count);
        }

        Command::Tree => {
            let roots = service.repo().all_roots()?;
            if roots.is_empty() {
                println!("{}", "No tasks".dimmed());
            } else {
                print_branch(service.repo(), roots)?;
            }
        }

        Command::Subtree { id } => {
            let tasks = service.repo().subtree(id)?;
            if tasks.is_empty() {
                eprintln!("{} Task not found: #{}", "✗".red(), id);
                std::process::exit(1);
            }

            let root = tasks[0].clone();
            print_branch(service.repo(), vec![root])?;

            let progress = branch_progress(&tasks);
            let done = tasks
                .iter()
                .filter(|t| t.status == Status::Done)
                .count();
            println!(
                "{} {}/{} done ({:.0}%)",
                "→".blue(),
                done,
                tasks.len(),
                progress * 100.0
            );
        }

        Command::Search { query, json } => {
            let tasks = service.repo().search(&query)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else if tasks.is_empty() {
                println!("{}", "No matches".dimmed());
            } else {
                for task in tasks {
                    print_task_line(&task, 0);
                }
            }
        }

        Command::Backup { dest } => {
            let path = service
                .repo()
                .backup(&dest)
                .context("Failed to back up database")?;
            println!("{} Backed up to {}", "✓".green(), path.display());
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();
    info!("Command: {:?}", std::env::args().collect::<Vec<_>>());

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
