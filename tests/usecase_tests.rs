//! Integration tests for the use-case layer.
//!
//! Each use-case wraps one repository call and announces the change on the
//! bus; these tests watch the bus and the store together.

mod common;

use common::TestEnv;
use std::cell::RefCell;
use std::rc::Rc;
use tasktree::{
    AddTaskInput, DeleteTaskInput, EventKind, MoveTaskInput, ReorderSiblingsInput, Status,
    TaskEvent, TaskPatch, TaskService, ToggleStatusInput, UpdateTaskInput,
};
use tempfile::TempDir;

/// Service plus a recorder subscribed to every event variant.
fn setup_watched_service() -> (TempDir, TaskService, Rc<RefCell<Vec<TaskEvent>>>) {
    let (temp_dir, mut service) = TestEnv::new().into_service();
    let log: Rc<RefCell<Vec<TaskEvent>>> = Rc::new(RefCell::new(Vec::new()));

    for kind in [
        EventKind::Added,
        EventKind::Updated,
        EventKind::Deleted,
        EventKind::Moved,
    ] {
        let log = Rc::clone(&log);
        service
            .bus_mut()
            .subscribe(kind, move |event| log.borrow_mut().push(*event));
    }

    (temp_dir, service, log)
}

// =============================================================================
// Event Emission Tests
// =============================================================================

#[test]
fn test_add_emits_added() {
    let (_temp_dir, mut service, log) = setup_watched_service();

    let task = service
        .add_task(AddTaskInput {
            parent_id: None,
            title: "Task".to_string(),
            description: None,
        })
        .unwrap();

    assert_eq!(*log.borrow(), vec![TaskEvent::TaskAdded { task_id: task.id }]);
}

#[test]
fn test_update_emits_updated() {
    let (_temp_dir, mut service, log) = setup_watched_service();

    let task = service
        .add_task(AddTaskInput {
            parent_id: None,
            title: "Task".to_string(),
            description: None,
        })
        .unwrap();
    log.borrow_mut().clear();

    let updated = service
        .update_task(UpdateTaskInput {
            task_id: task.id,
            patch: TaskPatch::new().title("Renamed"),
        })
        .unwrap();

    assert!(updated.is_some());
    assert_eq!(
        *log.borrow(),
        vec![TaskEvent::TaskUpdated { task_id: task.id }]
    );
}

#[test]
fn test_update_missing_emits_nothing() {
    let (_temp_dir, mut service, log) = setup_watched_service();

    let updated = service
        .update_task(UpdateTaskInput {
            task_id: 9999,
            patch: TaskPatch::new().title("Renamed"),
        })
        .unwrap();

    assert!(updated.is_none());
    assert!(log.borrow().is_empty());
}

#[test]
fn test_delete_emits_deleted() {
    let (_temp_dir, mut service, log) = setup_watched_service();

    let task = service
        .add_task(AddTaskInput {
            parent_id: None,
            title: "Task".to_string(),
            description: None,
        })
        .unwrap();
    log.borrow_mut().clear();

    service
        .delete_task(DeleteTaskInput {
            task_id: task.id,
            cascade: true,
        })
        .unwrap();

    assert_eq!(
        *log.borrow(),
        vec![TaskEvent::TaskDeleted { task_id: task.id }]
    );
}

#[test]
fn test_failed_delete_emits_nothing() {
    let (_temp_dir, mut service, log) = setup_watched_service();

    let root = service
        .add_task(AddTaskInput {
            parent_id: None,
            title: "Root".to_string(),
            description: None,
        })
        .unwrap();
    service
        .add_task(AddTaskInput {
            parent_id: Some(root.id),
            title: "Child".to_string(),
            description: None,
        })
        .unwrap();
    log.borrow_mut().clear();

    let result = service.delete_task(DeleteTaskInput {
        task_id: root.id,
        cascade: false,
    });

    assert!(result.is_err());
    assert!(log.borrow().is_empty());
}

#[test]
fn test_move_emits_moved() {
    let (_temp_dir, mut service, log) = setup_watched_service();

    let a = service
        .add_task(AddTaskInput {
            parent_id: None,
            title: "A".to_string(),
            description: None,
        })
        .unwrap();
    let b = service
        .add_task(AddTaskInput {
            parent_id: None,
            title: "B".to_string(),
            description: None,
        })
        .unwrap();
    log.borrow_mut().clear();

    service
        .move_task(MoveTaskInput {
            task_id: b.id,
            new_parent_id: Some(a.id),
            new_order_index: 0,
        })
        .unwrap();

    assert_eq!(*log.borrow(), vec![TaskEvent::TaskMoved { task_id: b.id }]);
}

#[test]
fn test_reorder_emits_moved_per_id() {
    let (_temp_dir, mut service, log) = setup_watched_service();

    let a = service
        .add_task(AddTaskInput {
            parent_id: None,
            title: "A".to_string(),
            description: None,
        })
        .unwrap();
    let b = service
        .add_task(AddTaskInput {
            parent_id: None,
            title: "B".to_string(),
            description: None,
        })
        .unwrap();
    log.borrow_mut().clear();

    service
        .reorder_siblings(ReorderSiblingsInput {
            parent_id: None,
            ordered_ids: vec![b.id, a.id],
        })
        .unwrap();

    assert_eq!(
        *log.borrow(),
        vec![
            TaskEvent::TaskMoved { task_id: b.id },
            TaskEvent::TaskMoved { task_id: a.id },
        ]
    );

    let roots = service.repo().all_roots().unwrap();
    let ids: Vec<i64> = roots.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![b.id, a.id]);
}

// =============================================================================
// Toggle Status Tests
// =============================================================================

#[test]
fn test_toggle_todo_becomes_done_and_back() {
    let (_temp_dir, mut service, log) = setup_watched_service();

    let task = service
        .add_task(AddTaskInput {
            parent_id: None,
            title: "Task".to_string(),
            description: None,
        })
        .unwrap();
    assert_eq!(task.status, Status::Todo);
    log.borrow_mut().clear();

    let done = service
        .toggle_status(ToggleStatusInput { task_id: task.id })
        .unwrap()
        .unwrap();
    assert_eq!(done.status, Status::Done);

    let back = service
        .toggle_status(ToggleStatusInput { task_id: task.id })
        .unwrap()
        .unwrap();
    assert_eq!(back.status, Status::Todo);

    assert_eq!(
        *log.borrow(),
        vec![
            TaskEvent::TaskUpdated { task_id: task.id },
            TaskEvent::TaskUpdated { task_id: task.id },
        ]
    );
}

#[test]
fn test_toggle_in_progress_counts_as_not_done() {
    let (_temp_dir, mut service, _log) = setup_watched_service();

    let task = service
        .add_task(AddTaskInput {
            parent_id: None,
            title: "Task".to_string(),
            description: None,
        })
        .unwrap();
    service
        .update_task(UpdateTaskInput {
            task_id: task.id,
            patch: TaskPatch::new().status(Status::InProgress),
        })
        .unwrap();

    let toggled = service
        .toggle_status(ToggleStatusInput { task_id: task.id })
        .unwrap()
        .unwrap();
    assert_eq!(toggled.status, Status::Done);
}

#[test]
fn test_toggle_missing_returns_none_no_event() {
    let (_temp_dir, mut service, log) = setup_watched_service();

    let result = service
        .toggle_status(ToggleStatusInput { task_id: 9999 })
        .unwrap();

    assert!(result.is_none());
    assert!(log.borrow().is_empty());
}

// =============================================================================
// Search Tests
// =============================================================================

#[test]
fn test_search_substring_over_titles() {
    let mut env = TestEnv::new();

    env.add_root("Physics");
    env.add_root("Math");
    env.add_root("Physical Chemistry");

    let hits = env.repo.search("Phys").unwrap();
    let mut titles: Vec<String> = hits.iter().map(|t| t.title.clone()).collect();
    titles.sort();

    assert_eq!(titles, vec!["Physical Chemistry", "Physics"]);
}

#[test]
fn test_search_is_ascii_case_insensitive() {
    let mut env = TestEnv::new();

    env.add_root("Physics");

    assert_eq!(env.repo.search("phys").unwrap().len(), 1);
    assert_eq!(env.repo.search("PHYS").unwrap().len(), 1);
}

#[test]
fn test_search_matches_description() {
    let mut env = TestEnv::new();

    env.repo
        .add(None, "Homework", Some("physics exercises 1-10"))
        .unwrap();
    env.add_root("Chores");

    let hits = env.repo.search("physics").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "Homework");
}

#[test]
fn test_search_no_matches() {
    let mut env = TestEnv::new();

    env.add_root("Physics");
    assert!(env.repo.search("biology").unwrap().is_empty());
}
