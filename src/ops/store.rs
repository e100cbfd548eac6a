use thiserror::Error;
use uuid::Uuid;

use crate::model::project::Project;
use crate::model::state::AppState;
use crate::model::task::{ActivityEntry, ActivityKind, Attachment, Task};
use crate::ops::tree::{self, DropPosition};

/// A mutation the store refuses to perform. Stale ids are deliberately
/// not errors: a reference to a vanished project or task degrades to a
/// quiet no-op so callers holding old references never crash.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("title cannot be empty")]
    EmptyTitle,
    #[error("comment cannot be empty")]
    EmptyComment,
    #[error("only the task's owner can do that")]
    NotOwner,
    #[error("a task with subtasks cannot be toggled directly")]
    NotALeaf,
}

/// Run a forest transformation against a project, skipping quietly when
/// the project id is stale.
fn with_forest(state: &mut AppState, project_id: Uuid, f: impl FnOnce(Vec<Task>) -> Vec<Task>) {
    if let Some(project) = state.project_mut(project_id) {
        project.tasks = f(std::mem::take(&mut project.tasks));
    }
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

/// Create a project and return its id. Insertion order is display order.
pub fn add_project(
    state: &mut AppState,
    title: &str,
    subtitle: &str,
    author: Uuid,
) -> Result<Uuid, StoreError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(StoreError::EmptyTitle);
    }
    let project = Project::new(title.to_string(), subtitle.trim().to_string(), author);
    let id = project.id;
    state.projects.insert(id, project);
    Ok(id)
}

/// Remove a project and everything in it. A stale id is a no-op; the
/// remaining projects keep their order.
pub fn delete_project(state: &mut AppState, project_id: Uuid) {
    state.projects.shift_remove(&project_id);
}

// ---------------------------------------------------------------------------
// Task creation and removal
// ---------------------------------------------------------------------------

/// Add a task under `parent` (or at the project's root when `parent` is
/// `None`) and return the new task's id.
///
/// Returns `Ok(None)` without touching anything when the project or the
/// parent has meanwhile vanished.
pub fn add_task(
    state: &mut AppState,
    project_id: Uuid,
    parent: Option<Uuid>,
    title: &str,
    author: Uuid,
) -> Result<Option<Uuid>, StoreError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(StoreError::EmptyTitle);
    }
    let Some(project) = state.project_mut(project_id) else {
        return Ok(None);
    };
    let task = Task::new(title.to_string(), author);
    let id = task.id;
    match parent {
        None => project.tasks.push(task),
        Some(parent) => {
            if tree::find_task(&project.tasks, parent).is_none() {
                return Ok(None);
            }
            project.tasks = tree::insert_child(std::mem::take(&mut project.tasks), parent, task);
        }
    }
    Ok(Some(id))
}

/// Delete a task together with its whole subtree. Only the task's owner
/// may delete it; stale ids are no-ops.
pub fn delete_task(
    state: &mut AppState,
    project_id: Uuid,
    task_id: Uuid,
    author: Uuid,
) -> Result<(), StoreError> {
    let Some(project) = state.project(project_id) else {
        return Ok(());
    };
    let Some(task) = tree::find_task(&project.tasks, task_id) else {
        return Ok(());
    };
    if task.created_by != author {
        return Err(StoreError::NotOwner);
    }
    with_forest(state, project_id, |forest| {
        tree::remove_task(forest, task_id)
    });
    Ok(())
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Flip a leaf task between pending and completed, recording who did it
/// in the task's activity log.
///
/// Ownership is enforced here rather than left to callers, so there is a
/// single place the rule can be bypassed from: nowhere. Toggling a task
/// with subtasks is rejected outright; a parent's completion is derived
/// from its children and never stored.
pub fn toggle_status(
    state: &mut AppState,
    project_id: Uuid,
    task_id: Uuid,
    author: Uuid,
) -> Result<(), StoreError> {
    let Some(project) = state.project(project_id) else {
        return Ok(());
    };
    let Some(task) = tree::find_task(&project.tasks, task_id) else {
        return Ok(());
    };
    if !task.is_leaf() {
        return Err(StoreError::NotALeaf);
    }
    if task.created_by != author {
        return Err(StoreError::NotOwner);
    }
    let next = task.status.toggled();
    let entry = ActivityEntry::new(
        ActivityKind::StatusChange,
        format!("marked this task as {}", next.label()),
        author,
    );
    with_forest(state, project_id, |forest| {
        tree::update_task(forest, task_id, move |mut t| {
            t.status = next;
            t.activity.push(entry);
            t
        })
    });
    Ok(())
}

// ---------------------------------------------------------------------------
// Field edits
// ---------------------------------------------------------------------------

/// Rename a task. The new title must be non-empty after trimming.
pub fn rename_task(
    state: &mut AppState,
    project_id: Uuid,
    task_id: Uuid,
    title: &str,
) -> Result<(), StoreError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(StoreError::EmptyTitle);
    }
    let title = title.to_string();
    with_forest(state, project_id, |forest| {
        tree::update_task(forest, task_id, move |mut t| {
            t.title = title;
            t
        })
    });
    Ok(())
}

/// Set a task's free-form description. Blank input clears it.
pub fn set_description(
    state: &mut AppState,
    project_id: Uuid,
    task_id: Uuid,
    description: Option<String>,
) {
    let description = description.filter(|d| !d.trim().is_empty());
    with_forest(state, project_id, |forest| {
        tree::update_task(forest, task_id, move |mut t| {
            t.description = description;
            t
        })
    });
}

/// Fold a task's subtask list shut, or open it back up.
pub fn toggle_expand(state: &mut AppState, project_id: Uuid, task_id: Uuid) {
    with_forest(state, project_id, |forest| {
        tree::update_task(forest, task_id, |mut t| {
            t.expanded = !t.expanded;
            t
        })
    });
}

// ---------------------------------------------------------------------------
// Activity and attachments
// ---------------------------------------------------------------------------

/// Append a comment to a task's activity log.
pub fn add_comment(
    state: &mut AppState,
    project_id: Uuid,
    task_id: Uuid,
    text: &str,
    author: Uuid,
) -> Result<(), StoreError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(StoreError::EmptyComment);
    }
    let entry = ActivityEntry::new(ActivityKind::Comment, text.to_string(), author);
    with_forest(state, project_id, |forest| {
        tree::update_task(forest, task_id, move |mut t| {
            t.activity.push(entry);
            t
        })
    });
    Ok(())
}

/// Attach a file or link to a task, and note it in the activity log.
pub fn add_attachment(
    state: &mut AppState,
    project_id: Uuid,
    task_id: Uuid,
    attachment: Attachment,
) {
    let note = ActivityEntry::new(
        ActivityKind::Attachment,
        format!("attached {}", attachment.name),
        attachment.created_by,
    );
    with_forest(state, project_id, |forest| {
        tree::update_task(forest, task_id, move |mut t| {
            t.attachments.push(attachment);
            t.activity.push(note);
            t
        })
    });
}

// ---------------------------------------------------------------------------
// Relocation
// ---------------------------------------------------------------------------

/// Move a task (with its subtree) relative to another task in the same
/// project. Dropping a task on itself, dropping it inside its own
/// subtree, and stale ids all leave the forest exactly as it was.
pub fn move_task(
    state: &mut AppState,
    project_id: Uuid,
    dragged: Uuid,
    target: Uuid,
    position: DropPosition,
) {
    with_forest(state, project_id, |forest| {
        tree::relocate(forest, dragged, target, position)
    });
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::{AttachmentKind, TaskStatus};
    use crate::ops::progress::task_progress;
    use pretty_assertions::assert_eq;

    fn sample_state() -> (AppState, Uuid, Uuid) {
        let author = Uuid::new_v4();
        let mut state = AppState::default();
        let project = add_project(&mut state, "Garden", "spring cleanup", author).unwrap();
        (state, project, author)
    }

    fn forest(state: &AppState, project: Uuid) -> &[Task] {
        &state.project(project).unwrap().tasks
    }

    // --- projects ---

    #[test]
    fn test_add_project_trims_title_and_subtitle() {
        let mut state = AppState::default();
        let id = add_project(&mut state, "  Garden ", " beds ", Uuid::new_v4()).unwrap();
        let project = state.project(id).unwrap();
        assert_eq!(project.title, "Garden");
        assert_eq!(project.subtitle, "beds");
    }

    #[test]
    fn test_add_project_rejects_blank_title() {
        let mut state = AppState::default();
        let err = add_project(&mut state, "   ", "", Uuid::new_v4()).unwrap_err();
        assert_eq!(err, StoreError::EmptyTitle);
        assert!(state.projects.is_empty());
    }

    #[test]
    fn test_delete_project_keeps_remaining_order() {
        let author = Uuid::new_v4();
        let mut state = AppState::default();
        let a = add_project(&mut state, "a", "", author).unwrap();
        let b = add_project(&mut state, "b", "", author).unwrap();
        let c = add_project(&mut state, "c", "", author).unwrap();
        delete_project(&mut state, b);
        let order: Vec<Uuid> = state.projects.keys().copied().collect();
        assert_eq!(order, vec![a, c]);
        // stale id: no-op
        delete_project(&mut state, b);
        assert_eq!(state.projects.len(), 2);
    }

    // --- add_task ---

    #[test]
    fn test_add_task_at_root_then_under_parent() {
        let (mut state, project, author) = sample_state();
        let root = add_task(&mut state, project, None, "Weed the beds", author)
            .unwrap()
            .unwrap();
        toggle_expand(&mut state, project, root);
        assert!(!forest(&state, project)[0].expanded);

        let child = add_task(&mut state, project, Some(root), "Front bed", author)
            .unwrap()
            .unwrap();
        let parent = &forest(&state, project)[0];
        assert!(parent.expanded);
        assert_eq!(parent.subtasks.len(), 1);
        assert_eq!(parent.subtasks[0].id, child);
        assert_eq!(parent.subtasks[0].status, TaskStatus::Pending);
    }

    #[test]
    fn test_add_task_rejects_blank_title() {
        let (mut state, project, author) = sample_state();
        let err = add_task(&mut state, project, None, "  ", author).unwrap_err();
        assert_eq!(err, StoreError::EmptyTitle);
        assert!(forest(&state, project).is_empty());
    }

    #[test]
    fn test_add_task_stale_project_is_noop() {
        let (mut state, _, author) = sample_state();
        let result = add_task(&mut state, Uuid::new_v4(), None, "orphan", author).unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_add_task_stale_parent_is_noop() {
        let (mut state, project, author) = sample_state();
        let result = add_task(&mut state, project, Some(Uuid::new_v4()), "orphan", author).unwrap();
        assert_eq!(result, None);
        assert!(forest(&state, project).is_empty());
    }

    // --- toggle_status ---

    #[test]
    fn test_toggle_status_flips_logs_and_completes() {
        let (mut state, project, author) = sample_state();
        let id = add_task(&mut state, project, None, "Water plants", author)
            .unwrap()
            .unwrap();

        toggle_status(&mut state, project, id, author).unwrap();
        let task = &forest(&state, project)[0];
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task_progress(task), 100);
        // creation entry plus the new status change
        assert_eq!(task.activity.len(), 2);
        let entry = task.activity.last().unwrap();
        assert_eq!(entry.kind, ActivityKind::StatusChange);
        assert_eq!(entry.content, "marked this task as completed");
        assert_eq!(entry.created_by, author);

        toggle_status(&mut state, project, id, author).unwrap();
        let task = &forest(&state, project)[0];
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(
            task.activity.last().unwrap().content,
            "marked this task as pending"
        );
    }

    #[test]
    fn test_toggle_status_requires_owner() {
        let (mut state, project, author) = sample_state();
        let id = add_task(&mut state, project, None, "Water plants", author)
            .unwrap()
            .unwrap();

        let intruder = Uuid::new_v4();
        let err = toggle_status(&mut state, project, id, intruder).unwrap_err();
        assert_eq!(err, StoreError::NotOwner);
        let task = &forest(&state, project)[0];
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.activity.len(), 1);
    }

    #[test]
    fn test_toggle_status_rejects_parent_tasks() {
        let (mut state, project, author) = sample_state();
        let parent = add_task(&mut state, project, None, "Plant the beds", author)
            .unwrap()
            .unwrap();
        add_task(&mut state, project, Some(parent), "Tomatoes", author).unwrap();

        let err = toggle_status(&mut state, project, parent, author).unwrap_err();
        assert_eq!(err, StoreError::NotALeaf);
    }

    #[test]
    fn test_toggle_status_stale_ids_are_noops() {
        let (mut state, project, author) = sample_state();
        toggle_status(&mut state, project, Uuid::new_v4(), author).unwrap();
        toggle_status(&mut state, Uuid::new_v4(), Uuid::new_v4(), author).unwrap();
    }

    // --- delete_task ---

    #[test]
    fn test_delete_task_removes_whole_subtree() {
        let (mut state, project, author) = sample_state();
        let parent = add_task(&mut state, project, None, "Plant the beds", author)
            .unwrap()
            .unwrap();
        add_task(&mut state, project, Some(parent), "Tomatoes", author).unwrap();
        let other = add_task(&mut state, project, None, "Mow lawn", author)
            .unwrap()
            .unwrap();

        delete_task(&mut state, project, parent, author).unwrap();
        let tasks = forest(&state, project);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, other);
    }

    #[test]
    fn test_delete_task_requires_owner() {
        let (mut state, project, author) = sample_state();
        let id = add_task(&mut state, project, None, "Mow lawn", author)
            .unwrap()
            .unwrap();

        let err = delete_task(&mut state, project, id, Uuid::new_v4()).unwrap_err();
        assert_eq!(err, StoreError::NotOwner);
        assert_eq!(forest(&state, project).len(), 1);
    }

    // --- field edits ---

    #[test]
    fn test_rename_task_trims_and_rejects_blank() {
        let (mut state, project, author) = sample_state();
        let id = add_task(&mut state, project, None, "Mow lawn", author)
            .unwrap()
            .unwrap();

        rename_task(&mut state, project, id, "  Mow the lawn ").unwrap();
        assert_eq!(forest(&state, project)[0].title, "Mow the lawn");

        let err = rename_task(&mut state, project, id, " ").unwrap_err();
        assert_eq!(err, StoreError::EmptyTitle);
        assert_eq!(forest(&state, project)[0].title, "Mow the lawn");
    }

    #[test]
    fn test_set_description_blank_clears() {
        let (mut state, project, author) = sample_state();
        let id = add_task(&mut state, project, None, "Mow lawn", author)
            .unwrap()
            .unwrap();

        set_description(&mut state, project, id, Some("front and back".to_string()));
        assert_eq!(
            forest(&state, project)[0].description.as_deref(),
            Some("front and back")
        );
        set_description(&mut state, project, id, Some("   ".to_string()));
        assert_eq!(forest(&state, project)[0].description, None);
    }

    #[test]
    fn test_toggle_expand_twice_is_identity() {
        let (mut state, project, author) = sample_state();
        let id = add_task(&mut state, project, None, "Mow lawn", author)
            .unwrap()
            .unwrap();
        let before = forest(&state, project)[0].expanded;

        toggle_expand(&mut state, project, id);
        assert_eq!(forest(&state, project)[0].expanded, !before);
        toggle_expand(&mut state, project, id);
        assert_eq!(forest(&state, project)[0].expanded, before);
    }

    // --- activity and attachments ---

    #[test]
    fn test_add_comment_appends_entry() {
        let (mut state, project, author) = sample_state();
        let id = add_task(&mut state, project, None, "Mow lawn", author)
            .unwrap()
            .unwrap();

        add_comment(&mut state, project, id, "blades need sharpening", author).unwrap();
        let task = &forest(&state, project)[0];
        let entry = task.activity.last().unwrap();
        assert_eq!(entry.kind, ActivityKind::Comment);
        assert_eq!(entry.content, "blades need sharpening");

        let err = add_comment(&mut state, project, id, "  ", author).unwrap_err();
        assert_eq!(err, StoreError::EmptyComment);
    }

    #[test]
    fn test_add_attachment_records_activity() {
        let (mut state, project, author) = sample_state();
        let id = add_task(&mut state, project, None, "Mow lawn", author)
            .unwrap()
            .unwrap();

        let attachment = Attachment::new(
            "mower-manual.pdf".to_string(),
            AttachmentKind::Document,
            "file:///tmp/mower-manual.pdf".to_string(),
            author,
        );
        add_attachment(&mut state, project, id, attachment);

        let task = &forest(&state, project)[0];
        assert_eq!(task.attachments.len(), 1);
        assert_eq!(task.attachments[0].kind, AttachmentKind::Document);
        let entry = task.activity.last().unwrap();
        assert_eq!(entry.kind, ActivityKind::Attachment);
        assert_eq!(entry.content, "attached mower-manual.pdf");
    }

    // --- move_task ---

    #[test]
    fn test_move_task_reorders_within_project() {
        let (mut state, project, author) = sample_state();
        let a = add_task(&mut state, project, None, "a", author)
            .unwrap()
            .unwrap();
        let b = add_task(&mut state, project, None, "b", author)
            .unwrap()
            .unwrap();

        move_task(&mut state, project, b, a, DropPosition::Before);
        let tasks = forest(&state, project);
        assert_eq!(tasks[0].id, b);
        assert_eq!(tasks[1].id, a);
    }
}
