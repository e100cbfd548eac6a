use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::model::project::Project;
use crate::model::task::{ActivityKind, AttachmentKind, Task, TaskStatus};
use crate::model::user::{self, User};
use crate::ops::progress;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson {
    pub id: Uuid,
    pub title: String,
    pub status: TaskStatus,
    pub progress: u8,
    pub owner: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<AttachmentJson>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub activity: Vec<ActivityJson>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<TaskJson>,
}

#[derive(Serialize)]
pub struct AttachmentJson {
    pub name: String,
    pub kind: AttachmentKind,
    pub url: String,
    pub by: String,
    pub at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct ActivityJson {
    pub kind: ActivityKind,
    pub content: String,
    pub by: String,
    pub at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct TaskListJson {
    pub project: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    pub tasks: Vec<TaskJson>,
}

#[derive(Serialize)]
pub struct ProjectJson {
    pub id: Uuid,
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub subtitle: String,
    pub active: bool,
    pub progress: u8,
    pub done: usize,
    pub total: usize,
}

#[derive(Serialize)]
pub struct UserJson {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub current: bool,
}

#[derive(Serialize)]
pub struct StatsJson {
    pub projects: Vec<ProjectJson>,
    pub totals: BoardTotalsJson,
}

#[derive(Serialize)]
pub struct BoardTotalsJson {
    pub projects: usize,
    pub done: usize,
    pub open: usize,
    pub total: usize,
}

#[derive(Serialize)]
pub struct AdviceJson {
    pub answer: String,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn task_to_json(task: &Task, roster: &[User]) -> TaskJson {
    TaskJson {
        id: task.id,
        title: task.title.clone(),
        status: task.status,
        progress: progress::task_progress(task),
        owner: member_name(roster, task.created_by),
        description: task.description.clone(),
        tags: task.tags.clone(),
        attachments: task
            .attachments
            .iter()
            .map(|a| AttachmentJson {
                name: a.name.clone(),
                kind: a.kind,
                url: a.url.clone(),
                by: member_name(roster, a.created_by),
                at: a.created_at,
            })
            .collect(),
        activity: task
            .activity
            .iter()
            .map(|e| ActivityJson {
                kind: e.kind,
                content: e.content.clone(),
                by: member_name(roster, e.created_by),
                at: e.timestamp,
            })
            .collect(),
        subtasks: task
            .subtasks
            .iter()
            .map(|t| task_to_json(t, roster))
            .collect(),
    }
}

pub fn project_to_json(project: &Project, active: bool) -> ProjectJson {
    let counts = progress::leaf_counts(&project.tasks);
    ProjectJson {
        id: project.id,
        title: project.title.clone(),
        subtitle: project.subtitle.clone(),
        active,
        progress: progress::project_progress(&project.tasks),
        done: counts.done,
        total: counts.total,
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// First eight hex digits of the id; enough to paste back as a reference.
pub fn short_id(id: &Uuid) -> String {
    id.simple().to_string()[..8].to_string()
}

/// Roster name for an id, falling back to the short id when the member
/// is no longer on the board.
pub fn member_name(roster: &[User], id: Uuid) -> String {
    user::find_by_id(roster, id)
        .map(|u| u.name.clone())
        .unwrap_or_else(|| short_id(&id))
}

/// Format a single task as a one-line summary. Parents get a derived
/// percentage; leaves just get their checkbox.
pub fn format_task_line(task: &Task) -> String {
    let pct = progress::task_progress(task);
    let sc = if pct == 100 { 'x' } else { ' ' };
    let progress_str = if task.is_leaf() {
        String::new()
    } else {
        format!(" ({}%)", pct)
    };
    let tags_str = if task.tags.is_empty() {
        String::new()
    } else {
        format!(
            " {}",
            task.tags
                .iter()
                .map(|t| format!("#{}", t))
                .collect::<Vec<_>>()
                .join(" ")
        )
    };
    format!(
        "[{}] {} {}{}{}",
        sc,
        short_id(&task.id),
        task.title,
        progress_str,
        tags_str
    )
}

/// Format a task with its subtasks, indented. A folded task shows how
/// many children it is hiding instead of listing them.
pub fn format_task_tree(task: &Task, indent: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let prefix = "  ".repeat(indent);
    if task.expanded || task.subtasks.is_empty() {
        lines.push(format!("{}{}", prefix, format_task_line(task)));
        for sub in &task.subtasks {
            lines.extend(format_task_tree(sub, indent + 1));
        }
    } else {
        lines.push(format!(
            "{}{} (+{} folded)",
            prefix,
            format_task_line(task),
            task.subtasks.len()
        ));
    }
    lines
}

/// Format detailed task view: description, attachments, full history.
pub fn format_task_detail(task: &Task, roster: &[User]) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push(format_task_line(task));
    lines.push(format!("owner: {}", member_name(roster, task.created_by)));

    if let Some(ref desc) = task.description {
        lines.push("description:".to_string());
        for line in desc.lines() {
            lines.push(format!("  {}", line));
        }
    }

    if !task.attachments.is_empty() {
        lines.push(String::new());
        lines.push("attachments:".to_string());
        for a in &task.attachments {
            lines.push(format!("  {} ({}) {}", a.name, a.kind.label(), a.url));
        }
    }

    if !task.activity.is_empty() {
        lines.push(String::new());
        lines.push("activity:".to_string());
        for entry in &task.activity {
            lines.push(format!(
                "  {}  {}: {}",
                entry.timestamp.format("%Y-%m-%d %H:%M"),
                member_name(roster, entry.created_by),
                entry.content
            ));
        }
    }

    if !task.subtasks.is_empty() {
        lines.push(String::new());
        lines.push("subtasks:".to_string());
        for sub in &task.subtasks {
            for line in format_task_tree(sub, 1) {
                lines.push(line);
            }
        }
    }

    lines
}

/// Format a project as a one-line summary for the projects listing.
pub fn format_project_line(project: &Project, active: bool) -> String {
    let marker = if active { '*' } else { ' ' };
    let counts = progress::leaf_counts(&project.tasks);
    let subtitle_str = if project.subtitle.is_empty() {
        String::new()
    } else {
        format!(" - {}", project.subtitle)
    };
    format!(
        "{} [{:>3}%] {} {}{} ({}/{} done)",
        marker,
        progress::project_progress(&project.tasks),
        short_id(&project.id),
        project.title,
        subtitle_str,
        counts.done,
        counts.total,
    )
}
