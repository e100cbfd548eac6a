use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Completion state of a leaf task.
///
/// Only meaningful when `subtasks` is empty; a parent task's completion is
/// derived from its children (see `ops::progress`), never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Completed,
}

impl TaskStatus {
    /// The character used inside the checkbox `[ ]`
    pub fn checkbox_char(self) -> char {
        match self {
            TaskStatus::Pending => ' ',
            TaskStatus::Completed => 'x',
        }
    }

    /// The opposite state.
    pub fn toggled(self) -> TaskStatus {
        match self {
            TaskStatus::Pending => TaskStatus::Completed,
            TaskStatus::Completed => TaskStatus::Pending,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
        }
    }
}

/// What kind of thing an attachment points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    Document,
    Audio,
    Video,
    Link,
}

impl AttachmentKind {
    pub fn label(self) -> &'static str {
        match self {
            AttachmentKind::Image => "image",
            AttachmentKind::Document => "document",
            AttachmentKind::Audio => "audio",
            AttachmentKind::Video => "video",
            AttachmentKind::Link => "link",
        }
    }
}

/// A file or link attached to a task. Immutable once created; the
/// collection on a task is append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: Uuid,
    pub name: String,
    pub kind: AttachmentKind,
    /// Opaque storable reference (a URL, `file://` path, or data URI).
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub created_by: Uuid,
}

impl Attachment {
    pub fn new(name: String, kind: AttachmentKind, url: String, author: Uuid) -> Self {
        Attachment {
            id: Uuid::new_v4(),
            name,
            kind,
            url,
            created_at: Utc::now(),
            created_by: author,
        }
    }
}

/// Category of an activity entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Comment,
    StatusChange,
    Creation,
    Attachment,
}

/// One entry in a task's history. Immutable; the log is append-only and a
/// task always starts with exactly one `Creation` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: Uuid,
    pub kind: ActivityKind,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub created_by: Uuid,
}

impl ActivityEntry {
    pub fn new(kind: ActivityKind, content: String, author: Uuid) -> Self {
        ActivityEntry {
            id: Uuid::new_v4(),
            kind,
            content,
            timestamp: Utc::now(),
            created_by: author,
        }
    }
}

/// A task node. Tasks form a strict tree: `subtasks` is exclusively owned,
/// ordered, and arbitrarily deep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique within the whole board; never changes after creation.
    pub id: Uuid,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<Task>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub activity: Vec<ActivityEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Whether the subtask list is unfolded in listings. A display hint,
    /// not a structural property.
    #[serde(default)]
    pub expanded: bool,
    /// Owner: only this user may toggle `status` or delete the task.
    pub created_by: Uuid,
}

impl Task {
    /// Create a pending task owned by `author`, expanded, with its
    /// initial `Creation` activity entry.
    pub fn new(title: String, author: Uuid) -> Self {
        Task {
            id: Uuid::new_v4(),
            title,
            description: None,
            status: TaskStatus::Pending,
            subtasks: Vec::new(),
            attachments: Vec::new(),
            activity: vec![ActivityEntry::new(
                ActivityKind::Creation,
                "created this task".to_string(),
                author,
            )],
            tags: Vec::new(),
            expanded: true,
            created_by: author,
        }
    }

    /// A task with no subtasks; the only kind whose `status` is
    /// authoritative.
    pub fn is_leaf(&self) -> bool {
        self.subtasks.is_empty()
    }
}
