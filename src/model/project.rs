use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::task::Task;

/// A top-level container owning a full task forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: Uuid,
    /// Root tasks in display order; each owns its whole subtree.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<Task>,
}

impl Project {
    pub fn new(title: String, subtitle: String, author: Uuid) -> Self {
        Project {
            id: Uuid::new_v4(),
            title,
            subtitle,
            image_url: None,
            created_at: Utc::now(),
            created_by: author,
            tasks: Vec::new(),
        }
    }
}
