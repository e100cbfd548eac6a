use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A member of the board's fixed roster. The core treats the id purely as
/// an authorization token; everything else is presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl User {
    pub fn new(name: String) -> Self {
        User {
            id: Uuid::new_v4(),
            name,
            color: None,
            avatar_url: None,
        }
    }
}

/// Find a roster member by name (case-insensitive).
pub fn find_by_name<'a>(roster: &'a [User], name: &str) -> Option<&'a User> {
    roster
        .iter()
        .find(|u| u.name.eq_ignore_ascii_case(name.trim()))
}

/// Find a roster member by id.
pub fn find_by_id(roster: &[User], id: Uuid) -> Option<&User> {
    roster.iter().find(|u| u.id == id)
}
