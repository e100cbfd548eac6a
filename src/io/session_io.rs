use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Persisted per-device selections (written to .session.json).
///
/// This is throwaway convenience state, separate from the board itself:
/// losing it costs the user two picks, nothing more.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Who is acting
    #[serde(default)]
    pub current_user: Option<Uuid>,
    /// Which project commands apply to
    #[serde(default)]
    pub active_project: Option<Uuid>,
    /// Last search filter, if one is active
    #[serde(default)]
    pub search: Option<String>,
}

/// Read .session.json from the board directory
pub fn read_session(board_dir: &Path) -> Option<SessionState> {
    let path = board_dir.join(".session.json");
    let content = fs::read_to_string(&path).ok()?;
    serde_json::from_str(&content).ok()
}

/// Write .session.json to the board directory
pub fn write_session(board_dir: &Path, session: &SessionState) -> Result<(), std::io::Error> {
    let path = board_dir.join(".session.json");
    let content = serde_json::to_string_pretty(session)?;
    fs::write(&path, content)
}
