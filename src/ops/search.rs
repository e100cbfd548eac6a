use regex::Regex;

use crate::model::task::Task;

/// Compile a search query into the matcher used for filtering. Blank or
/// whitespace-only input means "no filter". The query is treated as a
/// literal, case-insensitive substring, not a user-supplied regex.
pub fn query_regex(query: &str) -> Option<Regex> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return None;
    }
    Regex::new(&format!("(?i){}", regex::escape(trimmed))).ok()
}

/// Whether the task itself matches, ignoring its subtasks.
fn self_matches(task: &Task, re: &Regex) -> bool {
    re.is_match(&task.title) || task.description.as_deref().is_some_and(|d| re.is_match(d))
}

/// Filter a forest down to the tasks worth showing for a search: a task
/// is kept when it matches or when any of its descendants does.
///
/// Kept tasks carry their *filtered* subtask list, so a matching parent
/// whose children all miss shows up childless. Every kept task is forced
/// open so deep hits are visible without extra clicks.
pub fn filter_forest(forest: &[Task], re: &Regex) -> Vec<Task> {
    forest
        .iter()
        .filter_map(|task| {
            let kept = filter_forest(&task.subtasks, re);
            if kept.is_empty() && !self_matches(task, re) {
                return None;
            }
            let mut task = task.clone();
            task.subtasks = kept;
            task.expanded = true;
            Some(task)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
