use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::project::Project;
use super::task::Task;
use super::user::User;

/// The whole persisted board: every project keyed by id, in display
/// order. All mutation goes through `ops::store`; readers always see a
/// fully-formed value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    #[serde(default)]
    pub projects: IndexMap<Uuid, Project>,
}

impl AppState {
    pub fn project(&self, id: Uuid) -> Option<&Project> {
        self.projects.get(&id)
    }

    pub fn project_mut(&mut self, id: Uuid) -> Option<&mut Project> {
        self.projects.get_mut(&id)
    }

    /// The built-in starter board used when no saved state exists (or the
    /// saved file cannot be parsed). Owned by the first roster member.
    pub fn seed(roster: &[User]) -> AppState {
        let mut state = AppState::default();
        let Some(owner) = roster.first() else {
            return state;
        };

        let mut project = Project::new(
            "Getting started".to_string(),
            "A tour of trellis".to_string(),
            owner.id,
        );
        let mut first = Task::new("Try the basics".to_string(), owner.id);
        first.subtasks = vec![
            Task::new("Add a task with `tl task add`".to_string(), owner.id),
            Task::new("Check one off with `tl task toggle`".to_string(), owner.id),
        ];
        let second = Task::new("Invite the rest of the household".to_string(), owner.id);
        project.tasks = vec![first, second];

        state.projects.insert(project.id, project);
        state
    }
}
