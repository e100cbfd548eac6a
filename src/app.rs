use std::borrow::Cow;
use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

use crate::io::board_io::{self, BoardError};
use crate::io::session_io::{self, SessionState};
use crate::media::MediaRef;
use crate::model::config::BoardConfig;
use crate::model::project::Project;
use crate::model::state::AppState;
use crate::model::task::{Attachment, Task};
use crate::model::user::{self, User};
use crate::ops::progress;
use crate::ops::search;
use crate::ops::store::{self, StoreError};
use crate::ops::tree::{self, DropPosition};

/// Error type for session-level operations
#[derive(Debug, Error)]
pub enum AppError {
    #[error("no user selected: run `tl user <name>` first")]
    NoUser,
    #[error("no active project: run `tl project select <title>` first")]
    NoProject,
    #[error("no user named '{0}' on this board")]
    UnknownUser(String),
    #[error("{0}")]
    Store(#[from] StoreError),
    #[error("{0}")]
    Io(#[from] BoardError),
}

/// Working context for one command: the loaded board plus the per-device
/// selections. Every mutation goes through the store, then the whole new
/// state is persisted before the call returns; there is no partial save.
pub struct Session {
    pub board_dir: PathBuf,
    pub config: BoardConfig,
    pub state: AppState,
    pub current_user: Option<Uuid>,
    pub active_project: Option<Uuid>,
    pub search_query: String,
    pub dragged_task: Option<Uuid>,
}

impl Session {
    /// Load the board under `root`. A missing or unreadable state file
    /// falls back to a freshly seeded board; stale session selections
    /// are silently dropped.
    pub fn open(root: &Path) -> Result<Session, AppError> {
        let board_dir = root.join("trellis");
        let config = board_io::load_config(&board_dir)?;
        let state = board_io::load_state(&board_dir, &config)
            .unwrap_or_else(|| AppState::seed(&config.users));
        let saved = session_io::read_session(&board_dir).unwrap_or_default();

        let current_user = saved
            .current_user
            .filter(|id| user::find_by_id(&config.users, *id).is_some());
        let active_project = saved
            .active_project
            .filter(|id| state.project(*id).is_some())
            .or_else(|| state.projects.keys().next().copied());

        Ok(Session {
            board_dir,
            config,
            state,
            current_user,
            active_project,
            search_query: saved.search.unwrap_or_default(),
            dragged_task: None,
        })
    }

    /// Persist the full board state, then the selections. Selection
    /// write failures are ignored; losing them costs two picks.
    pub fn save(&self) -> Result<(), AppError> {
        board_io::save_state(&self.board_dir, &self.config, &self.state)?;
        let _ = session_io::write_session(&self.board_dir, &self.snapshot());
        Ok(())
    }

    /// Persist only the selections, for commands that change no board
    /// data.
    pub fn save_session(&self) -> Result<(), AppError> {
        session_io::write_session(&self.board_dir, &self.snapshot())
            .map_err(|e| AppError::Io(BoardError::IoError(e)))
    }

    fn snapshot(&self) -> SessionState {
        SessionState {
            current_user: self.current_user,
            active_project: self.active_project,
            search: if self.search_query.is_empty() {
                None
            } else {
                Some(self.search_query.clone())
            },
        }
    }

    // -----------------------------------------------------------------
    // Identity and selection
    // -----------------------------------------------------------------

    pub fn roster(&self) -> &[User] {
        &self.config.users
    }

    /// The acting user, resolved against the roster.
    pub fn user(&self) -> Option<&User> {
        self.current_user
            .and_then(|id| user::find_by_id(&self.config.users, id))
    }

    /// The project commands currently apply to.
    pub fn project(&self) -> Option<&Project> {
        self.active_project.and_then(|id| self.state.project(id))
    }

    fn require_user(&self) -> Result<Uuid, AppError> {
        self.current_user.ok_or(AppError::NoUser)
    }

    fn require_project(&self) -> Result<Uuid, AppError> {
        self.active_project
            .filter(|id| self.state.project(*id).is_some())
            .ok_or(AppError::NoProject)
    }

    /// Select the acting user by name (case-insensitive).
    pub fn select_user(&mut self, name: &str) -> Result<(), AppError> {
        let user = user::find_by_name(&self.config.users, name)
            .ok_or_else(|| AppError::UnknownUser(name.to_string()))?;
        self.current_user = Some(user.id);
        self.save_session()
    }

    /// Make a project the target of task commands. Callers resolve the
    /// reference to an id first.
    pub fn select_project(&mut self, id: Uuid) -> Result<(), AppError> {
        self.active_project = Some(id);
        self.save_session()
    }

    // -----------------------------------------------------------------
    // Search
    // -----------------------------------------------------------------

    pub fn set_search(&mut self, query: &str) -> Result<(), AppError> {
        self.search_query = query.trim().to_string();
        self.save_session()
    }

    pub fn clear_search(&mut self) -> Result<(), AppError> {
        self.search_query.clear();
        self.save_session()
    }

    /// The active project's tasks as the search filter leaves them: the
    /// raw forest when no query is set, otherwise the pruned view.
    pub fn visible_tasks(&self) -> Cow<'_, [Task]> {
        let Some(project) = self.project() else {
            return Cow::Owned(Vec::new());
        };
        match search::query_regex(&self.search_query) {
            Some(re) => Cow::Owned(search::filter_forest(&project.tasks, &re)),
            None => Cow::Borrowed(project.tasks.as_slice()),
        }
    }

    /// Find a task in the active project.
    pub fn find_task(&self, id: Uuid) -> Option<&Task> {
        self.project().and_then(|p| tree::find_task(&p.tasks, id))
    }

    // -----------------------------------------------------------------
    // Project mutations
    // -----------------------------------------------------------------

    /// Create a project and make it active.
    pub fn add_project(&mut self, title: &str, subtitle: &str) -> Result<Uuid, AppError> {
        let author = self.require_user()?;
        let id = store::add_project(&mut self.state, title, subtitle, author)?;
        self.active_project = Some(id);
        self.save()?;
        Ok(id)
    }

    /// Delete a project outright. If it was active, selection falls back
    /// to the first remaining project.
    pub fn delete_project(&mut self, id: Uuid) -> Result<(), AppError> {
        self.require_user()?;
        store::delete_project(&mut self.state, id);
        if self.active_project == Some(id) {
            self.active_project = self.state.projects.keys().next().copied();
        }
        self.save()
    }

    // -----------------------------------------------------------------
    // Task mutations
    // -----------------------------------------------------------------

    /// Add a task under `parent`, or at the project root when `parent`
    /// is `None`. Returns the new id, or `None` when the parent vanished
    /// out from under us.
    pub fn add_task(
        &mut self,
        parent: Option<Uuid>,
        title: &str,
    ) -> Result<Option<Uuid>, AppError> {
        let author = self.require_user()?;
        let project = self.require_project()?;
        let id = store::add_task(&mut self.state, project, parent, title, author)?;
        self.save()?;
        Ok(id)
    }

    pub fn toggle_status(&mut self, task: Uuid) -> Result<(), AppError> {
        let author = self.require_user()?;
        let project = self.require_project()?;
        store::toggle_status(&mut self.state, project, task, author)?;
        self.save()
    }

    pub fn delete_task(&mut self, task: Uuid) -> Result<(), AppError> {
        let author = self.require_user()?;
        let project = self.require_project()?;
        store::delete_task(&mut self.state, project, task, author)?;
        self.save()
    }

    pub fn rename_task(&mut self, task: Uuid, title: &str) -> Result<(), AppError> {
        self.require_user()?;
        let project = self.require_project()?;
        store::rename_task(&mut self.state, project, task, title)?;
        self.save()
    }

    pub fn set_description(
        &mut self,
        task: Uuid,
        description: Option<String>,
    ) -> Result<(), AppError> {
        self.require_user()?;
        let project = self.require_project()?;
        store::set_description(&mut self.state, project, task, description);
        self.save()
    }

    pub fn add_comment(&mut self, task: Uuid, text: &str) -> Result<(), AppError> {
        let author = self.require_user()?;
        let project = self.require_project()?;
        store::add_comment(&mut self.state, project, task, text, author)?;
        self.save()
    }

    /// Attach encoded media to a task.
    pub fn attach(&mut self, task: Uuid, media: MediaRef) -> Result<(), AppError> {
        let author = self.require_user()?;
        let project = self.require_project()?;
        let attachment = Attachment::new(media.name, media.kind, media.url, author);
        store::add_attachment(&mut self.state, project, task, attachment);
        self.save()
    }

    pub fn toggle_expand(&mut self, task: Uuid) -> Result<(), AppError> {
        self.require_user()?;
        let project = self.require_project()?;
        store::toggle_expand(&mut self.state, project, task);
        self.save()
    }

    // -----------------------------------------------------------------
    // Drag and drop
    // -----------------------------------------------------------------

    /// Pick a task up. Nothing moves until the drop.
    pub fn begin_drag(&mut self, task: Uuid) {
        self.dragged_task = Some(task);
    }

    pub fn cancel_drag(&mut self) {
        self.dragged_task = None;
    }

    /// Drop the picked-up task relative to `target`. With nothing picked
    /// up this is a quiet no-op; a drop that cannot apply (stale target,
    /// a task dropped into its own subtree) leaves the board unchanged.
    pub fn drop_on(&mut self, target: Uuid, position: DropPosition) -> Result<(), AppError> {
        self.require_user()?;
        let project = self.require_project()?;
        let Some(dragged) = self.dragged_task.take() else {
            return Ok(());
        };
        store::move_task(&mut self.state, project, dragged, target, position);
        self.save()
    }

    /// One-step move for callers that don't stage a drag first.
    pub fn move_task(
        &mut self,
        dragged: Uuid,
        target: Uuid,
        position: DropPosition,
    ) -> Result<(), AppError> {
        self.begin_drag(dragged);
        self.drop_on(target, position)
    }

    // -----------------------------------------------------------------
    // Advisor context
    // -----------------------------------------------------------------

    /// Context block sent with an advise question: the active project's
    /// headline, overall progress, and the root task titles.
    pub fn advice_context(&self) -> Result<String, AppError> {
        let project = self.project().ok_or(AppError::NoProject)?;
        let mut out = if project.subtitle.is_empty() {
            format!("Project: {}\n", project.title)
        } else {
            format!("Project: {} ({})\n", project.title, project.subtitle)
        };
        out.push_str(&format!(
            "Progress: {}%\nTasks:\n",
            progress::project_progress(&project.tasks)
        ));
        for task in &project.tasks {
            out.push_str(&format!(
                "- [{}] {} ({}%)\n",
                task.status.checkbox_char(),
                task.title,
                progress::task_progress(task)
            ));
        }
        Ok(out)
    }

    /// Extra prompt detail for next-step suggestions: subtask titles the
    /// user should not have to retype.
    pub fn suggestion_context(&self, task: &Task) -> String {
        if task.subtasks.is_empty() {
            return String::new();
        }
        let titles: Vec<&str> = task.subtasks.iter().map(|t| t.title.as_str()).collect();
        format!("Existing subtasks: {}", titles.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn open_board() -> (TempDir, Session) {
        let tmp = TempDir::new().unwrap();
        board_io::init_board(tmp.path(), "home", &[]).unwrap();
        let session = Session::open(tmp.path()).unwrap();
        (tmp, session)
    }

    fn signed_in() -> (TempDir, Session) {
        let (tmp, mut session) = open_board();
        session.select_user("alex").unwrap();
        (tmp, session)
    }

    #[test]
    fn open_falls_back_to_seeded_state() {
        let (tmp, session) = open_board();
        assert_eq!(session.state.projects.len(), 1);
        assert!(session.active_project.is_some());
        assert!(session.current_user.is_none());

        // wipe the state file: reopening seeds again instead of failing
        fs::remove_file(tmp.path().join("trellis/board.json")).unwrap();
        let reopened = Session::open(tmp.path()).unwrap();
        assert_eq!(reopened.state.projects.len(), 1);
    }

    #[test]
    fn mutations_persist_across_sessions() {
        let (tmp, mut session) = signed_in();
        let id = session.add_task(None, "Paint the fence").unwrap().unwrap();

        let reopened = Session::open(tmp.path()).unwrap();
        assert!(reopened.find_task(id).is_some());
        assert_eq!(reopened.current_user, session.current_user);
    }

    #[test]
    fn project_scoped_mutations_need_a_user() {
        let (_tmp, mut session) = open_board();
        let err = session.add_task(None, "orphan").unwrap_err();
        assert!(matches!(err, AppError::NoUser));

        let err = session.select_user("nobody").unwrap_err();
        assert!(matches!(err, AppError::UnknownUser(_)));
    }

    #[test]
    fn visible_tasks_follow_the_search_query() {
        let (_tmp, mut session) = signed_in();
        session.add_task(None, "Paint the fence").unwrap();

        session.set_search("paint").unwrap();
        let visible = session.visible_tasks();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].title, "Paint the fence");

        session.clear_search().unwrap();
        let all = session.visible_tasks();
        assert!(all.len() > 1);
    }

    #[test]
    fn drag_then_drop_moves_a_task() {
        let (_tmp, mut session) = signed_in();
        let a = session.add_task(None, "a").unwrap().unwrap();
        let b = session.add_task(None, "b").unwrap().unwrap();

        session.begin_drag(b);
        session.drop_on(a, DropPosition::Before).unwrap();
        let project = session.project().unwrap();
        let last_two: Vec<Uuid> = project.tasks.iter().rev().take(2).map(|t| t.id).collect();
        assert_eq!(last_two, vec![a, b]);

        // cancelled drag: dropping later does nothing
        session.begin_drag(a);
        session.cancel_drag();
        let before = session.project().unwrap().tasks.clone();
        session.drop_on(b, DropPosition::After).unwrap();
        assert_eq!(session.project().unwrap().tasks, before);
    }

    #[test]
    fn stale_session_selections_are_dropped() {
        let (tmp, session) = open_board();
        session_io::write_session(
            &session.board_dir,
            &SessionState {
                current_user: Some(Uuid::new_v4()),
                active_project: Some(Uuid::new_v4()),
                search: None,
            },
        )
        .unwrap();

        let reopened = Session::open(tmp.path()).unwrap();
        assert!(reopened.current_user.is_none());
        // falls back to the first project rather than a dangling id
        assert_eq!(
            reopened.active_project,
            reopened.state.projects.keys().next().copied()
        );
    }

    #[test]
    fn deleting_the_active_project_moves_selection() {
        let (_tmp, mut session) = signed_in();
        let first = session.active_project.unwrap();
        let second = session.add_project("Workshop", "").unwrap();
        assert_eq!(session.active_project, Some(second));

        session.delete_project(second).unwrap();
        assert_eq!(session.active_project, Some(first));
    }

    #[test]
    fn advice_context_lists_root_tasks() {
        let (_tmp, mut session) = signed_in();
        session.add_task(None, "Paint the fence").unwrap();
        let context = session.advice_context().unwrap();
        assert!(context.starts_with("Project: Getting started"));
        assert!(context.contains("- [ ] Paint the fence (0%)"));
    }
}
