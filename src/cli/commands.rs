use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tl", about = concat!("[#] trellis v", env!("CARGO_PKG_VERSION"), " - task boards for small crews"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different board directory
    #[arg(short = 'C', long = "board-dir", global = true)]
    pub board_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new board in the current directory
    Init(InitArgs),
    /// List board members
    Users,
    /// Show or switch the signed-in user
    User(UserArgs),
    /// List projects with their progress
    Projects,
    /// Project management
    Project(ProjectCmd),
    /// Show the active project's task tree
    Tasks,
    /// Set or clear the task filter
    Search(SearchArgs),
    /// Task management
    Task(TaskCmd),
    /// Ask the advisor about the active project
    Advise(AdviseArgs),
    /// Ask the advisor to break a task into next steps
    Suggest(SuggestArgs),
    /// Show completion statistics per project
    Stats,
}

// ---------------------------------------------------------------------------
// Init args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct InitArgs {
    /// Board name (default: inferred from directory name)
    #[arg(long)]
    pub name: Option<String>,
    /// Add a board member (repeatable; default: a starter roster)
    #[arg(long, value_name = "NAME", action = clap::ArgAction::Append)]
    pub user: Vec<String>,
}

// ---------------------------------------------------------------------------
// Selection and read command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct UserArgs {
    /// Member name to sign in as (omit to show the current user)
    pub name: Option<String>,
}

#[derive(Args)]
pub struct SearchArgs {
    /// Text to match in task titles and descriptions
    pub query: Option<String>,
    /// Clear the active filter
    #[arg(long)]
    pub clear: bool,
}

#[derive(Args)]
pub struct AdviseArgs {
    /// Question to ask about the active project
    pub question: String,
}

#[derive(Args)]
pub struct SuggestArgs {
    /// Task to break down (id, id prefix, or exact title)
    pub task: String,
}

// ---------------------------------------------------------------------------
// Project management
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ProjectCmd {
    #[command(subcommand)]
    pub action: ProjectAction,
}

#[derive(Subcommand)]
pub enum ProjectAction {
    /// Create a project and make it active
    Add(ProjectAddArgs),
    /// Switch the active project
    Select(ProjectRefArg),
    /// Delete a project and everything in it
    Rm(ProjectRefArg),
}

#[derive(Args)]
pub struct ProjectAddArgs {
    /// Project title
    pub title: String,
    /// Subtitle shown under the title
    #[arg(long)]
    pub subtitle: Option<String>,
}

#[derive(Args)]
pub struct ProjectRefArg {
    /// Project (id, id prefix, or exact title)
    pub project: String,
}

// ---------------------------------------------------------------------------
// Task management
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct TaskCmd {
    #[command(subcommand)]
    pub action: TaskAction,
}

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a task to the active project
    Add(TaskAddArgs),
    /// Flip a leaf task between pending and completed
    Toggle(TaskRefArg),
    /// Delete a task and its whole subtree
    Rm(TaskRefArg),
    /// Change a task's title
    Title(TaskTitleArgs),
    /// Set or clear a task's description
    Desc(TaskDescArgs),
    /// Comment on a task
    Comment(TaskCommentArgs),
    /// Attach a file or link to a task
    Attach(TaskAttachArgs),
    /// Move a task relative to another
    Mv(TaskMvArgs),
    /// Show task details
    Show(TaskRefArg),
    /// Fold or unfold a task's subtasks in listings
    Expand(TaskRefArg),
}

#[derive(Args)]
pub struct TaskAddArgs {
    /// Task title
    pub title: String,
    /// Nest under this task (id, id prefix, or exact title)
    #[arg(long, value_name = "TASK")]
    pub under: Option<String>,
    /// Initial description
    #[arg(long)]
    pub desc: Option<String>,
}

#[derive(Args)]
pub struct TaskRefArg {
    /// Task (id, id prefix, or exact title)
    pub task: String,
}

#[derive(Args)]
pub struct TaskTitleArgs {
    /// Task to rename
    pub task: String,
    /// New title
    pub title: String,
}

#[derive(Args)]
pub struct TaskDescArgs {
    /// Task to edit
    pub task: String,
    /// New description (omit to clear)
    pub text: Option<String>,
}

#[derive(Args)]
pub struct TaskCommentArgs {
    /// Task to comment on
    pub task: String,
    /// Comment text
    pub text: String,
}

#[derive(Args)]
pub struct TaskAttachArgs {
    /// Task to attach to
    pub task: String,
    /// Local file to attach
    #[arg(long)]
    pub file: Option<String>,
    /// Link to attach
    #[arg(long)]
    pub url: Option<String>,
    /// Display name (default: the file or link name)
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Args)]
pub struct TaskMvArgs {
    /// Task to move
    pub task: String,
    /// Place just before this task
    #[arg(long, value_name = "TASK")]
    pub before: Option<String>,
    /// Place just after this task
    #[arg(long, value_name = "TASK")]
    pub after: Option<String>,
    /// Nest as the last subtask of this task
    #[arg(long, value_name = "TASK")]
    pub inside: Option<String>,
}
