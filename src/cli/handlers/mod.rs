mod init;
pub use init::cmd_init;

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use uuid::Uuid;

use crate::advisor::advisor_from_config;
use crate::app::{AppError, Session};
use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::board_io;
use crate::io::lock::BoardLock;
use crate::media;
use crate::ops::progress;
use crate::ops::tree::{self, DropPosition};

/// Global override for the board directory (set by -C flag)
static BOARD_DIR_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let json = cli.json;

    // Store -C override for board_root()
    if let Some(ref dir) = cli.board_dir {
        let abs = std::fs::canonicalize(dir)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?;
        BOARD_DIR_OVERRIDE.lock().unwrap().replace(abs);
    }

    match cli.command {
        // With no subcommand, show the active project's tasks
        None => cmd_tasks(json),
        Some(cmd) => match cmd {
            // Init creates the board; everything below discovers one
            Commands::Init(args) => cmd_init(args),

            // Read commands
            Commands::Users => cmd_users(json),
            Commands::User(args) => cmd_user(args, json),
            Commands::Projects => cmd_projects(json),
            Commands::Tasks => cmd_tasks(json),
            Commands::Stats => cmd_stats(json),

            // Selection and search
            Commands::Search(args) => cmd_search(args),
            Commands::Project(cmd) => match cmd.action {
                ProjectAction::Add(args) => cmd_project_add(args),
                ProjectAction::Select(args) => cmd_project_select(args),
                ProjectAction::Rm(args) => cmd_project_rm(args),
            },

            // Task commands
            Commands::Task(cmd) => match cmd.action {
                TaskAction::Add(args) => cmd_task_add(args),
                TaskAction::Toggle(args) => cmd_task_toggle(args),
                TaskAction::Rm(args) => cmd_task_rm(args),
                TaskAction::Title(args) => cmd_task_title(args),
                TaskAction::Desc(args) => cmd_task_desc(args),
                TaskAction::Comment(args) => cmd_task_comment(args),
                TaskAction::Attach(args) => cmd_task_attach(args),
                TaskAction::Mv(args) => cmd_task_mv(args),
                TaskAction::Show(args) => cmd_task_show(args, json),
                TaskAction::Expand(args) => cmd_task_expand(args),
            },

            // Advisor
            Commands::Advise(args) => cmd_advise(args, json),
            Commands::Suggest(args) => cmd_suggest(args, json),
        },
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// The directory `init` targets: the -C override if given, else cwd.
fn override_or_cwd() -> std::io::Result<PathBuf> {
    match BOARD_DIR_OVERRIDE.lock().unwrap().as_ref() {
        Some(dir) => Ok(dir.clone()),
        None => std::env::current_dir(),
    }
}

fn open_session() -> Result<Session, Box<dyn std::error::Error>> {
    let start = override_or_cwd()?;
    let root = board_io::discover_board(&start)?;
    Ok(Session::open(&root)?)
}

/// Resolve a project reference: full id, unique id prefix, or exact
/// title (case-insensitive).
fn resolve_project(session: &Session, reference: &str) -> Result<Uuid, Box<dyn std::error::Error>> {
    let needle = reference.trim();
    if let Ok(id) = Uuid::parse_str(needle)
        && session.state.project(id).is_some()
    {
        return Ok(id);
    }

    let lowered = needle.to_lowercase();
    let mut prefix_hits = Vec::new();
    let mut title_hits = Vec::new();
    for project in session.state.projects.values() {
        if project.id.simple().to_string().starts_with(&lowered) {
            prefix_hits.push(project.id);
        }
        if project.title.eq_ignore_ascii_case(needle) {
            title_hits.push(project.id);
        }
    }

    match (prefix_hits.len(), title_hits.len()) {
        (1, _) => Ok(prefix_hits[0]),
        (0, 1) => Ok(title_hits[0]),
        (0, 0) => Err(format!("no project matches '{}'", reference).into()),
        _ => Err(format!("'{}' is ambiguous; use more of the id", reference).into()),
    }
}

/// Resolve a task reference within the active project: full id, unique
/// id prefix, or exact title (case-insensitive).
fn resolve_task(session: &Session, reference: &str) -> Result<Uuid, Box<dyn std::error::Error>> {
    let project = session.project().ok_or(AppError::NoProject)?;
    let needle = reference.trim();
    if let Ok(id) = Uuid::parse_str(needle)
        && tree::find_task(&project.tasks, id).is_some()
    {
        return Ok(id);
    }

    let lowered = needle.to_lowercase();
    let mut prefix_hits = Vec::new();
    let mut title_hits = Vec::new();
    tree::for_each_task(&project.tasks, &mut |task| {
        if task.id.simple().to_string().starts_with(&lowered) {
            prefix_hits.push(task.id);
        }
        if task.title.eq_ignore_ascii_case(needle) {
            title_hits.push(task.id);
        }
    });

    match (prefix_hits.len(), title_hits.len()) {
        (1, _) => Ok(prefix_hits[0]),
        (0, 1) => Ok(title_hits[0]),
        (0, 0) => Err(format!("no task matches '{}'", reference).into()),
        _ => Err(format!("'{}' is ambiguous; use more of the id", reference).into()),
    }
}

// ---------------------------------------------------------------------------
// Read command handlers
// ---------------------------------------------------------------------------

fn cmd_users(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let session = open_session()?;

    if json {
        let users: Vec<UserJson> = session
            .roster()
            .iter()
            .map(|u| UserJson {
                id: u.id,
                name: u.name.clone(),
                color: u.color.clone(),
                current: session.current_user == Some(u.id),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&users)?);
    } else {
        for user in session.roster() {
            let marker = if session.current_user == Some(user.id) {
                '*'
            } else {
                ' '
            };
            println!("{} {}", marker, user.name);
        }
    }
    Ok(())
}

fn cmd_user(args: UserArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session()?;

    if let Some(ref name) = args.name {
        session.select_user(name)?;
        let signed_in = session.user().map(|u| u.name.clone());
        println!("signed in as {}", signed_in.as_deref().unwrap_or(name));
        return Ok(());
    }

    let current = session.user().map(|u| UserJson {
        id: u.id,
        name: u.name.clone(),
        color: u.color.clone(),
        current: true,
    });
    if json {
        println!("{}", serde_json::to_string_pretty(&current)?);
    } else {
        match current {
            Some(user) => println!("{}", user.name),
            None => println!("(nobody is signed in; run `tl user <name>`)"),
        }
    }
    Ok(())
}

fn cmd_projects(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let session = open_session()?;

    if json {
        let projects: Vec<ProjectJson> = session
            .state
            .projects
            .values()
            .map(|p| project_to_json(p, session.active_project == Some(p.id)))
            .collect();
        println!("{}", serde_json::to_string_pretty(&projects)?);
    } else {
        if session.state.projects.is_empty() {
            println!("(no projects; run `tl project add \"title\"`)");
        }
        for project in session.state.projects.values() {
            let active = session.active_project == Some(project.id);
            println!("{}", format_project_line(project, active));
        }
    }
    Ok(())
}

fn cmd_tasks(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let session = open_session()?;
    let Some(project) = session.project() else {
        return Err(AppError::NoProject.into());
    };
    let visible = session.visible_tasks();
    let filter = if session.search_query.is_empty() {
        None
    } else {
        Some(session.search_query.clone())
    };

    if json {
        let listing = TaskListJson {
            project: project.title.clone(),
            filter,
            tasks: visible
                .iter()
                .map(|t| task_to_json(t, session.roster()))
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&listing)?);
    } else {
        println!(
            "== {} ({}%) ==",
            project.title,
            progress::project_progress(&project.tasks)
        );
        if let Some(ref query) = filter {
            println!("(filtered: \"{}\")", query);
        }
        println!();
        if visible.is_empty() {
            if filter.is_some() {
                println!("(no tasks match)");
            } else {
                println!("(no tasks yet; run `tl task add \"title\"`)");
            }
        }
        for task in visible.iter() {
            for line in format_task_tree(task, 0) {
                println!("{}", line);
            }
        }
    }
    Ok(())
}

fn cmd_stats(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let session = open_session()?;
    let mut totals = progress::LeafCounts::default();
    let mut entries = Vec::new();
    for project in session.state.projects.values() {
        let counts = progress::leaf_counts(&project.tasks);
        totals.done += counts.done;
        totals.total += counts.total;
        entries.push((project, counts));
    }

    if json {
        let output = StatsJson {
            projects: entries
                .iter()
                .map(|(p, _)| project_to_json(p, session.active_project == Some(p.id)))
                .collect(),
            totals: BoardTotalsJson {
                projects: entries.len(),
                done: totals.done,
                open: totals.total - totals.done,
                total: totals.total,
            },
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        let title_w = entries
            .iter()
            .map(|(p, _)| p.title.len())
            .max()
            .unwrap_or(0)
            .max(7); // "Project"

        println!(
            " {:<title_w$}  {:>4}  {:>4}  {:>4}  {:>4}",
            "Project",
            "done",
            "open",
            "all",
            "pct",
            title_w = title_w,
        );
        for (project, counts) in &entries {
            println!(
                " {:<title_w$}  {:>4}  {:>4}  {:>4}  {:>3}%",
                project.title,
                counts.done,
                counts.total - counts.done,
                counts.total,
                progress::project_progress(&project.tasks),
                title_w = title_w,
            );
        }
        println!();
        println!(
            " {:<title_w$}  {:>4}  {:>4}  {:>4}",
            "Total",
            totals.done,
            totals.total - totals.done,
            totals.total,
            title_w = title_w,
        );
    }
    Ok(())
}

fn cmd_task_show(args: TaskRefArg, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let session = open_session()?;
    let id = resolve_task(&session, &args.task)?;
    let task = session
        .find_task(id)
        .ok_or_else(|| format!("no task matches '{}'", args.task))?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&task_to_json(task, session.roster()))?
        );
    } else {
        for line in format_task_detail(task, session.roster()) {
            println!("{}", line);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Selection and search handlers
// ---------------------------------------------------------------------------

fn cmd_search(args: SearchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session()?;

    if args.clear {
        session.clear_search()?;
        println!("filter cleared");
        return Ok(());
    }

    match args.query {
        Some(ref query) => {
            session.set_search(query)?;
            let visible = session.visible_tasks();
            if visible.is_empty() {
                println!("(no tasks match \"{}\")", session.search_query);
            }
            for task in visible.iter() {
                for line in format_task_tree(task, 0) {
                    println!("{}", line);
                }
            }
        }
        None => {
            if session.search_query.is_empty() {
                println!("(no filter set)");
            } else {
                println!("filter: \"{}\"", session.search_query);
            }
        }
    }
    Ok(())
}

fn cmd_project_select(args: ProjectRefArg) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session()?;
    let id = resolve_project(&session, &args.project)?;
    session.select_project(id)?;
    let title = session.project().map(|p| p.title.clone()).unwrap_or_default();
    println!("active project: {}", title);
    Ok(())
}

// ---------------------------------------------------------------------------
// Write command handlers
// ---------------------------------------------------------------------------

fn cmd_project_add(args: ProjectAddArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session()?;
    let _lock = BoardLock::acquire(&session.board_dir)?;

    let subtitle = args.subtitle.as_deref().unwrap_or("");
    let id = session.add_project(&args.title, subtitle)?;
    println!("{} {}", short_id(&id), args.title.trim());
    Ok(())
}

fn cmd_project_rm(args: ProjectRefArg) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session()?;
    let _lock = BoardLock::acquire(&session.board_dir)?;

    let id = resolve_project(&session, &args.project)?;
    let title = session
        .state
        .project(id)
        .map(|p| p.title.clone())
        .unwrap_or_default();
    session.delete_project(id)?;
    println!("deleted project: {}", title);
    Ok(())
}

fn cmd_task_add(args: TaskAddArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session()?;
    let _lock = BoardLock::acquire(&session.board_dir)?;

    let parent = match args.under {
        Some(ref reference) => Some(resolve_task(&session, reference)?),
        None => None,
    };

    let Some(id) = session.add_task(parent, &args.title)? else {
        println!("nothing added");
        return Ok(());
    };
    if let Some(desc) = args.desc {
        session.set_description(id, Some(desc))?;
    }
    println!("{}", short_id(&id));
    Ok(())
}

fn cmd_task_toggle(args: TaskRefArg) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session()?;
    let _lock = BoardLock::acquire(&session.board_dir)?;

    let id = resolve_task(&session, &args.task)?;
    session.toggle_status(id)?;
    if let Some(task) = session.find_task(id) {
        println!("{} is {}", task.title, task.status.label());
    }
    Ok(())
}

fn cmd_task_rm(args: TaskRefArg) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session()?;
    let _lock = BoardLock::acquire(&session.board_dir)?;

    let id = resolve_task(&session, &args.task)?;
    let title = session
        .find_task(id)
        .map(|t| t.title.clone())
        .unwrap_or_default();
    session.delete_task(id)?;
    println!("deleted: {}", title);
    Ok(())
}

fn cmd_task_title(args: TaskTitleArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session()?;
    let _lock = BoardLock::acquire(&session.board_dir)?;

    let id = resolve_task(&session, &args.task)?;
    session.rename_task(id, &args.title)?;
    println!("renamed to: {}", args.title.trim());
    Ok(())
}

fn cmd_task_desc(args: TaskDescArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session()?;
    let _lock = BoardLock::acquire(&session.board_dir)?;

    let id = resolve_task(&session, &args.task)?;
    session.set_description(id, args.text)?;
    match session.find_task(id).and_then(|t| t.description.as_deref()) {
        Some(_) => println!("description updated"),
        None => println!("description cleared"),
    }
    Ok(())
}

fn cmd_task_comment(args: TaskCommentArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session()?;
    let _lock = BoardLock::acquire(&session.board_dir)?;

    let id = resolve_task(&session, &args.task)?;
    session.add_comment(id, &args.text)?;
    println!("comment added");
    Ok(())
}

fn cmd_task_attach(args: TaskAttachArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session()?;
    let _lock = BoardLock::acquire(&session.board_dir)?;

    let id = resolve_task(&session, &args.task)?;
    let media = match (&args.file, &args.url) {
        (Some(_), Some(_)) => return Err("--file and --url are conflicting flags".into()),
        (Some(path), None) => {
            let mut media = media::encode_file(Path::new(path))?;
            if let Some(name) = args.name {
                media.name = name;
            }
            media
        }
        (None, Some(url)) => media::link_ref(url, args.name.as_deref()),
        (None, None) => return Err("specify --file <path> or --url <url>".into()),
    };

    let name = media.name.clone();
    session.attach(id, media)?;
    println!("attached: {}", name);
    Ok(())
}

fn cmd_task_mv(args: TaskMvArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session()?;
    let _lock = BoardLock::acquire(&session.board_dir)?;

    let dragged = resolve_task(&session, &args.task)?;
    let (target_ref, position) = match (&args.before, &args.after, &args.inside) {
        (Some(r), None, None) => (r, DropPosition::Before),
        (None, Some(r), None) => (r, DropPosition::After),
        (None, None, Some(r)) => (r, DropPosition::Inside),
        (None, None, None) => return Err("specify --before, --after, or --inside".into()),
        _ => return Err("--before, --after, and --inside are conflicting flags".into()),
    };
    let target = resolve_task(&session, target_ref)?;

    // A drop that cannot apply leaves the board unchanged; report that
    // instead of pretending it landed.
    let before = session.project().map(|p| p.tasks.clone());
    session.move_task(dragged, target, position)?;
    let after = session.project().map(|p| p.tasks.clone());
    if before == after {
        println!("nothing moved");
    } else {
        println!("{} moved", short_id(&dragged));
    }
    Ok(())
}

fn cmd_task_expand(args: TaskRefArg) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session()?;
    let _lock = BoardLock::acquire(&session.board_dir)?;

    let id = resolve_task(&session, &args.task)?;
    session.toggle_expand(id)?;
    match session.find_task(id) {
        Some(task) if task.expanded => println!("unfolded"),
        Some(_) => println!("folded"),
        None => {}
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Advisor handlers
// ---------------------------------------------------------------------------

fn cmd_advise(args: AdviseArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let session = open_session()?;
    let context = session.advice_context()?;
    let advisor = advisor_from_config(&session.config);
    let answer = advisor.ask(&context, &args.question);

    if json {
        println!("{}", serde_json::to_string_pretty(&AdviceJson { answer })?);
    } else {
        println!("{}", answer);
    }
    Ok(())
}

fn cmd_suggest(args: SuggestArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let session = open_session()?;
    let id = resolve_task(&session, &args.task)?;
    let task = session
        .find_task(id)
        .ok_or_else(|| format!("no task matches '{}'", args.task))?;
    let project_title = session.project().map(|p| p.title.clone()).unwrap_or_default();
    let hidden = session.suggestion_context(task);

    let advisor = advisor_from_config(&session.config);
    let answer = advisor.suggest_next_steps(
        &task.title,
        task.description.as_deref(),
        &hidden,
        &project_title,
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&AdviceJson { answer })?);
    } else {
        println!("{}", answer);
    }
    Ok(())
}
