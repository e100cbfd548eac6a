use std::io::Write;
use std::process::{Command, Stdio};

use crate::model::config::BoardConfig;

/// Strategy source behind the advise and suggest commands.
///
/// Implementations never raise: a broken or unreachable backend folds
/// into the returned string, so callers always have something to show
/// and board state is never at risk from a failed call.
pub trait Advisor {
    /// Answer a free-form question about the active project.
    fn ask(&self, context_summary: &str, question: &str) -> String;

    /// Propose concrete next steps for one task. `hidden_context` is
    /// extra board detail included in the prompt but not shown to the
    /// user (existing subtask titles, mostly).
    fn suggest_next_steps(
        &self,
        title: &str,
        description: Option<&str>,
        hidden_context: &str,
        project_title: &str,
    ) -> String;
}

const UNAVAILABLE: &str =
    "advice is unavailable: no advisor command is configured (set [advisor] command in trellis/config.toml)";

/// Advisor used when no external command is configured: every call
/// reports the same unavailability notice.
pub struct OfflineAdvisor;

impl Advisor for OfflineAdvisor {
    fn ask(&self, _context_summary: &str, _question: &str) -> String {
        UNAVAILABLE.to_string()
    }

    fn suggest_next_steps(
        &self,
        _title: &str,
        _description: Option<&str>,
        _hidden_context: &str,
        _project_title: &str,
    ) -> String {
        UNAVAILABLE.to_string()
    }
}

/// Advisor backed by a user-configured shell command. The prompt is
/// piped to the command's stdin; whatever it prints becomes the reply.
/// This keeps the choice of model, wrapper CLI, or plain script in the
/// user's hands.
pub struct CommandAdvisor {
    command: String,
}

impl CommandAdvisor {
    pub fn new(command: String) -> Self {
        CommandAdvisor { command }
    }

    fn run(&self, prompt: &str) -> Option<String> {
        let mut child = Command::new("sh")
            .args(["-c", &self.command])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .ok()?;
        if let Some(stdin) = child.stdin.as_mut() {
            stdin.write_all(prompt.as_bytes()).ok()?;
        }
        let output = child.wait_with_output().ok()?;
        if !output.status.success() {
            return None;
        }
        let reply = String::from_utf8(output.stdout).ok()?;
        let reply = reply.trim();
        if reply.is_empty() {
            None
        } else {
            Some(reply.to_string())
        }
    }
}

impl Advisor for CommandAdvisor {
    fn ask(&self, context_summary: &str, question: &str) -> String {
        let prompt = format!(
            "You are helping someone plan work on their personal project board.\n\n\
             {context_summary}\n\nQuestion: {question}\n\n\
             Give brief, practical advice.\n"
        );
        self.run(&prompt)
            .unwrap_or_else(|| "advice is unavailable: the advisor command failed".to_string())
    }

    fn suggest_next_steps(
        &self,
        title: &str,
        description: Option<&str>,
        hidden_context: &str,
        project_title: &str,
    ) -> String {
        let mut prompt = format!(
            "Suggest two or three concrete next steps for this task, as a short list.\n\n\
             Project: {project_title}\nTask: {title}\n"
        );
        if let Some(description) = description {
            prompt.push_str(&format!("Description: {description}\n"));
        }
        if !hidden_context.is_empty() {
            prompt.push_str(&format!("{hidden_context}\n"));
        }
        self.run(&prompt)
            .unwrap_or_else(|| "advice is unavailable: the advisor command failed".to_string())
    }
}

/// Pick the advisor the board is configured for.
pub fn advisor_from_config(config: &BoardConfig) -> Box<dyn Advisor> {
    match &config.advisor.command {
        Some(command) if !command.trim().is_empty() => {
            Box::new(CommandAdvisor::new(command.clone()))
        }
        _ => Box::new(OfflineAdvisor),
    }
}
