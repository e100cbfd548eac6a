use serde::{Deserialize, Serialize};

use super::user::User;

/// Configuration from `trellis/config.toml`.
///
/// Written once by `tl init` and hand-edited afterwards; the user roster
/// lives here because membership is managed outside the app.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    pub board: BoardInfo,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub advisor: AdvisorConfig,
    #[serde(default)]
    pub users: Vec<User>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardInfo {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Board state file, relative to the trellis directory.
    #[serde(default = "default_state_file")]
    pub file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            file: default_state_file(),
        }
    }
}

fn default_state_file() -> String {
    "board.json".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AdvisorConfig {
    /// Shell command the advise/suggest prompts are piped to; its stdout
    /// becomes the reply. Unset means advice is unavailable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

impl BoardConfig {
    /// Config for a fresh board. `names` empty means the stock two-person
    /// roster.
    pub fn for_new_board(name: &str, names: &[String]) -> Self {
        let users = if names.is_empty() {
            vec![User::new("Alex".to_string()), User::new("Sam".to_string())]
        } else {
            names.iter().map(|n| User::new(n.clone())).collect()
        };
        BoardConfig {
            board: BoardInfo {
                name: name.to_string(),
            },
            storage: StorageConfig::default(),
            advisor: AdvisorConfig::default(),
            users,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config() {
        let config: BoardConfig = toml::from_str(
            r#"
[board]
name = "home"
"#,
        )
        .unwrap();
        assert_eq!(config.board.name, "home");
        assert_eq!(config.storage.file, "board.json");
        assert!(config.advisor.command.is_none());
        assert!(config.users.is_empty());
    }

    #[test]
    fn parses_advisor_command() {
        let config: BoardConfig = toml::from_str(
            r#"
[board]
name = "home"

[advisor]
command = "llm -m gpt-4o-mini"
"#,
        )
        .unwrap();
        assert_eq!(config.advisor.command.as_deref(), Some("llm -m gpt-4o-mini"));
    }

    #[test]
    fn parses_roster_and_storage_override() {
        let config: BoardConfig = toml::from_str(
            r##"
[board]
name = "work"

[storage]
file = "state.json"

[[users]]
id = "6a3ab5c8-6e5f-4b2b-9f3e-2d1c5f4e8a01"
name = "Alex"
color = "#7c9a92"

[[users]]
id = "0b92f7de-1083-4a6e-8a43-5a3f2a7cc102"
name = "Sam"
"##,
        )
        .unwrap();
        assert_eq!(config.storage.file, "state.json");
        assert_eq!(config.users.len(), 2);
        assert_eq!(config.users[0].name, "Alex");
        assert_eq!(config.users[0].color.as_deref(), Some("#7c9a92"));
        assert!(config.users[1].color.is_none());
    }

    #[test]
    fn new_board_defaults_to_stock_roster() {
        let config = BoardConfig::for_new_board("home", &[]);
        assert_eq!(config.users.len(), 2);
        assert_eq!(config.users[0].name, "Alex");

        let named = BoardConfig::for_new_board("home", &["Robin".to_string()]);
        assert_eq!(named.users.len(), 1);
        assert_eq!(named.users[0].name, "Robin");
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = BoardConfig::for_new_board("home", &[]);
        let text = toml::to_string_pretty(&config).unwrap();
        let back: BoardConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.board.name, "home");
        assert_eq!(back.users.len(), 2);
        assert_eq!(back.users[0].id, config.users[0].id);
    }
}
