use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::model::config::BoardConfig;
use crate::model::state::AppState;

/// Error type for board I/O operations
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("not a trellis board: no trellis/ directory found")]
    NotABoard,
    #[error("already a trellis board: {path} exists")]
    AlreadyABoard { path: PathBuf },
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config.toml: {0}")]
    ConfigParseError(#[from] toml::de::Error),
    #[error("could not serialize config.toml: {0}")]
    ConfigSerializeError(#[from] toml::ser::Error),
    #[error("could not serialize board state: {0}")]
    StateSerializeError(#[from] serde_json::Error),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Discover the board by walking up from the given directory, looking
/// for a `trellis/` subdirectory holding a config.
pub fn discover_board(start: &Path) -> Result<PathBuf, BoardError> {
    let mut current = start.to_path_buf();
    loop {
        let board_dir = current.join("trellis");
        if board_dir.is_dir() && board_dir.join("config.toml").exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(BoardError::NotABoard);
        }
    }
}

/// Path of the JSON file the full board state lives in. The file name is
/// configurable; everything sits inside the board directory.
pub fn state_path(board_dir: &Path, config: &BoardConfig) -> PathBuf {
    board_dir.join(&config.storage.file)
}

/// Read and parse `config.toml` from the board directory.
pub fn load_config(board_dir: &Path) -> Result<BoardConfig, BoardError> {
    let config_path = board_dir.join("config.toml");
    let config_text = fs::read_to_string(&config_path).map_err(|e| BoardError::ReadError {
        path: config_path.clone(),
        source: e,
    })?;
    Ok(toml::from_str(&config_text)?)
}

/// Write `config.toml` back to the board directory.
pub fn save_config(board_dir: &Path, config: &BoardConfig) -> Result<(), BoardError> {
    let config_path = board_dir.join("config.toml");
    let content = toml::to_string_pretty(config)?;
    atomic_write(&config_path, content.as_bytes()).map_err(|e| BoardError::WriteError {
        path: config_path,
        source: e,
    })
}

/// Load the persisted board state. `None` means absent or unreadable;
/// callers fall back to a freshly seeded state rather than failing, so a
/// corrupt state file degrades to a reset, not a crash.
pub fn load_state(board_dir: &Path, config: &BoardConfig) -> Option<AppState> {
    let content = fs::read_to_string(state_path(board_dir, config)).ok()?;
    serde_json::from_str(&content).ok()
}

/// Persist the entire board state. Always a full rewrite, done via a
/// temp file so a crash mid-write never leaves a truncated board behind.
pub fn save_state(
    board_dir: &Path,
    config: &BoardConfig,
    state: &AppState,
) -> Result<(), BoardError> {
    let path = state_path(board_dir, config);
    let content = serde_json::to_string_pretty(state)?;
    atomic_write(&path, content.as_bytes()).map_err(|e| BoardError::WriteError { path, source: e })
}

/// Create the `trellis/` directory under `root` with a fresh config and
/// a seeded starter board. Refuses to clobber an existing one.
pub fn init_board(root: &Path, name: &str, user_names: &[String]) -> Result<PathBuf, BoardError> {
    let board_dir = root.join("trellis");
    if board_dir.join("config.toml").exists() {
        return Err(BoardError::AlreadyABoard { path: board_dir });
    }
    fs::create_dir_all(&board_dir)?;
    let config = BoardConfig::for_new_board(name, user_names);
    save_config(&board_dir, &config)?;
    let state = AppState::seed(&config.users);
    save_state(&board_dir, &config, &state)?;
    Ok(board_dir)
}

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
