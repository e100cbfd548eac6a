use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Advisory file lock serializing writes to the board.
///
/// Commands run load-mutate-save against one JSON file; the lock keeps
/// two trellis processes from interleaving that cycle. Uses
/// platform-native flock on Unix.
pub struct BoardLock {
    _file: File,
    path: PathBuf,
}

/// Error type for lock operations
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not create lock file at {path}: {source}")]
    CreateError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not lock {path}: another trellis process may be writing")]
    Busy { path: PathBuf },
}

impl BoardLock {
    /// Acquire the board lock, waiting up to 5 seconds.
    pub fn acquire(board_dir: &Path) -> Result<Self, LockError> {
        Self::acquire_with_timeout(board_dir, Duration::from_secs(5))
    }

    /// Acquire the board lock, waiting up to `timeout` for a concurrent
    /// holder to finish.
    pub fn acquire_with_timeout(board_dir: &Path, timeout: Duration) -> Result<Self, LockError> {
        let lock_path = board_dir.join(".lock");
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| LockError::CreateError {
                path: lock_path.clone(),
                source: e,
            })?;

        let start = Instant::now();
        loop {
            match try_lock(&file) {
                Ok(()) => {
                    return Ok(BoardLock {
                        _file: file,
                        path: lock_path,
                    });
                }
                Err(_) if start.elapsed() < timeout => {
                    std::thread::sleep(Duration::from_millis(10));
                }
                Err(_) => {
                    return Err(LockError::Busy { path: lock_path });
                }
            }
        }
    }
}

impl Drop for BoardLock {
    fn drop(&mut self) {
        // flock is released when the file closes; the file itself is
        // just tidiness
        let _ = fs::remove_file(&self.path);
    }
}

/// Try to take an exclusive flock on the file (non-blocking)
#[cfg(unix)]
fn try_lock(file: &File) -> Result<(), std::io::Error> {
    use std::os::unix::io::AsRawFd;
    let fd = file.as_raw_fd();
    let result = unsafe { libc::flock(fd, libc::LOCK_EX | libc::LOCK_NB) };
    if result == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn try_lock(_file: &File) -> Result<(), std::io::Error> {
    // No flock off Unix; locking stays advisory-in-name-only there
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_acquire_and_release() {
        let tmp = TempDir::new().unwrap();
        let board_dir = tmp.path().join("trellis");
        fs::create_dir_all(&board_dir).unwrap();

        let lock = BoardLock::acquire(&board_dir);
        assert!(lock.is_ok());
        drop(lock);

        let again = BoardLock::acquire(&board_dir);
        assert!(again.is_ok());
    }

    #[test]
    fn test_contention_times_out() {
        let tmp = TempDir::new().unwrap();
        let board_dir = tmp.path().join("trellis");
        fs::create_dir_all(&board_dir).unwrap();

        let _held = BoardLock::acquire(&board_dir).unwrap();
        let second = BoardLock::acquire_with_timeout(&board_dir, Duration::from_millis(50));
        assert!(second.is_err());
    }
}
