//! Single-writer guard for a journal tree.

use fs2::FileExt;
use std::fmt;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

pub const LOCK_FILE_NAME: &str = ".caljournal.lock";

/// Holds an exclusive advisory lock until dropped.
#[derive(Debug)]
pub struct RunLock {
    _file: File,
}

impl RunLock {
    /// Lock `<dir>/.caljournal.lock`, failing at once if another run holds it.
    pub fn acquire(dir: &Path) -> Result<Self, LockError> {
        fs::create_dir_all(dir).map_err(LockError::Io)?;
        let path = dir.join(LOCK_FILE_NAME);
        let file = File::create(&path).map_err(LockError::Io)?;

        file.try_lock_exclusive()
            .map_err(|_| LockError::Held(path.clone()))?;

        tracing::debug!("Acquired lock {}", path.display());
        Ok(Self { _file: file })
    }
}

#[derive(Debug)]
pub enum LockError {
    Io(io::Error),
    Held(PathBuf),
}

impl fmt::Display for LockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockError::Io(e) => write!(f, "Failed to create lock file: {}", e),
            LockError::Held(path) => write!(
                f,
                "Another caljournal run is already writing here.\n\
                 If you believe this is an error, remove: {}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for LockError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LockError::Io(e) => Some(e),
            LockError::Held(_) => None,
        }
    }
}
