use std::io;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

use tempfile::TempDir;
use tracing::{debug, warn};

use crate::error::StoreResult;

/// How a [`WorkDir`] is torn down.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Teardown {
    /// Delete the directory before returning.
    #[default]
    Blocking,
    /// Delete the directory on a background thread.
    Background,
    /// Leave the directory on disk.
    Keep,
}

/// Outcome of [`WorkDir::close`].
#[derive(Debug)]
pub enum Cleanup {
    Done,
    Kept(PathBuf),
    Pending(JoinHandle<io::Result<()>>),
}

impl Cleanup {
    /// Wait for a background deletion to finish.
    pub fn wait(self) -> io::Result<()> {
        match self {
            Self::Done | Self::Kept(_) => Ok(()),
            Self::Pending(handle) => handle
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("cleanup thread panicked"))),
        }
    }
}

/// Scratch directory holding an expanded export and its property store.
///
/// `close` consumes the directory, so it is torn down at most once and can
/// never be reused afterwards. Dropping without closing deletes it inline.
pub struct WorkDir {
    dir: TempDir,
}

impl WorkDir {
    /// Create a fresh directory under `parent`, or under the system
    /// temporary directory.
    pub fn create(parent: Option<&Path>) -> StoreResult<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("cxi-");
        let dir = match parent {
            Some(parent) => {
                std::fs::create_dir_all(parent)?;
                builder.tempdir_in(parent)?
            }
            None => builder.tempdir()?,
        };
        debug!(path = %dir.path().display(), "created work directory");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Tear the directory down.
    pub fn close(self, mode: Teardown) -> StoreResult<Cleanup> {
        match mode {
            Teardown::Blocking => {
                self.dir.close()?;
                Ok(Cleanup::Done)
            }
            Teardown::Background => {
                let dir = self.dir;
                let handle = thread::spawn(move || {
                    let path = dir.path().to_path_buf();
                    let result = dir.close();
                    if let Err(e) = &result {
                        warn!(path = %path.display(), error = %e, "background cleanup failed");
                    }
                    result
                });
                Ok(Cleanup::Pending(handle))
            }
            Teardown::Keep => {
                let path = self.dir.keep();
                debug!(path = %path.display(), "keeping work directory");
                Ok(Cleanup::Kept(path))
            }
        }
    }
}

impl std::fmt::Debug for WorkDir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkDir").field("path", &self.path()).finish()
    }
}
