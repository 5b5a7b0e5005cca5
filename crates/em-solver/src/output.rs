//! Scoped ownership of a run's output directory.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{SolverError, SolverResult};

/// Output directory held for the duration of one run.
///
/// The directory is emptied on acquisition, so everything listed afterwards
/// was written during this run. With `cleanup` set, it is removed again when
/// the guard is released or dropped, on every exit path.
#[derive(Debug)]
pub struct OutputDir {
    path: PathBuf,
    cleanup: bool,
    released: bool,
}

impl OutputDir {
    /// Create the directory, discarding whatever an earlier run left in it.
    pub fn acquire(path: &Path, cleanup: bool) -> SolverResult<Self> {
        if path.is_dir() {
            warn!(path = %path.display(), "clearing existing output directory");
        }
        remove(path).map_err(|e| SolverError::io(path, e))?;
        fs::create_dir_all(path).map_err(|e| SolverError::io(path, e))?;
        debug!(path = %path.display(), cleanup, "acquired output directory");
        Ok(Self {
            path: path.to_path_buf(),
            cleanup,
            released: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    /// Files below the directory, relative to it, sorted.
    pub fn list_artifacts(&self) -> SolverResult<Vec<PathBuf>> {
        let mut files = Vec::new();
        collect_files(&self.path, &self.path, &mut files)?;
        files.sort();
        Ok(files)
    }

    /// Release the directory, deleting it when cleanup was requested.
    ///
    /// Returns whether the directory was removed. A failed removal is logged
    /// and reported as `false`.
    pub fn release(mut self) -> bool {
        self.released = true;
        if !self.cleanup {
            return false;
        }
        match remove(&self.path) {
            Ok(()) => true,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to remove output directory");
                false
            }
        }
    }
}

impl Drop for OutputDir {
    fn drop(&mut self) {
        if self.cleanup
            && !self.released
            && let Err(e) = remove(&self.path)
        {
            warn!(path = %self.path.display(), error = %e, "failed to remove output directory");
        }
    }
}

fn remove(path: &Path) -> std::io::Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => {
            debug!(path = %path.display(), "removed output directory");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

fn collect_files(root: &Path, dir: &Path, out: &mut Vec<PathBuf>) -> SolverResult<()> {
    let entries = fs::read_dir(dir).map_err(|e| SolverError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| SolverError::io(dir, e))?;
        let path = entry.path();
        if path.is_dir() {
            collect_files(root, &path, out)?;
        } else if let Ok(rel) = path.strip_prefix(root) {
            out.push(rel.to_path_buf());
        }
    }
    Ok(())
}
