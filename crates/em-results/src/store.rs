//! Manifest I/O and run directory storage.

use std::fs;
use std::path::{Path, PathBuf};

use crate::types::RunManifest;
use crate::{ResultsError, ResultsResult};

pub const MANIFEST_FILE: &str = "manifest.json";

/// Write `manifest.json` into an existing run directory.
pub fn write_manifest(dir: &Path, manifest: &RunManifest) -> ResultsResult<PathBuf> {
    let path = dir.join(MANIFEST_FILE);
    let json = serde_json::to_string_pretty(manifest)?;
    fs::write(&path, json)?;
    Ok(path)
}

pub fn load_manifest(dir: &Path) -> ResultsResult<RunManifest> {
    let path = dir.join(MANIFEST_FILE);
    if !path.exists() {
        return Err(ResultsError::RunNotFound {
            run_id: dir.display().to_string(),
        });
    }
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Directory of kept runs, one sub-directory per run id.
#[derive(Clone, Debug)]
pub struct RunStore {
    root_dir: PathBuf,
}

impl RunStore {
    pub fn new(root_dir: PathBuf) -> ResultsResult<Self> {
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self { root_dir })
    }

    /// Store next to a project file: `<project dir>/.emflow/runs`.
    pub fn for_project(project_path: &Path) -> ResultsResult<Self> {
        let project_dir = project_path
            .parent()
            .ok_or_else(|| ResultsError::InvalidPath {
                message: "project path has no parent directory".to_string(),
            })?;
        Self::new(project_dir.join(".emflow").join("runs"))
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Directory a run with this id lives in (not created).
    pub fn run_dir(&self, run_id: &str) -> PathBuf {
        self.root_dir.join(crate::hash::short_id(run_id))
    }

    pub fn has_run(&self, run_id: &str) -> bool {
        self.run_dir(run_id).join(MANIFEST_FILE).exists()
    }

    pub fn load(&self, run_id: &str) -> ResultsResult<RunManifest> {
        let dir = self.run_dir(run_id);
        load_manifest(&dir).map_err(|e| match e {
            ResultsError::RunNotFound { .. } => ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            },
            other => other,
        })
    }

    /// Manifests of all runs, oldest first.
    pub fn list_runs(&self) -> ResultsResult<Vec<RunManifest>> {
        let mut runs = Vec::new();
        if !self.root_dir.exists() {
            return Ok(runs);
        }

        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if entry.path().is_dir()
                && let Ok(manifest) = load_manifest(&entry.path())
            {
                runs.push(manifest);
            }
        }
        runs.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.run_id.cmp(&b.run_id))
        });
        Ok(runs)
    }

    pub fn delete_run(&self, run_id: &str) -> ResultsResult<()> {
        let run_dir = self.run_dir(run_id);
        if run_dir.exists() {
            fs::remove_dir_all(run_dir)?;
        }
        Ok(())
    }
}
