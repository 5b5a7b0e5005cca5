//! Outcome of one `run` call.

use std::path::PathBuf;

use em_results::RunManifest;

use crate::{SolverError, SolverResult, Termination};

#[derive(Clone, Debug, PartialEq)]
pub enum RunStatus {
    /// The engine completed; non-convergence within the step budget is still
    /// a success and shows up as `Termination::MaxTimesteps`.
    Success {
        termination: Termination,
        timesteps: Option<u64>,
    },
    Failure {
        message: String,
    },
}

#[derive(Clone, Debug)]
pub struct RunResult {
    pub run_id: String,
    pub status: RunStatus,
    pub output_dir: PathBuf,
    /// Files produced, relative to `output_dir`, captured before any cleanup.
    pub artifacts: Vec<PathBuf>,
    pub manifest: RunManifest,
    /// Output directory was deleted after the run.
    pub cleaned_up: bool,
}

impl RunResult {
    pub fn is_success(&self) -> bool {
        matches!(self.status, RunStatus::Success { .. })
    }

    /// Turn an engine failure into `SolverError::EngineFailure`.
    pub fn into_result(self) -> SolverResult<Self> {
        match &self.status {
            RunStatus::Success { .. } => Ok(self),
            RunStatus::Failure { message } => Err(SolverError::EngineFailure {
                message: message.clone(),
            }),
        }
    }
}
