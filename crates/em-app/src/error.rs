//! Error types for the em-app service layer.

use std::path::PathBuf;

/// Application error wrapping the backend crates' errors.
///
/// Backend errors are transparent so their own `source()` chain stays
/// intact for front ends that print it.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Project(#[from] em_project::ProjectError),

    #[error(transparent)]
    Structure(#[from] em_structure::StructureError),

    #[error(transparent)]
    Solver(#[from] em_solver::SolverError),

    #[error(transparent)]
    Results(#[from] em_results::ResultsError),

    #[error("Check failed: {0}")]
    Check(String),

    #[error("Output directory {} still exists after cleanup", path.display())]
    CleanupFailed { path: PathBuf },

    #[error("I/O error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for em-app operations.
pub type AppResult<T> = Result<T, AppError>;
