//! Error types for solver configuration and runs.

use std::path::PathBuf;

use em_structure::{Axis, StructureError};
use thiserror::Error;

use crate::config::Precondition;

/// Errors raised by configuration calls and by `run`.
///
/// Everything except `EngineFailure` is a validation error reported at the
/// call that violated the precondition.
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Invalid parameter {what} = {value} ({reason})")]
    InvalidParameter {
        what: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("A structure is already bound to this configuration")]
    AlreadyBound,

    #[error("Grid needs at least 2 lines on axes: {}", join_axes(.axes))]
    MissingGrid { axes: Vec<Axis> },

    #[error("Invalid excitation: {reason}")]
    InvalidExcitation { reason: String },

    #[error("Expected 6 boundary conditions, got {count}")]
    InvalidBoundaryCount { count: usize },

    #[error("Unknown boundary condition type: '{tag}'")]
    UnknownBoundaryType { tag: String },

    #[error("Solver not configured, missing: {}", join_missing(.missing))]
    NotConfigured { missing: Vec<Precondition> },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Engine failure: {message}")]
    EngineFailure { message: String },

    #[error("Malformed simulation file: {0}")]
    Parse(String),

    #[error("Structure error: {0}")]
    Structure(#[from] StructureError),

    #[error("Results error: {0}")]
    Results(#[from] em_results::ResultsError),
}

pub type SolverResult<T> = Result<T, SolverError>;

impl SolverError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SolverError::Io {
            path: path.into(),
            source,
        }
    }
}

fn join_axes(axes: &[Axis]) -> String {
    axes.iter()
        .map(|a| a.label())
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_missing(missing: &[Precondition]) -> String {
    missing
        .iter()
        .map(|p| p.label())
        .collect::<Vec<_>>()
        .join(", ")
}
