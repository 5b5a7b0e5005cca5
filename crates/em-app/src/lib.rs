//! Shared application service layer for emflow.
//!
//! Used by the CLI: loads and compiles project files into a structure plus
//! run configuration, executes and caches runs, and drives the end-to-end
//! smoke test.

pub mod error;
pub mod progress;
pub mod project_service;
pub mod run_service;
pub mod smoke;

pub use error::{AppError, AppResult};
pub use progress::{RunProgressEvent, RunStage};
pub use project_service::{
    SimulationSummary, build_structure, configure_fdtd, load_simulation, save_simulation,
    summarize, validate_simulation, write_geometry,
};
pub use run_service::{
    EngineChoice, RunOptions, RunRequest, RunResponse, ensure_run, ensure_run_with_progress,
    list_runs, load_run,
};
pub use smoke::{
    SmokeError, SmokeEvent, SmokeOptions, SmokeReport, SmokeStage, Versions, reference_structure,
    run_smoke, versions,
};
