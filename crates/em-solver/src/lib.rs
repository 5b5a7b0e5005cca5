//! em-solver: FDTD run configuration and the execution contract around an
//! external field solver engine.
//!
//! The numerical work happens in an [`Engine`]; this crate validates the run
//! setup, writes the simulation file, drives the engine and owns the output
//! directory lifecycle.
//!
//! # Example
//!
//! ```
//! use em_core::ghz;
//! use em_solver::FdtdConfig;
//! use em_structure::{Axis, Structure};
//!
//! let mut csx = Structure::new();
//! for axis in Axis::ALL {
//!     csx.add_grid_lines(axis, &[0.0, 10.0, 20.0]).unwrap();
//! }
//!
//! let mut fdtd = FdtdConfig::new(100, 1e-4).unwrap();
//! fdtd.bind_structure(&csx).unwrap();
//! fdtd.set_excitation(ghz(1.5), ghz(1.0)).unwrap();
//! fdtd.set_boundary_conditions(&["PEC", "PEC", "PEC", "PEC", "MUR", "MUR"]).unwrap();
//! assert!(fdtd.missing_preconditions().is_empty());
//! ```

pub mod boundary;
pub mod config;
pub mod engine;
pub mod error;
pub mod excitation;
pub mod output;
pub mod params;
pub mod run;
pub mod simfile;

pub use boundary::{BoundaryCondition, BoundarySet, Face};
pub use config::{FdtdConfig, Precondition};
pub use engine::{
    DryRunEngine, Engine, EngineError, EngineJob, EngineOutcome, ProcessEngine, Termination,
};
pub use error::{SolverError, SolverResult};
pub use excitation::Excitation;
pub use output::OutputDir;
pub use params::RunParameters;
pub use run::{RunResult, RunStatus};
pub use simfile::SimulationSettings;

/// Library version reported for diagnostics and mixed into run ids.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// File names written into every run directory.
pub const SIMULATION_FILE: &str = "simulation.xml";
pub const GEOMETRY_FILE: &str = "geometry.xml";
