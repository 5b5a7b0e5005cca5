//! The seam to the external field solver.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use em_core::to_m;
use em_structure::{Axis, Structure};
use thiserror::Error;
use tracing::{debug, info};

use crate::{RunParameters, SimulationSettings};

/// How a completed run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    /// Field energy decayed below the end criterion.
    EndCriterion,
    /// Step budget exhausted before the end criterion was met.
    MaxTimesteps,
    /// The engine did not say.
    NotReported,
}

impl Termination {
    pub fn label(self) -> &'static str {
        match self {
            Termination::EndCriterion => "end criterion",
            Termination::MaxTimesteps => "max timesteps",
            Termination::NotReported => "not reported",
        }
    }
}

/// Everything an engine needs for one blocking run.
#[derive(Clone, Debug)]
pub struct EngineJob<'a> {
    pub simulation_file: &'a Path,
    pub output_dir: &'a Path,
    pub params: RunParameters,
    /// 0 is silent; higher values only increase diagnostic output.
    pub verbosity: u8,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EngineOutcome {
    pub termination: Termination,
    pub timesteps: Option<u64>,
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("engine exited with {status}: {stderr}")]
    Exited { status: String, stderr: String },

    #[error("engine rejected input: {0}")]
    InvalidInput(String),

    #[error("engine I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// An FDTD engine that consumes a simulation file and writes its artifacts
/// into the job's output directory.
///
/// Implementations block until the computation finishes. Any internal
/// parallelism is their own business.
pub trait Engine {
    fn name(&self) -> &str;

    /// Version string, if known without running anything.
    fn version(&self) -> Option<String> {
        None
    }

    fn execute(&self, job: &EngineJob<'_>) -> Result<EngineOutcome, EngineError>;
}

/// Runs the openEMS executable as a child process.
#[derive(Clone, Debug)]
pub struct ProcessEngine {
    program: PathBuf,
    extra_args: Vec<String>,
}

impl ProcessEngine {
    pub const DEFAULT_PROGRAM: &'static str = "openEMS";
    pub const LOG_FILE: &'static str = "engine.log";

    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
        }
    }

    /// Program from `OPENEMS_BIN`, falling back to `openEMS` on `PATH`.
    pub fn from_env() -> Self {
        let program = std::env::var_os("OPENEMS_BIN")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_PROGRAM));
        Self::new(program)
    }

    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn verbosity_flag(verbosity: u8) -> Option<&'static str> {
        match verbosity {
            0 => None,
            1 => Some("-v"),
            2 => Some("-vv"),
            _ => Some("-vvv"),
        }
    }
}

impl Default for ProcessEngine {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PROGRAM)
    }
}

impl Engine for ProcessEngine {
    fn name(&self) -> &str {
        "openEMS"
    }

    fn execute(&self, job: &EngineJob<'_>) -> Result<EngineOutcome, EngineError> {
        // the child runs inside the output directory
        let simulation_file = std::path::absolute(job.simulation_file)?;
        let mut cmd = Command::new(&self.program);
        cmd.arg(&simulation_file)
            .args(Self::verbosity_flag(job.verbosity))
            .args(&self.extra_args)
            .current_dir(job.output_dir)
            .stdin(Stdio::null());

        info!(program = %self.program.display(), file = %job.simulation_file.display(), "launching engine");
        let output = cmd.output().map_err(|source| EngineError::Launch {
            program: self.program.display().to_string(),
            source,
        })?;

        let mut log = Vec::with_capacity(output.stdout.len() + output.stderr.len());
        log.extend_from_slice(&output.stdout);
        log.extend_from_slice(&output.stderr);
        std::fs::write(job.output_dir.join(Self::LOG_FILE), &log)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::Exited {
                status: output.status.to_string(),
                stderr: tail(&stderr, 20),
            });
        }
        debug!(bytes = log.len(), "engine finished");

        Ok(EngineOutcome {
            termination: Termination::NotReported,
            timesteps: None,
        })
    }
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().collect();
    let start = all.len().saturating_sub(lines);
    all[start..].join("\n")
}

/// In-process stand-in that reads the simulation file back, checks it is
/// runnable and writes a report instead of computing fields.
#[derive(Clone, Copy, Debug, Default)]
pub struct DryRunEngine;

impl DryRunEngine {
    pub const REPORT_FILE: &'static str = "dryrun.log";
}

impl Engine for DryRunEngine {
    fn name(&self) -> &str {
        "dry-run"
    }

    fn version(&self) -> Option<String> {
        Some(crate::VERSION.to_string())
    }

    fn execute(&self, job: &EngineJob<'_>) -> Result<EngineOutcome, EngineError> {
        let invalid = |e: &dyn std::fmt::Display| EngineError::InvalidInput(e.to_string());
        let settings = SimulationSettings::load(job.simulation_file).map_err(|e| invalid(&e))?;
        let structure = Structure::load(job.simulation_file).map_err(|e| invalid(&e))?;

        let grid = structure.grid();
        if !grid.is_runnable() {
            return Err(EngineError::InvalidInput(format!(
                "grid is underdefined on {:?}",
                grid.underdefined_axes()
            )));
        }

        let report = dry_run_report(&settings, &structure);
        if job.verbosity > 0 {
            info!("{}", report.trim_end());
        }
        std::fs::write(job.output_dir.join(Self::REPORT_FILE), report)?;

        Ok(EngineOutcome {
            termination: Termination::NotReported,
            timesteps: None,
        })
    }
}

fn dry_run_report(settings: &SimulationSettings, structure: &Structure) -> String {
    let grid = structure.grid();
    let mut report = String::new();
    let _ = writeln!(report, "engine: dry-run {}", crate::VERSION);
    let _ = writeln!(
        report,
        "timesteps: {} end criterion: {} ({:.1} dB)",
        settings.params.max_timesteps(),
        settings.params.end_criterion(),
        settings.params.end_criterion_db()
    );
    let _ = writeln!(
        report,
        "excitation: gaussian f0={} Hz fc={} Hz f_max={} Hz",
        settings.excitation.f0_hz(),
        settings.excitation.fc_hz(),
        settings.excitation.f_max_hz()
    );
    let _ = writeln!(report, "boundaries: {}", settings.boundaries.tags().join(" "));
    let _ = writeln!(
        report,
        "grid: {} cells, delta unit {} m",
        grid.cell_count(),
        grid.delta_unit()
    );

    let lambda_min = to_m(settings.excitation.min_wavelength());
    for axis in Axis::ALL {
        let widest = grid
            .lines(axis)
            .windows(2)
            .map(|w| (w[1] - w[0]) * grid.delta_unit())
            .fold(0.0_f64, f64::max);
        let _ = writeln!(
            report,
            "  {axis}: {} lines, widest cell {widest} m (lambda_min/{:.1})",
            grid.line_count(axis),
            lambda_min / widest
        );
    }
    for property in structure.properties() {
        let _ = writeln!(
            report,
            "property {} '{}': {} boxes",
            property.kind().element_name(),
            property.name(),
            property.boxes().len()
        );
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_flags() {
        assert_eq!(ProcessEngine::verbosity_flag(0), None);
        assert_eq!(ProcessEngine::verbosity_flag(2), Some("-vv"));
        assert_eq!(ProcessEngine::verbosity_flag(9), Some("-vvv"));
    }

    #[test]
    fn tail_keeps_last_lines() {
        assert_eq!(tail("a\nb\nc", 2), "b\nc");
        assert_eq!(tail("a", 5), "a");
    }

    #[test]
    fn missing_program_is_launch_error() {
        let dir = std::env::temp_dir();
        let file = dir.join("does-not-matter.xml");
        let engine = ProcessEngine::new("/nonexistent/emflow-openEMS-binary");
        let job = EngineJob {
            simulation_file: &file,
            output_dir: &dir,
            params: RunParameters::new(10, 1e-3).unwrap(),
            verbosity: 0,
        };
        let err = engine.execute(&job).unwrap_err();
        assert!(matches!(err, EngineError::Launch { .. }));
    }
}
