//! FDTD run configuration bound to a structure.

use std::path::Path;

use em_core::Frequency;
use em_results::{RunLimits, RunManifest, RunOutcomeRecord, compute_run_id, timestamp_now};
use em_structure::Structure;
use tracing::{debug, info, warn};

use crate::engine::{Engine, EngineJob};
use crate::output::OutputDir;
use crate::run::{RunResult, RunStatus};
use crate::simfile::simulation_document;
use crate::{
    BoundarySet, Excitation, GEOMETRY_FILE, RunParameters, SIMULATION_FILE, SolverError,
    SolverResult,
};

/// Something `run` needs that has not been provided yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Precondition {
    Structure,
    Excitation,
    BoundaryConditions,
    Grid,
}

impl Precondition {
    pub fn label(self) -> &'static str {
        match self {
            Precondition::Structure => "bound structure",
            Precondition::Excitation => "excitation",
            Precondition::BoundaryConditions => "6 boundary conditions",
            Precondition::Grid => "grid with >= 2 lines per axis",
        }
    }
}

/// Run parameters, excitation and boundaries for one structure.
///
/// The structure is borrowed, not copied, so it cannot change while the
/// configuration is alive. Single owner, no internal locking.
#[derive(Debug, Clone)]
pub struct FdtdConfig<'s> {
    params: RunParameters,
    structure: Option<&'s Structure>,
    excitation: Option<Excitation>,
    boundaries: Option<BoundarySet>,
}

impl<'s> FdtdConfig<'s> {
    pub fn new(max_timesteps: u64, end_criterion: f64) -> SolverResult<Self> {
        let params = RunParameters::new(max_timesteps, end_criterion)?;
        debug!(max_timesteps, end_criterion, "created FDTD configuration");
        Ok(Self {
            params,
            structure: None,
            excitation: None,
            boundaries: None,
        })
    }

    pub fn params(&self) -> &RunParameters {
        &self.params
    }

    pub fn structure(&self) -> Option<&'s Structure> {
        self.structure
    }

    pub fn excitation(&self) -> Option<&Excitation> {
        self.excitation.as_ref()
    }

    pub fn boundaries(&self) -> Option<&BoundarySet> {
        self.boundaries.as_ref()
    }

    /// Bind the structure this configuration will run.
    pub fn bind_structure(&mut self, structure: &'s Structure) -> SolverResult<()> {
        if self.structure.is_some() {
            return Err(SolverError::AlreadyBound);
        }
        let axes = structure.grid().underdefined_axes();
        if !axes.is_empty() {
            return Err(SolverError::MissingGrid { axes });
        }
        debug!(
            properties = structure.properties().len(),
            cells = structure.grid().cell_count(),
            "bound structure"
        );
        self.structure = Some(structure);
        Ok(())
    }

    /// Gaussian pulse; `fc >= f0` is rejected.
    pub fn set_excitation(&mut self, f0: Frequency, fc: Frequency) -> SolverResult<()> {
        let excitation = Excitation::gaussian(f0, fc)?;
        debug!(
            f0_hz = excitation.f0_hz(),
            fc_hz = excitation.fc_hz(),
            "set gaussian excitation"
        );
        self.excitation = Some(excitation);
        Ok(())
    }

    /// Six tags in face order `xmin xmax ymin ymax zmin zmax`.
    ///
    /// On error the previous boundary state is left unchanged.
    pub fn set_boundary_conditions<S: AsRef<str>>(&mut self, tags: &[S]) -> SolverResult<()> {
        let set = BoundarySet::from_tags(tags)?;
        self.set_boundaries(set);
        Ok(())
    }

    pub fn set_boundaries(&mut self, set: BoundarySet) {
        debug!(boundaries = ?set.tags(), "set boundary conditions");
        self.boundaries = Some(set);
    }

    /// Everything still needed before `run`, in a stable order.
    pub fn missing_preconditions(&self) -> Vec<Precondition> {
        let mut missing = Vec::new();
        match self.structure {
            None => missing.push(Precondition::Structure),
            Some(s) if !s.grid().is_runnable() => missing.push(Precondition::Grid),
            Some(_) => {}
        }
        if self.excitation.is_none() {
            missing.push(Precondition::Excitation);
        }
        if self.boundaries.is_none() {
            missing.push(Precondition::BoundaryConditions);
        }
        missing
    }

    fn ready(&self) -> SolverResult<(&'s Structure, &Excitation, &BoundarySet)> {
        let missing = self.missing_preconditions();
        match (self.structure, &self.excitation, &self.boundaries) {
            (Some(s), Some(e), Some(b)) if missing.is_empty() => Ok((s, e, b)),
            _ => Err(SolverError::NotConfigured { missing }),
        }
    }

    /// The full simulation document this configuration would run.
    pub fn simulation_xml(&self) -> SolverResult<String> {
        let (structure, excitation, boundaries) = self.ready()?;
        simulation_document(&self.params, excitation, boundaries, structure)
    }

    /// Content id of a run of this configuration on `engine`.
    ///
    /// Same document, solver version and engine give the same id.
    pub fn run_id(&self, engine: &dyn Engine) -> SolverResult<String> {
        let simulation = self.simulation_xml()?;
        Ok(run_key(&simulation, engine))
    }

    /// Run the engine on this configuration and block until it finishes.
    ///
    /// Preconditions are checked before anything touches the filesystem.
    /// An engine failure is reported in the returned status, not as `Err`.
    /// Anything already in `output_dir` is discarded first. With `cleanup`,
    /// the output directory is removed before returning on every path,
    /// including failures; if that removal fails the result still comes back,
    /// with `cleaned_up` unset.
    pub fn run(
        &self,
        engine: &dyn Engine,
        output_dir: &Path,
        cleanup: bool,
        verbosity: u8,
    ) -> SolverResult<RunResult> {
        let (structure, _, _) = self.ready()?;
        let simulation = self.simulation_xml()?;
        let run_id = run_key(&simulation, engine);

        let dir = OutputDir::acquire(output_dir, cleanup)?;
        let sim_path = dir.join(SIMULATION_FILE);
        std::fs::write(&sim_path, &simulation).map_err(|e| SolverError::io(&sim_path, e))?;
        structure.serialize(&dir.join(GEOMETRY_FILE))?;

        info!(
            engine = engine.name(),
            run_id = %em_results::hash::short_id(&run_id),
            output = %output_dir.display(),
            "starting run"
        );
        let job = EngineJob {
            simulation_file: &sim_path,
            output_dir: dir.path(),
            params: self.params,
            verbosity,
        };
        let status = match engine.execute(&job) {
            Ok(outcome) => {
                info!(termination = outcome.termination.label(), "run completed");
                RunStatus::Success {
                    termination: outcome.termination,
                    timesteps: outcome.timesteps,
                }
            }
            Err(e) => {
                warn!(error = %e, "engine reported failure");
                RunStatus::Failure {
                    message: e.to_string(),
                }
            }
        };

        let mut manifest = RunManifest {
            run_id: run_id.clone(),
            name: None,
            timestamp: timestamp_now(),
            engine: engine.name().to_string(),
            engine_version: engine.version(),
            solver_version: crate::VERSION.to_string(),
            limits: RunLimits {
                max_timesteps: self.params.max_timesteps(),
                end_criterion: self.params.end_criterion(),
            },
            outcome: match &status {
                RunStatus::Success {
                    termination,
                    timesteps,
                } => RunOutcomeRecord::Success {
                    termination: termination.label().to_string(),
                    timesteps: *timesteps,
                },
                RunStatus::Failure { message } => RunOutcomeRecord::Failure {
                    message: message.clone(),
                },
            },
            artifacts: Vec::new(),
        };
        manifest.artifacts = dir
            .list_artifacts()?
            .iter()
            .map(|p| p.display().to_string())
            .chain(std::iter::once(em_results::MANIFEST_FILE.to_string()))
            .collect();
        em_results::write_manifest(dir.path(), &manifest)?;

        let artifacts = dir.list_artifacts()?;
        let cleaned_up = dir.release();

        Ok(RunResult {
            run_id,
            status,
            output_dir: output_dir.to_path_buf(),
            artifacts,
            manifest,
            cleaned_up,
        })
    }
}

fn run_key(simulation: &str, engine: &dyn Engine) -> String {
    compute_run_id(simulation, &format!("{}/{}", crate::VERSION, engine.name()))
}
