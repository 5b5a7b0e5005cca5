//! Run execution and caching service.
//!
//! Kept runs live in the project's run store, keyed by run id. A successful
//! kept run is reused instead of executed again when caching is on.

use std::path::{Path, PathBuf};
use std::time::Instant;

use em_results::{RunManifest, RunStore, write_manifest};
use em_solver::{DryRunEngine, Engine, ProcessEngine};
use tracing::info;

use crate::error::AppResult;
use crate::progress::{RunProgressEvent, RunStage};
use crate::project_service;

/// Which engine executes the run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EngineChoice {
    /// Validates the simulation file and writes a report; no field solve.
    #[default]
    DryRun,
    /// The openEMS executable; `None` means `$OPENEMS_BIN` or `openEMS` on `PATH`.
    OpenEms { program: Option<PathBuf> },
}

impl EngineChoice {
    pub fn build(&self) -> Box<dyn Engine> {
        match self {
            EngineChoice::DryRun => Box::new(DryRunEngine),
            EngineChoice::OpenEms { program: Some(p) } => Box::new(ProcessEngine::new(p.clone())),
            EngineChoice::OpenEms { program: None } => Box::new(ProcessEngine::from_env()),
        }
    }
}

/// Options for running simulations.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub engine: EngineChoice,
    pub use_cache: bool,
    /// Keep the run directory in the store; otherwise it is removed after the run.
    pub keep_output: bool,
    pub verbosity: u8,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            engine: EngineChoice::default(),
            use_cache: true,
            keep_output: true,
            verbosity: 0,
        }
    }
}

/// Request to execute a run.
pub struct RunRequest<'a> {
    pub project_path: &'a Path,
    pub options: RunOptions,
}

/// Response from a run execution.
#[derive(Debug, Clone)]
pub struct RunResponse {
    pub run_id: String,
    pub manifest: RunManifest,
    /// Run directory, if it was kept.
    pub output_dir: Option<PathBuf>,
    pub artifacts: Vec<PathBuf>,
    pub loaded_from_cache: bool,
    pub elapsed_wall_s: f64,
}

impl RunResponse {
    pub fn is_success(&self) -> bool {
        self.manifest.outcome.is_success()
    }
}

fn emit(
    progress_cb: &mut Option<&mut dyn FnMut(RunProgressEvent)>,
    stage: RunStage,
    started: Instant,
    message: Option<String>,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        cb(RunProgressEvent::stage(
            stage,
            started.elapsed().as_secs_f64(),
            message,
        ));
    }
}

/// Execute or load a run based on request.
pub fn ensure_run(request: &RunRequest) -> AppResult<RunResponse> {
    ensure_run_with_progress(request, None)
}

/// Execute or load a run and stream progress events.
///
/// An engine failure is not an error here: the response carries the failed
/// manifest and `is_success()` is false.
pub fn ensure_run_with_progress(
    request: &RunRequest,
    mut progress_cb: Option<&mut dyn FnMut(RunProgressEvent)>,
) -> AppResult<RunResponse> {
    let started = Instant::now();
    let options = &request.options;

    emit(&mut progress_cb, RunStage::LoadingProject, started, None);
    let sim = project_service::load_simulation(request.project_path)?;

    emit(&mut progress_cb, RunStage::CompilingStructure, started, None);
    let structure = project_service::build_structure(&sim)?;

    emit(&mut progress_cb, RunStage::Configuring, started, None);
    let fdtd = project_service::configure_fdtd(&sim, &structure)?;
    let engine = options.engine.build();
    let run_id = fdtd.run_id(engine.as_ref())?;

    let store = RunStore::for_project(request.project_path)?;
    let run_dir = store.run_dir(&run_id);

    if options.use_cache && options.keep_output {
        emit(&mut progress_cb, RunStage::CheckingCache, started, None);
        if store.has_run(&run_id) {
            let manifest = store.load(&run_id)?;
            if manifest.outcome.is_success() {
                emit(
                    &mut progress_cb,
                    RunStage::LoadingCachedResult,
                    started,
                    Some(em_results::hash::short_id(&run_id).to_string()),
                );
                info!(run_id = %run_id, "reusing cached run");
                let artifacts = manifest.artifacts.iter().map(PathBuf::from).collect();
                emit(&mut progress_cb, RunStage::Completed, started, None);
                return Ok(RunResponse {
                    run_id,
                    manifest,
                    output_dir: Some(run_dir),
                    artifacts,
                    loaded_from_cache: true,
                    elapsed_wall_s: started.elapsed().as_secs_f64(),
                });
            }
        }
    }

    // Stale or failed leftovers would otherwise mix with the new artifacts.
    store.delete_run(&run_id)?;

    emit(
        &mut progress_cb,
        RunStage::Running,
        started,
        Some(engine.name().to_string()),
    );
    let result = fdtd.run(
        engine.as_ref(),
        &run_dir,
        !options.keep_output,
        options.verbosity,
    )?;

    let mut manifest = result.manifest;
    manifest.name = Some(sim.name.clone());
    let output_dir = if result.cleaned_up {
        None
    } else {
        write_manifest(&result.output_dir, &manifest)?;
        Some(result.output_dir)
    };

    emit(&mut progress_cb, RunStage::Completed, started, None);
    Ok(RunResponse {
        run_id: result.run_id,
        manifest,
        output_dir,
        artifacts: result.artifacts,
        loaded_from_cache: false,
        elapsed_wall_s: started.elapsed().as_secs_f64(),
    })
}

/// Kept runs of a project, oldest first.
pub fn list_runs(project_path: &Path) -> AppResult<Vec<RunManifest>> {
    let store = RunStore::for_project(project_path)?;
    Ok(store.list_runs()?)
}

/// Manifest of a kept run.
pub fn load_run(project_path: &Path, run_id: &str) -> AppResult<RunManifest> {
    let store = RunStore::for_project(project_path)?;
    Ok(store.load(run_id)?)
}
