//! End-to-end installation check.
//!
//! Four stages run in order: library versions, a reference geometry, an
//! FDTD setup on it, and a short run with cleanup. The first failing stage
//! aborts the check and is named in the error.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use em_core::hz;
use em_solver::{Engine, FdtdConfig, RunResult};
use em_structure::{Axis, ExcitationField, Structure, StructureResult};
use tracing::{info, warn};

use crate::error::{AppError, AppResult};

/// Geometry file written next to the run, as a user script would.
pub const GEOMETRY_FILE: &str = "test.xml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmokeStage {
    Versions,
    Geometry,
    Setup,
    Run,
}

impl SmokeStage {
    pub const ALL: [SmokeStage; 4] = [
        SmokeStage::Versions,
        SmokeStage::Geometry,
        SmokeStage::Setup,
        SmokeStage::Run,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SmokeStage::Versions => "versions",
            SmokeStage::Geometry => "geometry",
            SmokeStage::Setup => "setup",
            SmokeStage::Run => "run",
        }
    }
}

impl fmt::Display for SmokeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("smoke test failed in {stage} stage")]
pub struct SmokeError {
    pub stage: SmokeStage,
    #[source]
    pub source: AppError,
}

#[derive(Debug, Clone)]
pub enum SmokeEvent {
    Started(SmokeStage),
    Passed { stage: SmokeStage, detail: String },
    Failed { stage: SmokeStage, message: String },
}

/// Versions reported by the libraries and the selected engine.
#[derive(Debug, Clone)]
pub struct Versions {
    pub structure: &'static str,
    pub solver: &'static str,
    pub app: &'static str,
    pub engine: String,
    pub engine_version: Option<String>,
}

impl fmt::Display for Versions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "em-structure {}, em-solver {}, em-app {}, engine {} {}",
            self.structure,
            self.solver,
            self.app,
            self.engine,
            self.engine_version.as_deref().unwrap_or("(version unknown)")
        )
    }
}

pub fn versions(engine: &dyn Engine) -> Versions {
    Versions {
        structure: em_structure::VERSION,
        solver: em_solver::VERSION,
        app: env!("CARGO_PKG_VERSION"),
        engine: engine.name().to_string(),
        engine_version: engine.version(),
    }
}

pub struct SmokeOptions<'a> {
    pub engine: &'a dyn Engine,
    /// Parent of the temporary run directory; the system temp dir if `None`.
    pub work_dir: Option<PathBuf>,
    pub verbosity: u8,
}

#[derive(Debug)]
pub struct SmokeReport {
    pub versions: Versions,
    pub property_count: usize,
    pub run: RunResult,
}

/// Ground plane plus a vertical soft-E port, on a 5 mm grid over
/// 50 x 50 x 100 mm.
pub fn reference_structure() -> StructureResult<Structure> {
    let mut csx = Structure::new();
    csx.set_unit(1e-3)?;

    let xy: Vec<f64> = (0..=50).step_by(5).map(f64::from).collect();
    let z: Vec<f64> = (0..=100).step_by(5).map(f64::from).collect();
    csx.add_grid_lines(Axis::X, &xy)?;
    csx.add_grid_lines(Axis::Y, &xy)?;
    csx.add_grid_lines(Axis::Z, &z)?;

    let metal = csx.add_metal("ground_plane")?;
    csx.add_box(metal, [0.0, 0.0, 0.0], [50.0, 50.0, 0.0], 10)?;

    let port = csx.add_excitation("port", ExcitationField::ESoft, [0.0, 0.0, 1.0])?;
    csx.add_box(port, [20.0, 20.0, 5.0], [30.0, 30.0, 5.0], 5)?;
    Ok(csx)
}

struct Reporter<'a> {
    cb: Option<&'a mut dyn FnMut(SmokeEvent)>,
}

impl Reporter<'_> {
    fn emit(&mut self, event: SmokeEvent) {
        if let Some(cb) = self.cb.as_deref_mut() {
            cb(event);
        }
    }

    fn stage<T>(
        &mut self,
        stage: SmokeStage,
        f: impl FnOnce() -> AppResult<(T, String)>,
    ) -> Result<T, SmokeError> {
        self.emit(SmokeEvent::Started(stage));
        match f() {
            Ok((value, detail)) => {
                info!(%stage, %detail, "smoke stage passed");
                self.emit(SmokeEvent::Passed { stage, detail });
                Ok(value)
            }
            Err(source) => {
                warn!(%stage, error = %source, "smoke stage failed");
                self.emit(SmokeEvent::Failed {
                    stage,
                    message: source.to_string(),
                });
                Err(SmokeError { stage, source })
            }
        }
    }
}

/// Run the four stages in order, stopping at the first failure.
pub fn run_smoke(
    options: &SmokeOptions<'_>,
    progress: Option<&mut dyn FnMut(SmokeEvent)>,
) -> Result<SmokeReport, SmokeError> {
    let mut reporter = Reporter { cb: progress };

    let versions = reporter.stage(SmokeStage::Versions, || {
        let v = versions(options.engine);
        if [v.structure, v.solver, v.app].iter().any(|s| s.is_empty()) {
            return Err(AppError::Check("a library reported an empty version".to_string()));
        }
        let detail = v.to_string();
        Ok((v, detail))
    })?;

    let csx = reporter.stage(SmokeStage::Geometry, || {
        let csx = reference_structure()?;
        let count = csx.list_properties().len();
        if count < 2 {
            return Err(AppError::Check(format!(
                "expected at least 2 properties, found {count}"
            )));
        }
        Ok((csx, format!("{count} properties")))
    })?;

    let fdtd = reporter.stage(SmokeStage::Setup, || {
        let fdtd = setup(&csx)?;
        let missing = fdtd.missing_preconditions();
        if !missing.is_empty() {
            return Err(AppError::Check(format!("still unconfigured: {missing:?}")));
        }
        Ok((fdtd, "200 timesteps, gaussian 1.5 GHz / 1 GHz".to_string()))
    })?;

    let run = reporter.stage(SmokeStage::Run, || {
        let sim_path = unique_run_dir(options.work_dir.as_deref());
        let result = run_once(&fdtd, &csx, &sim_path, options);
        if sim_path.exists()
            && let Err(e) = std::fs::remove_dir_all(&sim_path)
        {
            warn!(path = %sim_path.display(), error = %e, "could not remove smoke directory");
        }
        let result = result?;
        let detail = format!("{} artifacts, directory removed", result.artifacts.len());
        Ok((result, detail))
    })?;

    Ok(SmokeReport {
        versions,
        property_count: csx.list_properties().len(),
        run,
    })
}

fn setup(csx: &Structure) -> AppResult<FdtdConfig<'_>> {
    let mut fdtd = FdtdConfig::new(200, 1e-3)?;
    fdtd.bind_structure(csx)?;
    fdtd.set_excitation(hz(1.5e9), hz(1e9))?;
    fdtd.set_boundary_conditions(&["PEC", "PEC", "PEC", "PEC", "MUR", "MUR"])?;
    Ok(fdtd)
}

fn run_once(
    fdtd: &FdtdConfig<'_>,
    csx: &Structure,
    sim_path: &Path,
    options: &SmokeOptions<'_>,
) -> AppResult<RunResult> {
    std::fs::create_dir_all(sim_path).map_err(|source| AppError::Io {
        path: sim_path.to_path_buf(),
        source,
    })?;
    let geometry = sim_path.join(GEOMETRY_FILE);
    csx.serialize(&geometry)?;
    if Structure::load(&geometry)? != *csx {
        return Err(AppError::Check(format!(
            "{} does not read back as the reference structure",
            geometry.display()
        )));
    }

    // The run starts from an empty directory and writes its own geometry.
    let result = fdtd
        .run(options.engine, sim_path, true, options.verbosity)?
        .into_result()?;
    if sim_path.exists() {
        return Err(AppError::CleanupFailed {
            path: sim_path.to_path_buf(),
        });
    }
    Ok(result)
}

fn unique_run_dir(parent: Option<&Path>) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let parent = parent.map(Path::to_path_buf).unwrap_or_else(std::env::temp_dir);
    parent.join(format!("emflow_smoke_{}_{}", std::process::id(), nanos))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_structure_matches_layout() {
        let csx = reference_structure().unwrap();
        assert_eq!(csx.grid().line_count(Axis::X), 11);
        assert_eq!(csx.grid().line_count(Axis::Y), 11);
        assert_eq!(csx.grid().line_count(Axis::Z), 21);
        assert_eq!(csx.grid().delta_unit(), 1e-3);

        let names: Vec<&str> = csx.properties().iter().map(|p| p.name()).collect();
        assert_eq!(names, ["ground_plane", "port"]);
        assert_eq!(csx.box_count(), 2);
    }

    #[test]
    fn setup_is_complete() {
        let csx = reference_structure().unwrap();
        let fdtd = setup(&csx).unwrap();
        assert!(fdtd.missing_preconditions().is_empty());
        assert_eq!(fdtd.params().max_timesteps(), 200);
    }

    #[test]
    fn stage_labels_are_ordered() {
        let labels: Vec<&str> = SmokeStage::ALL.iter().map(|s| s.label()).collect();
        assert_eq!(labels, ["versions", "geometry", "setup", "run"]);
    }
}
