//! Run lifecycle: preconditions, artifacts and output directory cleanup.

use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use em_core::ghz;
use em_results::load_manifest;
use em_solver::*;
use em_structure::{Axis, ExcitationField, Structure};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    dir.push(format!("{}_{}_{}", prefix, std::process::id(), nanos));
    dir
}

/// Grid 0/10/20 on every axis in mm, one metal and one excitation box.
fn reference_structure() -> Structure {
    let mut csx = Structure::new();
    csx.set_unit(1e-3).unwrap();
    for axis in Axis::ALL {
        csx.add_grid_lines(axis, &[0.0, 10.0, 20.0]).unwrap();
    }
    let metal = csx.add_metal("plate").unwrap();
    csx.add_box(metal, [0.0, 0.0, 0.0], [20.0, 20.0, 0.0], 10)
        .unwrap();
    let port = csx
        .add_excitation("port", ExcitationField::ESoft, [0.0, 0.0, 1.0])
        .unwrap();
    csx.add_box(port, [5.0, 5.0, 10.0], [15.0, 15.0, 10.0], 5)
        .unwrap();
    csx
}

fn configured(csx: &Structure) -> FdtdConfig<'_> {
    let mut fdtd = FdtdConfig::new(100, 1e-4).unwrap();
    fdtd.bind_structure(csx).unwrap();
    fdtd.set_excitation(ghz(1.5), ghz(1.0)).unwrap();
    fdtd.set_boundary_conditions(&["PEC", "PEC", "PEC", "PEC", "MUR", "MUR"])
        .unwrap();
    fdtd
}

/// Writes a field dump and reports that the step budget ran out.
#[derive(Default)]
struct RecordingEngine {
    calls: Cell<usize>,
}

impl Engine for RecordingEngine {
    fn name(&self) -> &str {
        "recording"
    }

    fn execute(&self, job: &EngineJob<'_>) -> Result<EngineOutcome, EngineError> {
        self.calls.set(self.calls.get() + 1);
        assert!(job.simulation_file.exists());
        fs::create_dir_all(job.output_dir.join("fields"))?;
        fs::write(job.output_dir.join("fields").join("Et.h5"), b"fake")?;
        Ok(EngineOutcome {
            termination: Termination::MaxTimesteps,
            timesteps: Some(job.params.max_timesteps()),
        })
    }
}

struct FailingEngine;

impl Engine for FailingEngine {
    fn name(&self) -> &str {
        "failing"
    }

    fn execute(&self, job: &EngineJob<'_>) -> Result<EngineOutcome, EngineError> {
        fs::write(job.output_dir.join("partial.log"), b"diverged")?;
        Err(EngineError::Exited {
            status: "exit status: 3".to_string(),
            stderr: "operator setup failed".to_string(),
        })
    }
}

fn assert_no_files_written(dir: &Path) {
    assert!(!dir.exists(), "{} should not exist", dir.display());
}

#[test]
fn end_to_end_run_produces_artifacts() {
    let csx = reference_structure();
    let fdtd = configured(&csx);
    let out = unique_temp_dir("em_solver_e2e");

    let result = fdtd.run(&DryRunEngine, &out, false, 0).unwrap();

    assert!(result.is_success());
    assert!(!result.cleaned_up);
    assert!(out.is_dir());
    assert!(fs::read_dir(&out).unwrap().next().is_some());
    for name in [SIMULATION_FILE, GEOMETRY_FILE, DryRunEngine::REPORT_FILE, "manifest.json"] {
        assert!(
            result.artifacts.iter().any(|p| p == Path::new(name)),
            "missing {name}"
        );
    }

    let manifest = load_manifest(&out).unwrap();
    assert_eq!(manifest.run_id, result.run_id);
    assert_eq!(manifest.engine, "dry-run");
    assert_eq!(manifest.limits.max_timesteps, 100);
    assert!(manifest.outcome.is_success());

    // The written geometry reads back as the same structure.
    let reloaded = Structure::load(&out.join(GEOMETRY_FILE)).unwrap();
    assert_eq!(reloaded, csx);
    let from_sim = Structure::load(&out.join(SIMULATION_FILE)).unwrap();
    assert_eq!(from_sim, csx);

    fs::remove_dir_all(&out).unwrap();
}

#[test]
fn cleanup_removes_directory_after_success() {
    let csx = reference_structure();
    let fdtd = configured(&csx);
    let out = unique_temp_dir("em_solver_cleanup_ok");
    let engine = RecordingEngine::default();

    let result = fdtd.run(&engine, &out, true, 0).unwrap();

    assert_eq!(engine.calls.get(), 1);
    assert!(result.cleaned_up);
    assert!(!out.exists());
    // Artifacts were captured before the directory went away.
    assert!(
        result
            .artifacts
            .iter()
            .any(|p| p == &Path::new("fields").join("Et.h5"))
    );
    assert_eq!(
        result.status,
        RunStatus::Success {
            termination: Termination::MaxTimesteps,
            timesteps: Some(100),
        }
    );
}

#[test]
fn cleanup_removes_directory_after_engine_failure() {
    let csx = reference_structure();
    let fdtd = configured(&csx);
    let out = unique_temp_dir("em_solver_cleanup_fail");

    let result = fdtd.run(&FailingEngine, &out, true, 0).unwrap();

    assert!(!result.is_success());
    assert!(!out.exists());
    assert!(!result.manifest.outcome.is_success());
    match result.clone().into_result() {
        Err(SolverError::EngineFailure { message }) => {
            assert!(message.contains("operator setup failed"))
        }
        other => panic!("expected engine failure, got {other:?}"),
    }
}

#[test]
fn failure_without_cleanup_keeps_diagnostics() {
    let csx = reference_structure();
    let fdtd = configured(&csx);
    let out = unique_temp_dir("em_solver_fail_keep");

    let result = fdtd.run(&FailingEngine, &out, false, 0).unwrap();

    assert!(!result.is_success());
    assert!(out.join("partial.log").exists());
    assert!(load_manifest(&out).is_ok());
    fs::remove_dir_all(&out).unwrap();
}

#[test]
fn rerun_into_kept_directory_lists_only_new_files() {
    let csx = reference_structure();
    let fdtd = configured(&csx);
    let out = unique_temp_dir("em_solver_rerun");

    fdtd.run(&FailingEngine, &out, false, 0).unwrap();
    assert!(out.join("partial.log").exists());

    let result = fdtd.run(&DryRunEngine, &out, false, 0).unwrap();
    assert!(result.is_success());
    assert!(!out.join("partial.log").exists());
    assert!(!result.artifacts.iter().any(|p| p == Path::new("partial.log")));
    let manifest = load_manifest(&out).unwrap();
    assert!(!manifest.artifacts.iter().any(|a| a == "partial.log"));
    assert!(manifest.artifacts.iter().any(|a| a == SIMULATION_FILE));
    fs::remove_dir_all(&out).unwrap();
}

#[test]
fn run_without_boundaries_is_not_configured_and_writes_nothing() {
    let csx = reference_structure();
    let mut fdtd = FdtdConfig::new(100, 1e-4).unwrap();
    fdtd.bind_structure(&csx).unwrap();
    fdtd.set_excitation(ghz(1.5), ghz(1.0)).unwrap();

    let out = unique_temp_dir("em_solver_unconfigured");
    let engine = RecordingEngine::default();
    let err = fdtd.run(&engine, &out, false, 0).unwrap_err();

    match err {
        SolverError::NotConfigured { missing } => {
            assert_eq!(missing, vec![Precondition::BoundaryConditions])
        }
        other => panic!("expected NotConfigured, got {other}"),
    }
    assert_eq!(engine.calls.get(), 0);
    assert_no_files_written(&out);
}

#[test]
fn five_boundaries_then_run_fails_fast() {
    let csx = reference_structure();
    let mut fdtd = FdtdConfig::new(100, 1e-4).unwrap();
    fdtd.bind_structure(&csx).unwrap();
    fdtd.set_excitation(ghz(1.5), ghz(1.0)).unwrap();

    let err = fdtd
        .set_boundary_conditions(&["PEC", "PEC", "PEC", "PEC", "MUR"])
        .unwrap_err();
    assert!(matches!(err, SolverError::InvalidBoundaryCount { count: 5 }));

    let out = unique_temp_dir("em_solver_five_bc");
    let err = fdtd.run(&DryRunEngine, &out, true, 0).unwrap_err();
    assert!(matches!(err, SolverError::NotConfigured { .. }));
    assert_no_files_written(&out);
}

#[test]
fn unknown_boundary_tag_is_rejected() {
    let mut fdtd = FdtdConfig::new(100, 1e-4).unwrap();
    let err = fdtd
        .set_boundary_conditions(&["PEC", "PEC", "PEC", "PEC", "MUR", "OPEN"])
        .unwrap_err();
    assert!(matches!(err, SolverError::UnknownBoundaryType { ref tag } if tag == "OPEN"));
    assert!(fdtd.boundaries().is_none());
}

#[test]
fn unwritable_output_dir_is_io_error() {
    let base = unique_temp_dir("em_solver_blocked");
    fs::create_dir_all(&base).unwrap();
    let blocker = base.join("file");
    fs::write(&blocker, b"not a directory").unwrap();

    let csx = reference_structure();
    let fdtd = configured(&csx);
    let err = fdtd
        .run(&DryRunEngine, &blocker.join("out"), true, 0)
        .unwrap_err();
    assert!(matches!(err, SolverError::Io { .. }));

    fs::remove_dir_all(&base).unwrap();
}

#[test]
fn run_id_is_stable_for_identical_setups() {
    let csx = reference_structure();
    let fdtd = configured(&csx);
    let a = fdtd
        .run(&DryRunEngine, &unique_temp_dir("em_solver_id_a"), true, 0)
        .unwrap();
    let b = fdtd
        .run(&DryRunEngine, &unique_temp_dir("em_solver_id_b"), true, 0)
        .unwrap();
    assert_eq!(a.run_id, b.run_id);
    assert_eq!(fdtd.run_id(&DryRunEngine).unwrap(), a.run_id);
    assert_ne!(fdtd.run_id(&RecordingEngine::default()).unwrap(), a.run_id);

    let mut other = FdtdConfig::new(101, 1e-4).unwrap();
    other.bind_structure(&csx).unwrap();
    other.set_excitation(ghz(1.5), ghz(1.0)).unwrap();
    other.set_boundaries(BoundarySet::uniform(BoundaryCondition::Pec));
    let c = other
        .run(&DryRunEngine, &unique_temp_dir("em_solver_id_c"), true, 0)
        .unwrap();
    assert_ne!(a.run_id, c.run_id);
}

#[test]
fn simulation_settings_read_back_from_run_file() {
    let csx = reference_structure();
    let fdtd = configured(&csx);
    let out = unique_temp_dir("em_solver_settings");
    fdtd.run(&DryRunEngine, &out, false, 1).unwrap();

    let settings = SimulationSettings::load(&out.join(SIMULATION_FILE)).unwrap();
    assert_eq!(&settings.params, fdtd.params());
    assert_eq!(Some(&settings.excitation), fdtd.excitation());
    assert_eq!(Some(&settings.boundaries), fdtd.boundaries());
    assert_eq!(settings.absorbing_faces(), vec![Face::ZMin, Face::ZMax]);

    fs::remove_dir_all(&out).unwrap();
}
