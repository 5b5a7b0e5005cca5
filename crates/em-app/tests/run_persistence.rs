use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use em_app::{
    EngineChoice, RunOptions, RunProgressEvent, RunRequest, RunStage, ensure_run,
    ensure_run_with_progress, list_runs, load_run,
};

/// Copy the smoke demo into a fresh directory so its run store is private.
fn project_copy(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("{}_{}_{}", prefix, std::process::id(), nanos));
    std::fs::create_dir_all(&dir).unwrap();
    let src = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../demos/projects/01_ground_plane_smoke.yaml");
    let dst = dir.join("smoke.yaml");
    std::fs::copy(src, &dst).unwrap();
    dst
}

#[test]
fn kept_run_persists_and_is_reused() {
    let project = project_copy("em_app_persist");
    let request = RunRequest {
        project_path: &project,
        options: RunOptions::default(),
    };

    let first = ensure_run(&request).unwrap();
    assert!(first.is_success());
    assert!(!first.loaded_from_cache);
    let dir = first.output_dir.clone().unwrap();
    assert!(dir.join("simulation.xml").exists());
    assert_eq!(first.manifest.name.as_deref(), Some("ground_plane_smoke"));

    let runs = list_runs(&project).unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].run_id, first.run_id);
    assert_eq!(load_run(&project, &first.run_id).unwrap().engine, "dry-run");

    let mut events: Vec<RunProgressEvent> = Vec::new();
    let second = ensure_run_with_progress(&request, Some(&mut |e| events.push(e))).unwrap();
    assert!(second.loaded_from_cache);
    assert_eq!(second.run_id, first.run_id);
    assert!(events.iter().any(|e| e.stage == RunStage::LoadingCachedResult));
    assert!(!events.iter().any(|e| e.stage == RunStage::Running));

    std::fs::remove_dir_all(project.parent().unwrap()).unwrap();
}

#[test]
fn discarded_run_leaves_no_directory() {
    let project = project_copy("em_app_discard");
    let request = RunRequest {
        project_path: &project,
        options: RunOptions {
            keep_output: false,
            ..RunOptions::default()
        },
    };

    let response = ensure_run(&request).unwrap();
    assert!(response.is_success());
    assert!(response.output_dir.is_none());
    assert!(!response.artifacts.is_empty());
    assert!(list_runs(&project).unwrap().is_empty());

    std::fs::remove_dir_all(project.parent().unwrap()).unwrap();
}

#[test]
fn missing_engine_binary_is_a_failed_run() {
    let project = project_copy("em_app_nobin");
    let request = RunRequest {
        project_path: &project,
        options: RunOptions {
            engine: EngineChoice::OpenEms {
                program: Some(PathBuf::from("/nonexistent/emflow/openEMS")),
            },
            ..RunOptions::default()
        },
    };

    let response = ensure_run(&request).unwrap();
    assert!(!response.is_success());
    assert!(!response.loaded_from_cache);

    // A failed run is never served from the cache.
    let again = ensure_run(&request).unwrap();
    assert!(!again.loaded_from_cache);

    std::fs::remove_dir_all(project.parent().unwrap()).unwrap();
}
