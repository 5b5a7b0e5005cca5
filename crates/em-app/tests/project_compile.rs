use std::path::Path;

use em_app::{AppError, build_structure, configure_fdtd, load_simulation, summarize, validate_simulation};
use em_solver::{BoundaryCondition, Face, SolverError};

fn demo(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../demos/projects")
        .join(name)
}

#[test]
fn demos_compile() {
    for name in ["01_ground_plane_smoke.yaml", "02_patch_on_substrate.yaml"] {
        let sim = load_simulation(&demo(name)).unwrap_or_else(|e| panic!("{name}: {e}"));
        validate_simulation(&sim).unwrap_or_else(|e| panic!("{name}: {e}"));
    }
}

#[test]
fn smoke_demo_matches_reference_structure() {
    let sim = load_simulation(&demo("01_ground_plane_smoke.yaml")).unwrap();
    let compiled = build_structure(&sim).unwrap();
    let reference = em_app::reference_structure().unwrap();
    assert_eq!(compiled, reference);
    assert_eq!(
        compiled.to_xml_string().unwrap(),
        reference.to_xml_string().unwrap()
    );

    let summary = summarize(&sim);
    assert_eq!(summary.property_count, 2);
    assert_eq!(summary.box_count, 2);
    assert_eq!(summary.cell_count, 10 * 10 * 20);
}

#[test]
fn pml_tags_compile_to_pml() {
    let sim = load_simulation(&demo("02_patch_on_substrate.yaml")).unwrap();
    let csx = build_structure(&sim).unwrap();
    let fdtd = configure_fdtd(&sim, &csx).unwrap();
    let bc = fdtd.boundaries().unwrap();
    assert_eq!(bc.get(Face::XMin), BoundaryCondition::Pml { cells: 8 });
    assert_eq!(bc.get(Face::ZMin), BoundaryCondition::Pec);
}

#[test]
fn builder_checks_apply_to_projects() {
    let mut sim = load_simulation(&demo("01_ground_plane_smoke.yaml")).unwrap();
    sim.fdtd.boundaries[5] = "ABSORB".to_string();
    let err = validate_simulation(&sim).unwrap_err();
    assert!(matches!(
        err,
        AppError::Solver(SolverError::UnknownBoundaryType { .. })
    ));

    let mut sim = load_simulation(&demo("01_ground_plane_smoke.yaml")).unwrap();
    sim.fdtd.excitation.fc_hz = sim.fdtd.excitation.f0_hz;
    let err = validate_simulation(&sim).unwrap_err();
    assert!(matches!(
        err,
        AppError::Solver(SolverError::InvalidExcitation { .. })
    ));
}

#[test]
fn missing_project_is_project_error() {
    let err = load_simulation(&demo("does_not_exist.yaml")).unwrap_err();
    assert!(matches!(err, AppError::Project(_)));
}
