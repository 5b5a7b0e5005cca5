use em_project::*;
use proptest::prelude::*;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_temp_path(prefix: &str, ext: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    std::env::temp_dir().join(format!("{}_{}_{}.{}", prefix, std::process::id(), nanos, ext))
}

fn sample() -> SimulationDef {
    SimulationDef {
        version: LATEST_VERSION,
        name: "sample".to_string(),
        grid: GridDef {
            delta_unit: 1e-3,
            x: vec![0.0, 5.0, 10.0],
            y: vec![0.0, 5.0, 10.0],
            z: vec![0.0, 2.5, 10.0],
        },
        properties: vec![
            PropertyDef {
                name: "gnd".to_string(),
                kind: PropertyKindDef::Metal,
                boxes: vec![BoxDef {
                    start: [0.0, 0.0, 0.0],
                    stop: [10.0, 10.0, 0.0],
                    priority: 10,
                }],
            },
            PropertyDef {
                name: "sub".to_string(),
                kind: PropertyKindDef::Material {
                    epsilon: 3.66,
                    mue: 1.0,
                    kappa: 0.0,
                    sigma: 0.0,
                },
                boxes: vec![],
            },
            PropertyDef {
                name: "port".to_string(),
                kind: PropertyKindDef::Excitation {
                    field: FieldDef::HSoft,
                    vector: [1.0, 0.0, 0.0],
                },
                boxes: vec![BoxDef {
                    start: [2.0, 2.0, 2.5],
                    stop: [3.0, 3.0, 2.5],
                    priority: -1,
                }],
            },
        ],
        fdtd: FdtdDef {
            max_timesteps: 500,
            end_criterion: 1e-5,
            excitation: ExcitationDef {
                f0_hz: 2e9,
                fc_hz: 1.5e9,
            },
            boundaries: ["PEC", "PEC", "PMC", "PMC", "MUR", "PML_8"]
                .into_iter()
                .map(String::from)
                .collect(),
        },
    }
}

#[test]
fn roundtrip_yaml() {
    let sim = sample();
    let path = unique_temp_path("em_project_roundtrip", "yaml");
    save_yaml(&path, &sim).unwrap();
    let loaded = load_yaml(&path).unwrap();
    assert_eq!(sim, loaded);
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn roundtrip_json_by_extension() {
    let sim = sample();
    let path = unique_temp_path("em_project_roundtrip", "json");
    save_json(&path, &sim).unwrap();
    let loaded = load_path(&path).unwrap();
    assert_eq!(sim, loaded);
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn invalid_project_is_not_saved() {
    let mut sim = sample();
    sim.fdtd.boundaries.truncate(5);
    let path = unique_temp_path("em_project_invalid", "yaml");
    let err = save_yaml(&path, &sim).unwrap_err();
    assert!(matches!(err, ProjectError::Validation(_)));
    assert!(!path.exists());
}

#[test]
fn missing_file_reports_path() {
    let path = unique_temp_path("em_project_missing", "yaml");
    match load_yaml(&path) {
        Err(ProjectError::Io { path: p, .. }) => assert_eq!(p, path),
        other => panic!("expected Io error, got {other:?}"),
    }
}

#[test]
fn defaults_fill_optional_fields() {
    let yaml = r#"
version: 1
name: defaults
grid:
  x: [0, 1]
  y: [0, 1]
  z: [0, 1]
properties:
  - name: slab
    kind:
      type: Material
      epsilon: 2.2
  - name: src
    kind:
      type: Excitation
      vector: [0, 1, 0]
    boxes:
      - start: [0, 0, 0]
        stop: [1, 1, 0]
fdtd:
  max_timesteps: 10
  end_criterion: 0.01
  excitation: { f0_hz: 1.0e9, fc_hz: 5.0e8 }
  boundaries: [PEC, PEC, PEC, PEC, PEC, PEC]
"#;
    let sim: SimulationDef = serde_yaml::from_str(yaml).unwrap();
    validate_simulation(&sim).unwrap();
    assert_eq!(sim.grid.delta_unit, 1.0);
    assert_eq!(
        sim.properties[0].kind,
        PropertyKindDef::Material {
            epsilon: 2.2,
            mue: 1.0,
            kappa: 0.0,
            sigma: 0.0
        }
    );
    assert!(matches!(
        sim.properties[1].kind,
        PropertyKindDef::Excitation {
            field: FieldDef::ESoft,
            ..
        }
    ));
    assert_eq!(sim.properties[1].boxes[0].priority, 0);
}

proptest! {
    #[test]
    fn yaml_preserves_grid_lines(lines in prop::collection::vec(-1.0e3f64..1.0e3, 2..16)) {
        let mut sim = sample();
        sim.grid.x = lines;
        let text = serde_yaml::to_string(&sim).unwrap();
        let back: SimulationDef = serde_yaml::from_str(&text).unwrap();
        prop_assert_eq!(back.grid.x, sim.grid.x);
    }
}
