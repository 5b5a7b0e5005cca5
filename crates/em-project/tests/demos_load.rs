use std::path::Path;

#[test]
fn demo_projects_load_and_validate() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/projects");
    let demos = ["01_ground_plane_smoke.yaml", "02_patch_on_substrate.yaml"];

    for name in demos {
        let path = root.join(name);
        let sim = em_project::load_yaml(&path)
            .unwrap_or_else(|e| panic!("Failed to load {}: {}", name, e));
        em_project::validate_simulation(&sim)
            .unwrap_or_else(|e| panic!("Failed to validate {}: {}", name, e));
        assert_eq!(sim.fdtd.boundaries.len(), 6);
    }
}

#[test]
fn smoke_demo_matches_reference_setup() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/projects/01_ground_plane_smoke.yaml");
    let sim = em_project::load_yaml(&path).unwrap();

    assert_eq!(sim.grid.x.len(), 11);
    assert_eq!(sim.grid.z.len(), 21);
    assert_eq!(sim.properties.len(), 2);
    assert_eq!(sim.properties[0].name, "ground_plane");
    assert_eq!(sim.properties[0].boxes[0].priority, 10);
    assert_eq!(
        sim.properties[1].kind,
        em_project::PropertyKindDef::Excitation {
            field: em_project::FieldDef::ESoft,
            vector: [0.0, 0.0, 1.0],
        }
    );
    assert_eq!(sim.fdtd.max_timesteps, 200);
    assert_eq!(sim.fdtd.excitation.f0_hz, 1.5e9);
}
