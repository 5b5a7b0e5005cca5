//! Project loading, saving, validation and compilation.
//!
//! Compilation goes through the structure and solver builders, so a project
//! that compiles has passed every check the builders apply.

use std::path::Path;

use em_core::hz;
use em_project::schema::{FieldDef, PropertyKindDef, SimulationDef};
use em_solver::FdtdConfig;
use em_structure::{Axis, ExcitationField, PropertyKind, Structure};
use tracing::debug;

use crate::error::AppResult;

/// Summary of a simulation for listing.
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub name: String,
    pub property_count: usize,
    pub box_count: usize,
    pub cell_count: usize,
    pub delta_unit: f64,
    pub max_timesteps: u64,
    pub f0_hz: f64,
    pub fc_hz: f64,
    pub boundaries: Vec<String>,
}

/// Load a project file; `.json` is read as JSON, anything else as YAML.
pub fn load_simulation(path: &Path) -> AppResult<SimulationDef> {
    let sim = em_project::load_path(path)?;
    debug!(path = %path.display(), name = %sim.name, "loaded project");
    Ok(sim)
}

pub fn save_simulation(path: &Path, sim: &SimulationDef) -> AppResult<()> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => em_project::save_json(path, sim)?,
        _ => em_project::save_yaml(path, sim)?,
    }
    Ok(())
}

/// File-level validation followed by a full compile.
pub fn validate_simulation(sim: &SimulationDef) -> AppResult<()> {
    em_project::validate_simulation(sim).map_err(em_project::ProjectError::from)?;
    let structure = build_structure(sim)?;
    configure_fdtd(sim, &structure)?;
    Ok(())
}

pub fn summarize(sim: &SimulationDef) -> SimulationSummary {
    let cells = |lines: &[f64]| {
        let mut sorted = lines.to_vec();
        em_core::merge_sorted_unique(&mut sorted, &[]);
        sorted.len().saturating_sub(1)
    };
    SimulationSummary {
        name: sim.name.clone(),
        property_count: sim.properties.len(),
        box_count: sim.properties.iter().map(|p| p.boxes.len()).sum(),
        cell_count: cells(&sim.grid.x) * cells(&sim.grid.y) * cells(&sim.grid.z),
        delta_unit: sim.grid.delta_unit,
        max_timesteps: sim.fdtd.max_timesteps,
        f0_hz: sim.fdtd.excitation.f0_hz,
        fc_hz: sim.fdtd.excitation.fc_hz,
        boundaries: sim.fdtd.boundaries.clone(),
    }
}

fn excitation_field(field: FieldDef) -> ExcitationField {
    match field {
        FieldDef::ESoft => ExcitationField::ESoft,
        FieldDef::EHard => ExcitationField::EHard,
        FieldDef::HSoft => ExcitationField::HSoft,
        FieldDef::HHard => ExcitationField::HHard,
    }
}

fn property_kind(kind: &PropertyKindDef) -> PropertyKind {
    match *kind {
        PropertyKindDef::Metal => PropertyKind::Metal,
        PropertyKindDef::Excitation { field, vector } => PropertyKind::Excitation {
            field: excitation_field(field),
            vector,
        },
        PropertyKindDef::Material {
            epsilon,
            mue,
            kappa,
            sigma,
        } => PropertyKind::Material {
            epsilon,
            mue,
            kappa,
            sigma,
        },
    }
}

/// Build the structure described by a project.
pub fn build_structure(sim: &SimulationDef) -> AppResult<Structure> {
    let mut csx = Structure::new();
    csx.set_unit(sim.grid.delta_unit)?;
    for (axis, lines) in [
        (Axis::X, &sim.grid.x),
        (Axis::Y, &sim.grid.y),
        (Axis::Z, &sim.grid.z),
    ] {
        csx.add_grid_lines(axis, lines)?;
    }

    for def in &sim.properties {
        let id = csx.add_property(property_kind(&def.kind), def.name.as_str())?;
        for b in &def.boxes {
            csx.add_box(id, b.start, b.stop, b.priority)?;
        }
    }
    debug!(
        name = %sim.name,
        properties = csx.properties().len(),
        boxes = csx.box_count(),
        "compiled structure"
    );
    Ok(csx)
}

/// Configure an FDTD run on `structure` from the project's run section.
pub fn configure_fdtd<'s>(sim: &SimulationDef, structure: &'s Structure) -> AppResult<FdtdConfig<'s>> {
    let fdtd_def = &sim.fdtd;
    let mut fdtd = FdtdConfig::new(fdtd_def.max_timesteps, fdtd_def.end_criterion)?;
    fdtd.bind_structure(structure)?;
    fdtd.set_excitation(hz(fdtd_def.excitation.f0_hz), hz(fdtd_def.excitation.fc_hz))?;
    fdtd.set_boundary_conditions(fdtd_def.boundaries.as_slice())?;
    Ok(fdtd)
}

/// Compile the project and write its geometry document to `path`.
pub fn write_geometry(sim: &SimulationDef, path: &Path) -> AppResult<()> {
    let csx = build_structure(sim)?;
    csx.serialize(path)?;
    Ok(())
}
