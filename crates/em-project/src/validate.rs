//! Project validation logic.
//!
//! Checks what can be decided from the file alone. Boundary tag spelling and
//! excitation physics are left to the solver builders, which reject them
//! with their own errors when the project is compiled.

use crate::schema::{BoxDef, FdtdDef, GridDef, PropertyDef, PropertyKindDef, SimulationDef};
use std::collections::HashSet;

pub const LATEST_VERSION: u32 = 1;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate name: {name} in {context}")]
    DuplicateName { name: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: impl Into<String>, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

pub fn validate_simulation(sim: &SimulationDef) -> Result<(), ValidationError> {
    if sim.version == 0 || sim.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: sim.version,
        });
    }
    if sim.name.trim().is_empty() {
        return Err(invalid("name", "\"\"", "must not be empty"));
    }

    validate_grid(&sim.grid)?;

    let mut names = HashSet::new();
    for property in &sim.properties {
        if !names.insert(property.name.as_str()) {
            return Err(ValidationError::DuplicateName {
                name: property.name.clone(),
                context: "properties".to_string(),
            });
        }
        validate_property(property)?;
    }

    validate_fdtd(&sim.fdtd)
}

fn validate_grid(grid: &GridDef) -> Result<(), ValidationError> {
    if !(grid.delta_unit.is_finite() && grid.delta_unit > 0.0) {
        return Err(invalid("grid.delta_unit", grid.delta_unit, "must be finite and > 0"));
    }
    for (axis, lines) in [("x", &grid.x), ("y", &grid.y), ("z", &grid.z)] {
        if let Some(v) = lines.iter().find(|v| !v.is_finite()) {
            return Err(invalid(format!("grid.{axis}"), v, "lines must be finite"));
        }
        let distinct: HashSet<u64> = lines.iter().map(|v| (*v + 0.0).to_bits()).collect();
        if distinct.len() < 2 {
            return Err(invalid(
                format!("grid.{axis}"),
                lines.len(),
                "needs at least two distinct lines",
            ));
        }
    }
    Ok(())
}

fn validate_property(property: &PropertyDef) -> Result<(), ValidationError> {
    let name = &property.name;
    if name.trim().is_empty() {
        return Err(invalid("properties[].name", "\"\"", "must not be empty"));
    }

    match &property.kind {
        PropertyKindDef::Metal => {}
        PropertyKindDef::Excitation { vector, .. } => {
            if vector.iter().any(|v| !v.is_finite()) {
                return Err(invalid(
                    format!("{name}.vector"),
                    format!("{vector:?}"),
                    "components must be finite",
                ));
            }
            if vector.iter().all(|v| *v == 0.0) {
                return Err(invalid(
                    format!("{name}.vector"),
                    format!("{vector:?}"),
                    "excites nothing",
                ));
            }
        }
        PropertyKindDef::Material {
            epsilon,
            mue,
            kappa,
            sigma,
        } => {
            for (label, v) in [("epsilon", *epsilon), ("mue", *mue)] {
                if !(v.is_finite() && v > 0.0) {
                    return Err(invalid(format!("{name}.{label}"), v, "must be finite and > 0"));
                }
            }
            for (label, v) in [("kappa", *kappa), ("sigma", *sigma)] {
                if !(v.is_finite() && v >= 0.0) {
                    return Err(invalid(format!("{name}.{label}"), v, "must be finite and >= 0"));
                }
            }
        }
    }

    for (index, b) in property.boxes.iter().enumerate() {
        validate_box(name, index, b)?;
    }
    Ok(())
}

fn validate_box(name: &str, index: usize, b: &BoxDef) -> Result<(), ValidationError> {
    if b.start.iter().chain(b.stop.iter()).any(|v| !v.is_finite()) {
        return Err(invalid(
            format!("{name}.boxes[{index}]"),
            format!("{:?} -> {:?}", b.start, b.stop),
            "corners must be finite",
        ));
    }
    Ok(())
}

fn validate_fdtd(fdtd: &FdtdDef) -> Result<(), ValidationError> {
    if fdtd.max_timesteps == 0 {
        return Err(invalid("fdtd.max_timesteps", 0, "must be > 0"));
    }
    let end = fdtd.end_criterion;
    if !(end.is_finite() && end > 0.0 && end < 1.0) {
        return Err(invalid("fdtd.end_criterion", end, "must lie in (0, 1)"));
    }

    let exc = &fdtd.excitation;
    for (label, v) in [("f0_hz", exc.f0_hz), ("fc_hz", exc.fc_hz)] {
        if !(v.is_finite() && v > 0.0) {
            return Err(invalid(format!("fdtd.excitation.{label}"), v, "must be finite and > 0"));
        }
    }

    if fdtd.boundaries.len() != 6 {
        return Err(invalid(
            "fdtd.boundaries",
            fdtd.boundaries.len(),
            "expected six tags (xmin xmax ymin ymax zmin zmax)",
        ));
    }
    if fdtd.boundaries.iter().any(|t| t.trim().is_empty()) {
        return Err(invalid("fdtd.boundaries", "\"\"", "tags must not be empty"));
    }
    Ok(())
}
