//! Project schema definitions.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationDef {
    pub version: u32,
    pub name: String,
    pub grid: GridDef,
    #[serde(default)]
    pub properties: Vec<PropertyDef>,
    pub fdtd: FdtdDef,
}

/// Mesh lines in drawing units, scaled to meters by `delta_unit`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GridDef {
    #[serde(default = "default_delta_unit")]
    pub delta_unit: f64,
    #[serde(default)]
    pub x: Vec<f64>,
    #[serde(default)]
    pub y: Vec<f64>,
    #[serde(default)]
    pub z: Vec<f64>,
}

fn default_delta_unit() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertyDef {
    pub name: String,
    pub kind: PropertyKindDef,
    #[serde(default)]
    pub boxes: Vec<BoxDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum PropertyKindDef {
    Metal,
    Excitation {
        #[serde(default)]
        field: FieldDef,
        vector: [f64; 3],
    },
    Material {
        epsilon: f64,
        #[serde(default = "default_unity")]
        mue: f64,
        #[serde(default)]
        kappa: f64,
        #[serde(default)]
        sigma: f64,
    },
}

impl PropertyKindDef {
    pub fn label(&self) -> &'static str {
        match self {
            PropertyKindDef::Metal => "Metal",
            PropertyKindDef::Excitation { .. } => "Excitation",
            PropertyKindDef::Material { .. } => "Material",
        }
    }
}

fn default_unity() -> f64 {
    1.0
}

/// Which field an excitation drives, and how.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FieldDef {
    #[default]
    ESoft,
    EHard,
    HSoft,
    HHard,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoxDef {
    pub start: [f64; 3],
    pub stop: [f64; 3],
    #[serde(default)]
    pub priority: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FdtdDef {
    pub max_timesteps: u64,
    pub end_criterion: f64,
    pub excitation: ExcitationDef,
    /// Six boundary tags: xmin, xmax, ymin, ymax, zmin, zmax.
    pub boundaries: Vec<String>,
}

/// Gaussian pulse parameters in Hz.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExcitationDef {
    pub f0_hz: f64,
    pub fc_hz: f64,
}
