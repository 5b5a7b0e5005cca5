//! Outer-face boundary conditions.

use std::fmt;
use std::str::FromStr;

use crate::{SolverError, SolverResult};

/// Default layer count when PML is requested by its numeric tag.
pub const DEFAULT_PML_CELLS: u32 = 8;

/// The six faces of the simulation domain, in file order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Face {
    XMin,
    XMax,
    YMin,
    YMax,
    ZMin,
    ZMax,
}

impl Face {
    pub const ALL: [Face; 6] = [
        Face::XMin,
        Face::XMax,
        Face::YMin,
        Face::YMax,
        Face::ZMin,
        Face::ZMax,
    ];

    /// Attribute name in the simulation file.
    pub fn attr(self) -> &'static str {
        match self {
            Face::XMin => "xmin",
            Face::XMax => "xmax",
            Face::YMin => "ymin",
            Face::YMax => "ymax",
            Face::ZMin => "zmin",
            Face::ZMax => "zmax",
        }
    }

    fn index(self) -> usize {
        match self {
            Face::XMin => 0,
            Face::XMax => 1,
            Face::YMin => 2,
            Face::YMax => 3,
            Face::ZMin => 4,
            Face::ZMax => 5,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BoundaryCondition {
    /// Perfect electric conductor.
    Pec,
    /// Perfect magnetic conductor.
    Pmc,
    /// First-order Mur absorbing boundary.
    Mur,
    /// Perfectly matched layer with the given number of cells.
    Pml { cells: u32 },
}

impl BoundaryCondition {
    pub fn tag(self) -> String {
        match self {
            BoundaryCondition::Pec => "PEC".to_string(),
            BoundaryCondition::Pmc => "PMC".to_string(),
            BoundaryCondition::Mur => "MUR".to_string(),
            BoundaryCondition::Pml { cells } => format!("PML_{cells}"),
        }
    }

    /// Open (absorbing) rather than reflecting.
    pub fn is_absorbing(self) -> bool {
        matches!(self, BoundaryCondition::Mur | BoundaryCondition::Pml { .. })
    }
}

impl fmt::Display for BoundaryCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag())
    }
}

impl FromStr for BoundaryCondition {
    type Err = SolverError;

    /// Accepts `PEC`, `PMC`, `MUR`, `PML_<n>` (any case) or the numeric tags
    /// `0`..`3`, where `3` is an 8-cell PML.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || SolverError::UnknownBoundaryType { tag: s.to_string() };
        let upper = s.trim().to_ascii_uppercase();
        match upper.as_str() {
            "PEC" | "0" => Ok(BoundaryCondition::Pec),
            "PMC" | "1" => Ok(BoundaryCondition::Pmc),
            "MUR" | "2" => Ok(BoundaryCondition::Mur),
            "3" => Ok(BoundaryCondition::Pml {
                cells: DEFAULT_PML_CELLS,
            }),
            other => {
                let cells = other
                    .strip_prefix("PML_")
                    .and_then(|n| n.parse::<u32>().ok())
                    .filter(|n| *n > 0)
                    .ok_or_else(unknown)?;
                Ok(BoundaryCondition::Pml { cells })
            }
        }
    }
}

/// Exactly one condition per face.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundarySet {
    faces: [BoundaryCondition; 6],
}

impl BoundarySet {
    pub fn new(faces: [BoundaryCondition; 6]) -> Self {
        Self { faces }
    }

    pub fn uniform(bc: BoundaryCondition) -> Self {
        Self { faces: [bc; 6] }
    }

    /// Parse six tags in face order.
    ///
    /// The count is checked before any tag is parsed.
    pub fn from_tags<S: AsRef<str>>(tags: &[S]) -> SolverResult<Self> {
        if tags.len() != 6 {
            return Err(SolverError::InvalidBoundaryCount { count: tags.len() });
        }
        let mut faces = [BoundaryCondition::Pec; 6];
        for (slot, tag) in faces.iter_mut().zip(tags) {
            *slot = tag.as_ref().parse()?;
        }
        Ok(Self { faces })
    }

    pub fn get(&self, face: Face) -> BoundaryCondition {
        self.faces[face.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Face, BoundaryCondition)> + '_ {
        Face::ALL.into_iter().zip(self.faces.iter().copied())
    }

    pub fn tags(&self) -> Vec<String> {
        self.faces.iter().map(|bc| bc.tag()).collect()
    }
}
