//! Named, typed region assignments.

use em_core::{PropertyId, Real};

use crate::{StructureError, StructureResult};

/// Which field an excitation property drives, and how.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExcitationField {
    /// Soft E-field source (added to the field).
    ESoft,
    /// Hard E-field source (overwrites the field).
    EHard,
    HSoft,
    HHard,
}

impl ExcitationField {
    /// Numeric type tag used in the geometry file.
    pub fn tag(self) -> u8 {
        match self {
            ExcitationField::ESoft => 0,
            ExcitationField::EHard => 1,
            ExcitationField::HSoft => 2,
            ExcitationField::HHard => 3,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(ExcitationField::ESoft),
            1 => Some(ExcitationField::EHard),
            2 => Some(ExcitationField::HSoft),
            3 => Some(ExcitationField::HHard),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum PropertyKind {
    /// Perfect electric conductor.
    Metal,
    /// Excitation source region with a direction/amplitude vector.
    Excitation {
        field: ExcitationField,
        vector: [Real; 3],
    },
    /// Isotropic dielectric/magnetic material.
    Material {
        epsilon: Real,
        mue: Real,
        kappa: Real,
        sigma: Real,
    },
}

impl PropertyKind {
    /// Element name used in the geometry file.
    pub fn element_name(&self) -> &'static str {
        match self {
            PropertyKind::Metal => "Metal",
            PropertyKind::Excitation { .. } => "Excitation",
            PropertyKind::Material { .. } => "Material",
        }
    }

    pub fn vacuum() -> Self {
        PropertyKind::Material {
            epsilon: 1.0,
            mue: 1.0,
            kappa: 0.0,
            sigma: 0.0,
        }
    }

    pub(crate) fn validate(&self, name: &str) -> StructureResult<()> {
        match self {
            PropertyKind::Metal => Ok(()),
            PropertyKind::Excitation { vector, .. } => {
                if vector.iter().any(|v| !v.is_finite()) {
                    return Err(StructureError::InvalidValue {
                        field: format!("property '{name}' excitation vector"),
                        reason: "components must be finite".to_string(),
                    });
                }
                Ok(())
            }
            PropertyKind::Material {
                epsilon,
                mue,
                kappa,
                sigma,
            } => {
                for (label, v, min_exclusive) in [
                    ("epsilon", *epsilon, true),
                    ("mue", *mue, true),
                    ("kappa", *kappa, false),
                    ("sigma", *sigma, false),
                ] {
                    let ok = v.is_finite() && if min_exclusive { v > 0.0 } else { v >= 0.0 };
                    if !ok {
                        return Err(StructureError::InvalidValue {
                            field: format!("property '{name}' {label}"),
                            reason: format!("{v} is out of range"),
                        });
                    }
                }
                Ok(())
            }
        }
    }
}

/// Axis-aligned box between two corners.
///
/// Corners are kept exactly as given; use [`Cuboid::normalized`] for the hull.
#[derive(Clone, Debug, PartialEq)]
pub struct Cuboid {
    pub start: [Real; 3],
    pub stop: [Real; 3],
    /// Higher priority wins where boxes of different properties overlap.
    pub priority: i32,
}

impl Cuboid {
    pub fn new(start: [Real; 3], stop: [Real; 3], priority: i32) -> Self {
        Self {
            start,
            stop,
            priority,
        }
    }

    /// (min corner, max corner)
    pub fn normalized(&self) -> ([Real; 3], [Real; 3]) {
        let mut lo = [0.0; 3];
        let mut hi = [0.0; 3];
        for i in 0..3 {
            lo[i] = self.start[i].min(self.stop[i]);
            hi[i] = self.start[i].max(self.stop[i]);
        }
        (lo, hi)
    }

    /// Closed-interval containment against the hull.
    pub fn contains(&self, point: [Real; 3]) -> bool {
        let (lo, hi) = self.normalized();
        (0..3).all(|i| point[i] >= lo[i] && point[i] <= hi[i])
    }

    /// Zero extent in at least one direction (sheets, lines, points).
    pub fn is_degenerate(&self) -> bool {
        (0..3).any(|i| self.start[i] == self.stop[i])
    }
}

#[derive(Clone, Debug)]
pub struct Property {
    pub(crate) id: PropertyId,
    pub(crate) name: String,
    pub(crate) kind: PropertyKind,
    pub(crate) boxes: Vec<Cuboid>,
}

/// Same position, name, kind and boxes, whichever structure issued the id.
impl PartialEq for Property {
    fn eq(&self, other: &Self) -> bool {
        self.id.index() == other.id.index()
            && self.name == other.name
            && self.kind == other.kind
            && self.boxes == other.boxes
    }
}

impl Property {
    pub fn id(&self) -> PropertyId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &PropertyKind {
        &self.kind
    }

    pub fn boxes(&self) -> &[Cuboid] {
        &self.boxes
    }

    /// Highest box priority, if the property has any boxes.
    pub fn max_priority(&self) -> Option<i32> {
        self.boxes.iter().map(|b| b.priority).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hull_ignores_corner_order() {
        let b = Cuboid::new([10.0, 0.0, 5.0], [0.0, 10.0, -5.0], 1);
        let (lo, hi) = b.normalized();
        assert_eq!(lo, [0.0, 0.0, -5.0]);
        assert_eq!(hi, [10.0, 10.0, 5.0]);
        assert!(b.contains([5.0, 5.0, 0.0]));
        assert!(!b.contains([11.0, 5.0, 0.0]));
    }

    #[test]
    fn sheet_is_degenerate() {
        let sheet = Cuboid::new([0.0, 0.0, 0.0], [50.0, 50.0, 0.0], 10);
        assert!(sheet.is_degenerate());
        assert!(sheet.contains([25.0, 25.0, 0.0]));
    }

    #[test]
    fn excitation_tags_round_trip() {
        for tag in 0..4 {
            let field = ExcitationField::from_tag(tag).unwrap();
            assert_eq!(field.tag(), tag);
        }
        assert!(ExcitationField::from_tag(7).is_none());
    }

    #[test]
    fn material_rejects_zero_permittivity() {
        let kind = PropertyKind::Material {
            epsilon: 0.0,
            mue: 1.0,
            kappa: 0.0,
            sigma: 0.0,
        };
        assert!(kind.validate("sub").is_err());
        assert!(PropertyKind::vacuum().validate("air").is_ok());
    }
}
