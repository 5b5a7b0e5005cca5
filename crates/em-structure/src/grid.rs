//! Non-uniform rectilinear grid.

use em_core::{Length, Real, ensure_positive, m, merge_sorted_unique};

use crate::{Axis, StructureError, StructureResult};

/// Grid lines per axis plus the scale applied to every coordinate.
///
/// Lines are always stored sorted ascending without duplicates.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    delta_unit: Real,
    lines: [Vec<Real>; 3],
}

impl Default for Grid {
    fn default() -> Self {
        Self {
            delta_unit: 1.0,
            lines: [Vec::new(), Vec::new(), Vec::new()],
        }
    }
}

impl Grid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Meters per drawing unit.
    pub fn delta_unit(&self) -> Real {
        self.delta_unit
    }

    pub fn delta_unit_length(&self) -> Length {
        m(self.delta_unit)
    }

    pub fn set_delta_unit(&mut self, scale: Real) -> StructureResult<()> {
        ensure_positive(scale, "delta unit")
            .map_err(|_| StructureError::InvalidUnit { value: scale })?;
        self.delta_unit = scale;
        Ok(())
    }

    pub fn add_lines(&mut self, axis: Axis, values: &[Real]) -> StructureResult<()> {
        if values.is_empty() {
            return Err(StructureError::InvalidGridLine {
                axis,
                reason: "no values given".to_string(),
            });
        }
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(StructureError::InvalidGridLine {
                axis,
                reason: format!("non-finite value {bad}"),
            });
        }
        merge_sorted_unique(&mut self.lines[axis.index()], values);
        Ok(())
    }

    pub fn clear_lines(&mut self, axis: Axis) {
        self.lines[axis.index()].clear();
    }

    pub fn lines(&self, axis: Axis) -> &[Real] {
        &self.lines[axis.index()]
    }

    pub fn line_count(&self, axis: Axis) -> usize {
        self.lines[axis.index()].len()
    }

    /// First and last line of an axis, in drawing units.
    pub fn bounds(&self, axis: Axis) -> Option<(Real, Real)> {
        let lines = self.lines(axis);
        Some((*lines.first()?, *lines.last()?))
    }

    /// Axes that still have fewer than two lines.
    pub fn underdefined_axes(&self) -> Vec<Axis> {
        Axis::ALL
            .into_iter()
            .filter(|a| self.line_count(*a) < 2)
            .collect()
    }

    /// True once every axis spans at least one cell.
    pub fn is_runnable(&self) -> bool {
        self.underdefined_axes().is_empty()
    }

    /// Total number of cells (product of per-axis cell counts).
    pub fn cell_count(&self) -> usize {
        Axis::ALL
            .into_iter()
            .map(|a| self.line_count(a).saturating_sub(1))
            .product()
    }
}
