//! Incremental structure builder.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};

use em_core::{PropertyId, Real};
use tracing::debug;

use crate::property::{Cuboid, ExcitationField, Property, PropertyKind};
use crate::{Axis, Grid, StructureError, StructureResult, xml};

static NEXT_OWNER: AtomicU32 = AtomicU32::new(1);

/// Grid plus the ordered set of properties placed on it.
///
/// A `Structure` is a single-owner value with no internal locking. Property
/// handles are only meaningful for the structure that issued them (or a clone
/// of it); any other handle is rejected.
#[derive(Debug, Clone)]
pub struct Structure {
    owner: u32,
    grid: Grid,
    properties: Vec<Property>,
    names: HashMap<String, PropertyId>,
}

impl Default for Structure {
    fn default() -> Self {
        Self::new()
    }
}

/// Equal grids and equal properties; the owner token is ignored.
impl PartialEq for Structure {
    fn eq(&self, other: &Self) -> bool {
        self.grid == other.grid && self.properties == other.properties
    }
}

impl Structure {
    /// Create an empty structure: no grid lines, no properties.
    pub fn new() -> Self {
        Self {
            owner: NEXT_OWNER.fetch_add(1, Ordering::Relaxed),
            grid: Grid::default(),
            properties: Vec::new(),
            names: HashMap::new(),
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn set_unit(&mut self, scale: Real) -> StructureResult<()> {
        self.grid.set_delta_unit(scale)?;
        debug!(delta_unit = scale, "set grid delta unit");
        Ok(())
    }

    pub fn add_grid_lines(&mut self, axis: Axis, values: &[Real]) -> StructureResult<()> {
        self.grid.add_lines(axis, values)?;
        debug!(
            %axis,
            added = values.len(),
            total = self.grid.line_count(axis),
            "added grid lines"
        );
        Ok(())
    }

    /// Same as [`Structure::add_grid_lines`] with the axis given by name.
    pub fn add_grid_lines_named(&mut self, axis: &str, values: &[Real]) -> StructureResult<()> {
        let axis: Axis = axis.parse()?;
        self.add_grid_lines(axis, values)
    }

    /// Add a property and return its handle.
    pub fn add_property(
        &mut self,
        kind: PropertyKind,
        name: impl Into<String>,
    ) -> StructureResult<PropertyId> {
        let name = name.into();
        if self.names.contains_key(&name) {
            return Err(StructureError::DuplicateName { name });
        }
        kind.validate(&name)?;

        let id = u32::try_from(self.properties.len())
            .ok()
            .and_then(|index| PropertyId::new(self.owner, index))
            .ok_or_else(|| StructureError::InvalidValue {
                field: "property count".to_string(),
                reason: "too many properties".to_string(),
            })?;

        debug!(%id, name = %name, kind = kind.element_name(), "added property");
        self.names.insert(name.clone(), id);
        self.properties.push(Property {
            id,
            name,
            kind,
            boxes: Vec::new(),
        });
        Ok(id)
    }

    pub fn add_metal(&mut self, name: impl Into<String>) -> StructureResult<PropertyId> {
        self.add_property(PropertyKind::Metal, name)
    }

    pub fn add_excitation(
        &mut self,
        name: impl Into<String>,
        field: ExcitationField,
        vector: [Real; 3],
    ) -> StructureResult<PropertyId> {
        self.add_property(PropertyKind::Excitation { field, vector }, name)
    }

    pub fn add_material(
        &mut self,
        name: impl Into<String>,
        epsilon: Real,
        mue: Real,
        kappa: Real,
        sigma: Real,
    ) -> StructureResult<PropertyId> {
        self.add_property(
            PropertyKind::Material {
                epsilon,
                mue,
                kappa,
                sigma,
            },
            name,
        )
    }

    /// Append a box to a property.
    ///
    /// Corners may come in any order and are not checked against the grid.
    pub fn add_box(
        &mut self,
        property: PropertyId,
        start: [Real; 3],
        stop: [Real; 3],
        priority: i32,
    ) -> StructureResult<()> {
        if property.owner() != self.owner {
            return Err(StructureError::InvalidProperty { id: property });
        }
        let prop = self
            .properties
            .get_mut(property.index() as usize)
            .ok_or(StructureError::InvalidProperty { id: property })?;

        if start.iter().chain(stop.iter()).any(|v| !v.is_finite()) {
            return Err(StructureError::InvalidValue {
                field: format!("box corners of '{}'", prop.name),
                reason: "coordinates must be finite".to_string(),
            });
        }

        prop.boxes.push(Cuboid::new(start, stop, priority));
        debug!(property = %prop.name, priority, boxes = prop.boxes.len(), "added box");
        Ok(())
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// All properties in insertion order.
    pub fn list_properties(&self) -> Vec<&Property> {
        self.properties.iter().collect()
    }

    pub fn property(&self, id: PropertyId) -> Option<&Property> {
        if id.owner() != self.owner {
            return None;
        }
        self.properties.get(id.index() as usize)
    }

    pub fn property_by_name(&self, name: &str) -> Option<&Property> {
        self.names.get(name).and_then(|id| self.property(*id))
    }

    pub fn box_count(&self) -> usize {
        self.properties.iter().map(|p| p.boxes.len()).sum()
    }

    /// Geometry document as a string; identical structures give identical text.
    pub fn to_xml_string(&self) -> StructureResult<String> {
        xml::structure_document(self)
    }

    /// Write the geometry document to `path`.
    pub fn serialize(&self, path: &Path) -> StructureResult<()> {
        let content = self.to_xml_string()?;
        std::fs::write(path, content).map_err(|source| StructureError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "wrote structure");
        Ok(())
    }
}
