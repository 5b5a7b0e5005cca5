//! Geometry document reader.
//!
//! Accepts a standalone `<ContinuousStructure>` document or a simulation file
//! that embeds one. Everything is re-added through the builder API, so a
//! loaded structure satisfies the same invariants as a built one.

use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use em_core::Real;

use crate::property::{Cuboid, ExcitationField, PropertyKind};
use crate::xml::parse_list;
use crate::{Axis, Structure, StructureError, StructureResult};

#[derive(Debug)]
struct PendingProperty {
    name: String,
    kind: PropertyKind,
    boxes: Vec<Cuboid>,
}

#[derive(Debug, Default)]
struct PendingBox {
    priority: i32,
    p1: Option<[Real; 3]>,
    p2: Option<[Real; 3]>,
}

#[derive(Default)]
struct Loader {
    structure: Structure,
    found: bool,
    in_structure: bool,
    in_properties: bool,
    property: Option<PendingProperty>,
    cuboid: Option<PendingBox>,
    lines_axis: Option<Axis>,
}

impl Structure {
    /// Read a structure back from a geometry or simulation file.
    pub fn load(path: &Path) -> StructureResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| StructureError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_xml_str(&content)
    }

    pub fn from_xml_str(xml: &str) -> StructureResult<Self> {
        let mut loader = Loader::default();
        loader.parse_xml(xml)?;
        if !loader.found {
            return Err(StructureError::Parse(
                "no <ContinuousStructure> element".to_string(),
            ));
        }
        Ok(loader.structure)
    }
}

impl Loader {
    fn parse_xml(&mut self, xml: &str) -> StructureResult<()> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => self.open(&e, false)?,
                Ok(Event::Empty(e)) => {
                    self.open(&e, true)?;
                    let tag = tag_name(&e);
                    self.close(&tag)?;
                }
                Ok(Event::Text(t)) => {
                    if let Some(axis) = self.lines_axis {
                        let text = t.unescape().map_err(StructureError::xml)?;
                        let values = parse_list(&text)?;
                        if !values.is_empty() {
                            self.structure.add_grid_lines(axis, &values)?;
                        }
                    }
                }
                Ok(Event::End(e)) => {
                    let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                    self.close(&tag)?;
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(StructureError::xml(e)),
                _ => {}
            }
            buf.clear();
        }
        Ok(())
    }

    fn open(&mut self, e: &BytesStart<'_>, empty: bool) -> StructureResult<()> {
        let tag = tag_name(e);
        match tag.as_str() {
            "ContinuousStructure" => {
                if self.found {
                    return Err(StructureError::Parse(
                        "more than one <ContinuousStructure>".to_string(),
                    ));
                }
                self.found = true;
                self.in_structure = true;
            }
            "Properties" if self.in_structure => self.in_properties = true,
            "Metal" | "Excitation" | "Material" if self.in_properties => {
                self.property = Some(parse_property_head(&tag, e)?);
            }
            "Property" if self.property.is_some() => {
                if let Some(pending) = self.property.as_mut() {
                    apply_material_values(pending, e)?;
                }
            }
            "Box" if self.property.is_some() => {
                if empty {
                    return Err(StructureError::Parse("box without corners".to_string()));
                }
                let priority = attr(e, "Priority")?
                    .map(|v| parse_int(&v, "Box Priority"))
                    .transpose()?
                    .unwrap_or(0);
                self.cuboid = Some(PendingBox {
                    priority,
                    ..PendingBox::default()
                });
            }
            "P1" | "P2" if self.cuboid.is_some() => {
                let point = parse_point(e)?;
                if let Some(cuboid) = self.cuboid.as_mut() {
                    if tag == "P1" {
                        cuboid.p1 = Some(point);
                    } else {
                        cuboid.p2 = Some(point);
                    }
                }
            }
            "RectilinearGrid" if self.in_structure => {
                if let Some(unit) = attr(e, "DeltaUnit")? {
                    let scale = parse_real(&unit, "DeltaUnit")?;
                    self.structure.set_unit(scale)?;
                }
            }
            "XLines" if self.in_structure => self.lines_axis = Some(Axis::X),
            "YLines" if self.in_structure => self.lines_axis = Some(Axis::Y),
            "ZLines" if self.in_structure => self.lines_axis = Some(Axis::Z),
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, tag: &str) -> StructureResult<()> {
        match tag {
            "ContinuousStructure" => self.in_structure = false,
            "Properties" => self.in_properties = false,
            "Box" => {
                if let Some(pending) = self.cuboid.take() {
                    let (Some(p1), Some(p2)) = (pending.p1, pending.p2) else {
                        return Err(StructureError::Parse(
                            "box is missing P1 or P2".to_string(),
                        ));
                    };
                    if let Some(property) = self.property.as_mut() {
                        property.boxes.push(Cuboid::new(p1, p2, pending.priority));
                    }
                }
            }
            "Metal" | "Excitation" | "Material" if self.in_properties => {
                if let Some(pending) = self.property.take() {
                    let id = self.structure.add_property(pending.kind, pending.name)?;
                    for cuboid in pending.boxes {
                        self.structure
                            .add_box(id, cuboid.start, cuboid.stop, cuboid.priority)?;
                    }
                }
            }
            "XLines" | "YLines" | "ZLines" => self.lines_axis = None,
            _ => {}
        }
        Ok(())
    }
}

fn tag_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).to_string()
}

fn attr(e: &BytesStart<'_>, key: &str) -> StructureResult<Option<String>> {
    for a in e.attributes() {
        let a = a.map_err(StructureError::xml)?;
        if a.key.as_ref() == key.as_bytes() {
            let value = a.unescape_value().map_err(StructureError::xml)?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn parse_real(value: &str, what: &str) -> StructureResult<Real> {
    value
        .trim()
        .parse::<Real>()
        .map_err(|e| StructureError::Parse(format!("{what}: bad number '{value}': {e}")))
}

fn parse_int(value: &str, what: &str) -> StructureResult<i32> {
    value
        .trim()
        .parse::<i32>()
        .map_err(|e| StructureError::Parse(format!("{what}: bad integer '{value}': {e}")))
}

fn parse_point(e: &BytesStart<'_>) -> StructureResult<[Real; 3]> {
    let mut p = [0.0; 3];
    for (i, key) in ["X", "Y", "Z"].into_iter().enumerate() {
        let value = attr(e, key)?
            .ok_or_else(|| StructureError::Parse(format!("point is missing {key}")))?;
        p[i] = parse_real(&value, key)?;
    }
    Ok(p)
}

fn parse_property_head(tag: &str, e: &BytesStart<'_>) -> StructureResult<PendingProperty> {
    let name = attr(e, "Name")?
        .ok_or_else(|| StructureError::Parse(format!("<{tag}> without Name")))?;
    let kind = match tag {
        "Metal" => PropertyKind::Metal,
        "Excitation" => {
            let type_tag = attr(e, "Type")?
                .map(|v| parse_int(&v, "Excitation Type"))
                .transpose()?
                .unwrap_or(0);
            let field = u8::try_from(type_tag)
                .ok()
                .and_then(ExcitationField::from_tag)
                .ok_or_else(|| {
                    StructureError::Parse(format!("unknown excitation type {type_tag}"))
                })?;
            let vector = match attr(e, "Excite")? {
                Some(v) => {
                    let parts = parse_list(&v)?;
                    <[Real; 3]>::try_from(parts.as_slice()).map_err(|_| {
                        StructureError::Parse(format!("Excite needs 3 components, got '{v}'"))
                    })?
                }
                None => [0.0; 3],
            };
            PropertyKind::Excitation { field, vector }
        }
        _ => PropertyKind::vacuum(),
    };
    Ok(PendingProperty {
        name,
        kind,
        boxes: Vec::new(),
    })
}

fn apply_material_values(pending: &mut PendingProperty, e: &BytesStart<'_>) -> StructureResult<()> {
    if let PropertyKind::Material {
        epsilon,
        mue,
        kappa,
        sigma,
    } = &mut pending.kind
    {
        for (key, slot) in [
            ("Epsilon", epsilon),
            ("Mue", mue),
            ("Kappa", kappa),
            ("Sigma", sigma),
        ] {
            if let Some(v) = attr(e, key)? {
                *slot = parse_real(&v, key)?;
            }
        }
    }
    Ok(())
}
