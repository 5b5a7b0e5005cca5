//! Deterministic XML writer for geometry documents.
//!
//! Numbers use Rust's shortest round-trip formatting, attributes are written
//! in a fixed order and indentation is fixed at two spaces, so equal
//! structures always produce byte-identical documents.

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use em_core::Real;

use crate::property::{Cuboid, Property, PropertyKind};
use crate::{Axis, Grid, Structure, StructureError, StructureResult};

pub type XmlWriter = Writer<Vec<u8>>;

pub fn new_writer() -> XmlWriter {
    Writer::new_with_indent(Vec::new(), b' ', 2)
}

pub fn emit(writer: &mut XmlWriter, event: Event<'_>) -> StructureResult<()> {
    writer.write_event(event).map_err(StructureError::xml)
}

pub fn write_declaration(writer: &mut XmlWriter) -> StructureResult<()> {
    emit(
        writer,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
    )
}

/// Consume the writer and return the document text with a trailing newline.
pub fn finish(writer: XmlWriter) -> StructureResult<String> {
    let mut text = String::from_utf8(writer.into_inner()).map_err(StructureError::xml)?;
    text.push('\n');
    Ok(text)
}

pub fn format_real(v: Real) -> String {
    format!("{v}")
}

pub fn format_list(values: &[Real]) -> String {
    values
        .iter()
        .map(|v| format_real(*v))
        .collect::<Vec<_>>()
        .join(",")
}

pub fn parse_list(text: &str) -> StructureResult<Vec<Real>> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<Real>()
                .map_err(|e| StructureError::Parse(format!("bad number '{s}': {e}")))
        })
        .collect()
}

/// Full standalone geometry document.
pub fn structure_document(structure: &Structure) -> StructureResult<String> {
    let mut writer = new_writer();
    write_declaration(&mut writer)?;
    write_structure(&mut writer, structure)?;
    finish(writer)
}

/// Write the `<ContinuousStructure>` element; used standalone and embedded
/// in simulation files.
pub fn write_structure(writer: &mut XmlWriter, structure: &Structure) -> StructureResult<()> {
    let mut root = BytesStart::new("ContinuousStructure");
    root.push_attribute(("CoordSystem", "0"));
    emit(writer, Event::Start(root))?;

    if structure.properties().is_empty() {
        emit(writer, Event::Empty(BytesStart::new("Properties")))?;
    } else {
        emit(writer, Event::Start(BytesStart::new("Properties")))?;
        for property in structure.properties() {
            write_property(writer, property)?;
        }
        emit(writer, Event::End(BytesEnd::new("Properties")))?;
    }

    write_grid(writer, structure.grid())?;
    emit(writer, Event::End(BytesEnd::new("ContinuousStructure")))
}

fn write_property(writer: &mut XmlWriter, property: &Property) -> StructureResult<()> {
    let tag = property.kind().element_name();
    let id = property.id().index().to_string();

    let mut elem = BytesStart::new(tag);
    elem.push_attribute(("ID", id.as_str()));
    elem.push_attribute(("Name", property.name()));
    if let PropertyKind::Excitation { field, vector } = property.kind() {
        let field_tag = field.tag().to_string();
        let excite = format_list(vector);
        elem.push_attribute(("Type", field_tag.as_str()));
        elem.push_attribute(("Excite", excite.as_str()));
    }
    emit(writer, Event::Start(elem))?;

    if let PropertyKind::Material {
        epsilon,
        mue,
        kappa,
        sigma,
    } = property.kind()
    {
        let values = [
            ("Epsilon", format_real(*epsilon)),
            ("Mue", format_real(*mue)),
            ("Kappa", format_real(*kappa)),
            ("Sigma", format_real(*sigma)),
        ];
        let mut material = BytesStart::new("Property");
        for (key, value) in &values {
            material.push_attribute((*key, value.as_str()));
        }
        emit(writer, Event::Empty(material))?;
    }

    if property.boxes().is_empty() {
        emit(writer, Event::Empty(BytesStart::new("Primitives")))?;
    } else {
        emit(writer, Event::Start(BytesStart::new("Primitives")))?;
        for cuboid in property.boxes() {
            write_box(writer, cuboid)?;
        }
        emit(writer, Event::End(BytesEnd::new("Primitives")))?;
    }

    emit(writer, Event::End(BytesEnd::new(tag)))
}

fn write_box(writer: &mut XmlWriter, cuboid: &Cuboid) -> StructureResult<()> {
    let priority = cuboid.priority.to_string();
    let mut elem = BytesStart::new("Box");
    elem.push_attribute(("Priority", priority.as_str()));
    emit(writer, Event::Start(elem))?;
    write_point(writer, "P1", cuboid.start)?;
    write_point(writer, "P2", cuboid.stop)?;
    emit(writer, Event::End(BytesEnd::new("Box")))
}

fn write_point(writer: &mut XmlWriter, tag: &str, p: [Real; 3]) -> StructureResult<()> {
    let [x, y, z] = p.map(format_real);
    let mut elem = BytesStart::new(tag);
    elem.push_attribute(("X", x.as_str()));
    elem.push_attribute(("Y", y.as_str()));
    elem.push_attribute(("Z", z.as_str()));
    emit(writer, Event::Empty(elem))
}

fn write_grid(writer: &mut XmlWriter, grid: &Grid) -> StructureResult<()> {
    let unit = format_real(grid.delta_unit());
    let mut elem = BytesStart::new("RectilinearGrid");
    elem.push_attribute(("DeltaUnit", unit.as_str()));
    elem.push_attribute(("CoordSystem", "0"));
    emit(writer, Event::Start(elem))?;

    for axis in Axis::ALL {
        let tag = lines_tag(axis);
        let lines = grid.lines(axis);
        if lines.is_empty() {
            emit(writer, Event::Empty(BytesStart::new(tag)))?;
        } else {
            let text = format_list(lines);
            emit(writer, Event::Start(BytesStart::new(tag)))?;
            emit(writer, Event::Text(BytesText::new(&text)))?;
            emit(writer, Event::End(BytesEnd::new(tag)))?;
        }
    }

    emit(writer, Event::End(BytesEnd::new("RectilinearGrid")))
}

pub(crate) fn lines_tag(axis: Axis) -> &'static str {
    match axis {
        Axis::X => "XLines",
        Axis::Y => "YLines",
        Axis::Z => "ZLines",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExcitationField;

    fn sample() -> Structure {
        let mut csx = Structure::new();
        csx.set_unit(1e-3).unwrap();
        for axis in Axis::ALL {
            csx.add_grid_lines(axis, &[0.0, 10.0, 20.0]).unwrap();
        }
        let metal = csx.add_metal("plate").unwrap();
        csx.add_box(metal, [0.0, 0.0, 0.0], [20.0, 20.0, 0.0], 10)
            .unwrap();
        let port = csx
            .add_excitation("port", ExcitationField::ESoft, [0.0, 0.0, 1.0])
            .unwrap();
        csx.add_box(port, [5.0, 5.0, 5.0], [15.0, 15.0, 5.0], 5)
            .unwrap();
        csx
    }

    #[test]
    fn document_contains_expected_elements() {
        let text = sample().to_xml_string().unwrap();
        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(text.contains("<Metal ID=\"0\" Name=\"plate\">"));
        assert!(text.contains("<Excitation ID=\"1\" Name=\"port\" Type=\"0\" Excite=\"0,0,1\">"));
        assert!(text.contains("<Box Priority=\"10\">"));
        assert!(text.contains("<P2 X=\"20\" Y=\"20\" Z=\"0\"/>"));
        assert!(text.contains("<RectilinearGrid DeltaUnit=\"0.001\" CoordSystem=\"0\">"));
        assert!(text.contains("<XLines>0,10,20</XLines>"));
        assert!(text.ends_with("</ContinuousStructure>\n"));
    }

    #[test]
    fn names_are_escaped() {
        let mut csx = Structure::new();
        csx.add_metal("a<b & \"c\"").unwrap();
        let text = csx.to_xml_string().unwrap();
        assert!(text.contains("Name=\"a&lt;b &amp; &quot;c&quot;\""));
    }

    #[test]
    fn serialization_is_deterministic() {
        let a = sample().to_xml_string().unwrap();
        let b = sample().to_xml_string().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn list_parsing_tolerates_spaces() {
        assert_eq!(parse_list(" 0, 1.5 ,2e3 ").unwrap(), vec![0.0, 1.5, 2000.0]);
        assert!(parse_list("1,x").is_err());
        assert!(parse_list("").unwrap().is_empty());
    }
}
