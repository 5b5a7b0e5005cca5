//! Simulation file: FDTD settings followed by the embedded structure.

use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesEnd, BytesStart, Event};

use em_core::hz;
use em_structure::Structure;
use em_structure::xml::{self as sxml, format_real};

use crate::{
    BoundaryCondition, BoundarySet, Excitation, Face, RunParameters, SolverError, SolverResult,
};

/// Build the complete simulation document.
pub fn simulation_document(
    params: &RunParameters,
    excitation: &Excitation,
    boundaries: &BoundarySet,
    structure: &Structure,
) -> SolverResult<String> {
    let mut writer = sxml::new_writer();
    sxml::write_declaration(&mut writer)?;
    sxml::emit(&mut writer, Event::Start(BytesStart::new("openEMS")))?;

    let steps = params.max_timesteps().to_string();
    let end = format_real(params.end_criterion());
    let f_max = format_real(excitation.f_max_hz());
    let mut fdtd = BytesStart::new("FDTD");
    fdtd.push_attribute(("NumberOfTimesteps", steps.as_str()));
    fdtd.push_attribute(("endCriteria", end.as_str()));
    fdtd.push_attribute(("f_max", f_max.as_str()));
    sxml::emit(&mut writer, Event::Start(fdtd))?;

    let exc_type = Excitation::GAUSSIAN_TYPE.to_string();
    let f0 = format_real(excitation.f0_hz());
    let fc = format_real(excitation.fc_hz());
    let mut exc = BytesStart::new("Excitation");
    exc.push_attribute(("Type", exc_type.as_str()));
    exc.push_attribute(("f0", f0.as_str()));
    exc.push_attribute(("fc", fc.as_str()));
    sxml::emit(&mut writer, Event::Empty(exc))?;

    let tags: Vec<(Face, String)> = boundaries.iter().map(|(f, bc)| (f, bc.tag())).collect();
    let mut bc = BytesStart::new("BoundaryCond");
    for (face, tag) in &tags {
        bc.push_attribute((face.attr(), tag.as_str()));
    }
    sxml::emit(&mut writer, Event::Empty(bc))?;
    sxml::emit(&mut writer, Event::End(BytesEnd::new("FDTD")))?;

    sxml::write_structure(&mut writer, structure)?;
    sxml::emit(&mut writer, Event::End(BytesEnd::new("openEMS")))?;
    Ok(sxml::finish(writer)?)
}

/// FDTD settings read back from a simulation file.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationSettings {
    pub params: RunParameters,
    pub excitation: Excitation,
    pub boundaries: BoundarySet,
}

impl SimulationSettings {
    pub fn load(path: &Path) -> SolverResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SolverError::io(path, e))?;
        Self::from_xml_str(&content)
    }

    /// Settings are validated through the same constructors the builder uses.
    pub fn from_xml_str(xml: &str) -> SolverResult<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut in_fdtd = false;
        let mut params = None;
        let mut excitation = None;
        let mut boundaries = None;

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                    match e.name().as_ref() {
                        b"FDTD" => {
                            in_fdtd = true;
                            let steps = required(&e, "NumberOfTimesteps")?;
                            let steps = steps.trim().parse::<u64>().map_err(|err| {
                                SolverError::Parse(format!("NumberOfTimesteps '{steps}': {err}"))
                            })?;
                            let end = parse_real(&required(&e, "endCriteria")?, "endCriteria")?;
                            params = Some(RunParameters::new(steps, end)?);
                        }
                        b"Excitation" if in_fdtd => {
                            let f0 = parse_real(&required(&e, "f0")?, "f0")?;
                            let fc = parse_real(&required(&e, "fc")?, "fc")?;
                            excitation = Some(Excitation::gaussian(hz(f0), hz(fc))?);
                        }
                        b"BoundaryCond" if in_fdtd => {
                            let mut tags = Vec::with_capacity(6);
                            for face in Face::ALL {
                                tags.push(required(&e, face.attr())?);
                            }
                            boundaries = Some(BoundarySet::from_tags(&tags)?);
                        }
                        _ => {}
                    }
                }
                Ok(Event::End(e)) => {
                    if e.name().as_ref() == b"FDTD" {
                        in_fdtd = false;
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(SolverError::Parse(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        let missing = |what: &str| SolverError::Parse(format!("missing {what}"));
        Ok(Self {
            params: params.ok_or_else(|| missing("<FDTD>"))?,
            excitation: excitation.ok_or_else(|| missing("<Excitation>"))?,
            boundaries: boundaries.ok_or_else(|| missing("<BoundaryCond>"))?,
        })
    }

    pub fn absorbing_faces(&self) -> Vec<Face> {
        self.boundaries
            .iter()
            .filter(|(_, bc)| bc.is_absorbing())
            .map(|(f, _)| f)
            .collect()
    }

    pub fn boundary(&self, face: Face) -> BoundaryCondition {
        self.boundaries.get(face)
    }
}

fn required(e: &BytesStart<'_>, key: &str) -> SolverResult<String> {
    for a in e.attributes() {
        let a = a.map_err(|err| SolverError::Parse(err.to_string()))?;
        if a.key.as_ref() == key.as_bytes() {
            let value = a
                .unescape_value()
                .map_err(|err| SolverError::Parse(err.to_string()))?;
            return Ok(value.into_owned());
        }
    }
    let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
    Err(SolverError::Parse(format!("<{tag}> is missing {key}")))
}

fn parse_real(value: &str, what: &str) -> SolverResult<f64> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|e| SolverError::Parse(format!("{what} '{value}': {e}")))
}
