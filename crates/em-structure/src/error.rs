//! Structure-specific error types.

use std::path::PathBuf;

use em_core::PropertyId;
use thiserror::Error;

use crate::Axis;

pub type StructureResult<T> = Result<T, StructureError>;

/// Errors raised while building, writing or loading a structure.
#[derive(Error, Debug)]
pub enum StructureError {
    #[error("Invalid delta unit {value}: must be finite and > 0")]
    InvalidUnit { value: f64 },

    #[error("Invalid axis: '{axis}' (expected x, y or z)")]
    InvalidAxis { axis: String },

    #[error("Invalid grid lines for axis {axis}: {reason}")]
    InvalidGridLine { axis: Axis, reason: String },

    #[error("Duplicate property name: '{name}'")]
    DuplicateName { name: String },

    #[error("Unknown property handle: {id}")]
    InvalidProperty { id: PropertyId },

    #[error("Invalid value: {field} ({reason})")]
    InvalidValue { field: String, reason: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Malformed structure document: {0}")]
    Parse(String),
}

impl StructureError {
    pub(crate) fn xml(err: impl std::fmt::Display) -> Self {
        StructureError::Xml(err.to_string())
    }
}
