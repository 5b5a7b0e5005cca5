//! em-project: simulation project files and their validation.
//!
//! A project file describes one simulation: grid, properties with their
//! boxes, and the FDTD run setup. Files are YAML or JSON; both go through
//! [`validate_simulation`] on load and on save.

pub mod schema;
pub mod validate;

pub use schema::*;
pub use validate::{LATEST_VERSION, ValidationError, validate_simulation};

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn read(path: &std::path::Path) -> ProjectResult<String> {
    std::fs::read_to_string(path).map_err(|source| ProjectError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write(path: &std::path::Path, content: String) -> ProjectResult<()> {
    std::fs::write(path, content).map_err(|source| ProjectError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_yaml(path: &std::path::Path) -> ProjectResult<SimulationDef> {
    let content = read(path)?;
    let sim: SimulationDef = serde_yaml::from_str(&content)?;
    validate_simulation(&sim)?;
    Ok(sim)
}

pub fn save_yaml(path: &std::path::Path, sim: &SimulationDef) -> ProjectResult<()> {
    validate_simulation(sim)?;
    write(path, serde_yaml::to_string(sim)?)
}

pub fn load_json(path: &std::path::Path) -> ProjectResult<SimulationDef> {
    let content = read(path)?;
    let sim: SimulationDef = serde_json::from_str(&content)?;
    validate_simulation(&sim)?;
    Ok(sim)
}

pub fn save_json(path: &std::path::Path, sim: &SimulationDef) -> ProjectResult<()> {
    validate_simulation(sim)?;
    write(path, serde_json::to_string_pretty(sim)?)
}

/// Load by extension: `.json` is JSON, everything else is YAML.
pub fn load_path(path: &std::path::Path) -> ProjectResult<SimulationDef> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => load_json(path),
        _ => load_yaml(path),
    }
}
