//! em-structure: geometry description consumed by the field solver.
//!
//! Provides:
//! - Rectilinear grid with a uniform delta unit
//! - Named, typed properties (metal, excitation, material) holding boxes
//! - Deterministic XML serialization and loading
//!
//! # Example
//!
//! ```
//! use em_structure::{Axis, Structure};
//!
//! let mut csx = Structure::new();
//! csx.set_unit(1e-3).unwrap();
//! csx.add_grid_lines(Axis::X, &[20.0, 0.0, 10.0, 10.0]).unwrap();
//! let plate = csx.add_metal("plate").unwrap();
//! csx.add_box(plate, [0.0, 0.0, 0.0], [10.0, 10.0, 0.0], 10).unwrap();
//!
//! assert_eq!(csx.grid().lines(Axis::X), &[0.0, 10.0, 20.0]);
//! assert_eq!(csx.properties().len(), 1);
//! ```

pub mod axis;
pub mod error;
pub mod grid;
pub mod load;
pub mod property;
pub mod structure;
pub mod xml;

pub use axis::Axis;
pub use error::{StructureError, StructureResult};
pub use grid::Grid;
pub use property::{Cuboid, ExcitationField, Property, PropertyKind};
pub use structure::Structure;

/// Library version reported for diagnostics.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
