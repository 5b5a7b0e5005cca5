//! em-core: shared foundation for emflow.
//!
//! Contains:
//! - units (uom SI types, constructors and vacuum constants)
//! - numeric (Real, range checks, grid-line merging)
//! - ids (property handles)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod units;

pub use error::{CoreError, CoreResult};
pub use ids::*;
pub use numeric::*;
pub use units::*;
