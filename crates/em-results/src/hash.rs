//! Content-based hashing for run IDs.

use sha2::{Digest, Sha256};

/// Hash of the simulation document plus the solver version.
///
/// The simulation document already contains geometry, grid, excitation,
/// boundaries and run limits, so equal inputs give equal ids.
pub fn compute_run_id(simulation_xml: &str, solver_version: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(simulation_xml.as_bytes());
    hasher.update([0u8]);
    hasher.update(solver_version.as_bytes());

    let result = hasher.finalize();
    format!("{:x}", result)
}

/// First 12 hex digits; enough to name a directory.
pub fn short_id(run_id: &str) -> &str {
    run_id.get(..12).unwrap_or(run_id)
}
