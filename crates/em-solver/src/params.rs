//! Run limits.

use crate::{SolverError, SolverResult};

/// Time-step budget plus energy-decay end criterion; whichever is reached
/// first ends the run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunParameters {
    max_timesteps: u64,
    end_criterion: f64,
}

impl RunParameters {
    pub fn new(max_timesteps: u64, end_criterion: f64) -> SolverResult<Self> {
        if max_timesteps == 0 {
            return Err(SolverError::InvalidParameter {
                what: "max_timesteps",
                value: max_timesteps.to_string(),
                reason: "must be > 0",
            });
        }
        if !(end_criterion.is_finite() && end_criterion > 0.0 && end_criterion < 1.0) {
            return Err(SolverError::InvalidParameter {
                what: "end_criterion",
                value: end_criterion.to_string(),
                reason: "must lie in (0, 1)",
            });
        }
        Ok(Self {
            max_timesteps,
            end_criterion,
        })
    }

    pub fn max_timesteps(&self) -> u64 {
        self.max_timesteps
    }

    pub fn end_criterion(&self) -> f64 {
        self.end_criterion
    }

    /// End criterion in dB, as engines usually log it.
    pub fn end_criterion_db(&self) -> f64 {
        10.0 * self.end_criterion.log10()
    }
}
