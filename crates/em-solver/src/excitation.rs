//! Gaussian pulse excitation.

use em_core::units::constants;
use em_core::{Frequency, Length, to_hz};

use crate::{SolverError, SolverResult};

/// Gaussian-modulated pulse centred on `f0` with 20 dB cutoff `fc`.
///
/// One excitation shape exists per run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Excitation {
    f0: Frequency,
    fc: Frequency,
}

impl Excitation {
    /// Numeric type tag of the Gaussian pulse in the simulation file.
    pub const GAUSSIAN_TYPE: u8 = 0;

    /// Both frequencies must be finite and positive, and `fc < f0`.
    pub fn gaussian(f0: Frequency, fc: Frequency) -> SolverResult<Self> {
        let (f0_hz, fc_hz) = (to_hz(f0), to_hz(fc));
        for (label, v) in [("f0", f0_hz), ("fc", fc_hz)] {
            if !v.is_finite() || v <= 0.0 {
                return Err(SolverError::InvalidExcitation {
                    reason: format!("{label} must be finite and > 0, got {v}"),
                });
            }
        }
        if fc_hz >= f0_hz {
            return Err(SolverError::InvalidExcitation {
                reason: format!("cutoff fc = {fc_hz} Hz must be below f0 = {f0_hz} Hz"),
            });
        }
        Ok(Self { f0, fc })
    }

    pub fn f0(&self) -> Frequency {
        self.f0
    }

    pub fn fc(&self) -> Frequency {
        self.fc
    }

    /// Highest frequency with significant spectral content.
    pub fn f_max(&self) -> Frequency {
        self.f0 + self.fc
    }

    pub fn f0_hz(&self) -> f64 {
        to_hz(self.f0)
    }

    pub fn fc_hz(&self) -> f64 {
        to_hz(self.fc)
    }

    pub fn f_max_hz(&self) -> f64 {
        to_hz(self.f_max())
    }

    /// Free-space wavelength at `f_max`; grid cells should stay well below it.
    pub fn min_wavelength(&self) -> Length {
        constants::wavelength(self.f_max())
    }
}
