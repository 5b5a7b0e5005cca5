//! SI quantities used at the public API: excitation frequencies and
//! physical lengths. Geometry coordinates stay plain `Real` in drawing units.

use uom::si::f64::{Frequency as UomFrequency, Length as UomLength};

pub type Frequency = UomFrequency;
pub type Length = UomLength;

#[inline]
pub fn hz(v: f64) -> Frequency {
    use uom::si::frequency::hertz;
    Frequency::new::<hertz>(v)
}

#[inline]
pub fn ghz(v: f64) -> Frequency {
    use uom::si::frequency::gigahertz;
    Frequency::new::<gigahertz>(v)
}

#[inline]
pub fn m(v: f64) -> Length {
    use uom::si::length::meter;
    Length::new::<meter>(v)
}

#[inline]
pub fn to_hz(f: Frequency) -> f64 {
    use uom::si::frequency::hertz;
    f.get::<hertz>()
}

#[inline]
pub fn to_m(l: Length) -> f64 {
    use uom::si::length::meter;
    l.get::<meter>()
}

/// Vacuum constants.
pub mod constants {
    use super::*;

    /// Speed of light in vacuum, m/s.
    pub const C0_MPS: f64 = 299_792_458.0;
    /// Vacuum permeability, H/m.
    pub const MUE0: f64 = 4.0e-7 * core::f64::consts::PI;
    /// Vacuum permittivity, F/m.
    pub const EPS0: f64 = 1.0 / (MUE0 * C0_MPS * C0_MPS);

    /// Free-space wavelength at `f`.
    pub fn wavelength(f: Frequency) -> Length {
        m(C0_MPS / to_hz(f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_smoke() {
        assert_eq!(to_hz(hz(1.0e9)), 1.0e9);
        assert_eq!(to_m(m(1e-3)), 1e-3);
        assert_eq!(to_hz(ghz(1.5)), 1.5e9);
    }

    #[test]
    fn wavelength_at_one_ghz() {
        let lambda = to_m(constants::wavelength(ghz(1.0)));
        assert!((lambda - 0.299_792_458).abs() < 1e-12);
    }

    #[test]
    fn eps0_matches_reference() {
        assert!((constants::EPS0 - 8.854_187_8e-12).abs() < 1e-18);
    }
}
