use crate::CoreError;

/// Coordinate and parameter scalar.
pub type Real = f64;

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Finite and strictly positive.
pub fn ensure_positive(v: Real, what: &'static str) -> Result<Real, CoreError> {
    let v = ensure_finite(v, what)?;
    if v > 0.0 {
        Ok(v)
    } else {
        Err(CoreError::OutOfRange {
            what,
            value: v,
            reason: "must be > 0",
        })
    }
}

/// Merge `extra` into `lines`, then sort ascending and drop exact duplicates.
///
/// Callers must have rejected non-finite values; `total_cmp` keeps the order
/// total regardless.
pub fn merge_sorted_unique(lines: &mut Vec<Real>, extra: &[Real]) {
    lines.extend_from_slice(extra);
    lines.sort_by(|a, b| a.total_cmp(b));
    // -0.0 and 0.0 are the same grid line
    lines.dedup_by(|a, b| a == b);
}
