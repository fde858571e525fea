use crate::MpError;

/// Floating point type used throughout the solver.
pub type Real = f64;

/// Threshold below which two sub-step fractions are considered equal.
pub const IOTA: Real = 1e-12;

/// Increments shorter than this are treated as instantaneous.
pub const INSTANT: Real = 1e-12;

/// `true` when `a` and `b` differ by less than [`IOTA`].
pub fn same_fraction(a: Real, b: Real) -> bool {
    (a - b).abs() < IOTA
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, MpError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(MpError::NonFinite { what, value: v })
    }
}

/// Check that every entry of a slice is finite.
pub fn ensure_all_finite(values: &[Real], what: &'static str) -> Result<(), MpError> {
    for &v in values {
        ensure_finite(v, what)?;
    }
    Ok(())
}
