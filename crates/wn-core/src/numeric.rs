use crate::WnError;

/// Floating point type used throughout the network model.
pub type Real = f64;

/// Absolute/relative tolerance pair used for float comparisons.
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-9,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, WnError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(WnError::NonFinite { what, value: v })
    }
}

/// Parse a trimmed decimal string into a finite `Real`.
///
/// Returns `None` for blanks, garbage and non-finite values (`NaN`, `inf`).
pub fn parse_real(raw: &str) -> Option<Real> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<Real>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearly_equal_basic() {
        let tol = Tolerances {
            abs: 1e-12,
            rel: 1e-9,
        };
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn parse_real_rejects_blank_and_nan() {
        assert_eq!(parse_real(" 12.5 "), Some(12.5));
        assert_eq!(parse_real(""), None);
        assert_eq!(parse_real("   "), None);
        assert_eq!(parse_real("NaN"), None);
        assert_eq!(parse_real("abc"), None);
        assert_eq!(parse_real("0"), Some(0.0));
    }
}
