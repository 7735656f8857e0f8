//! Fill-value masking.
//!
//! Sentinel detection is exact equality unless a tolerance is supplied.
//! Exact matching misses sentinels that were perturbed by a unit conversion
//! or a float32 round trip; `tolerance` exists for those files.

use ndarray::{Array2, Zip};

/// How a stored value is recognised as the fill sentinel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillMatcher {
    pub fill_value: f64,
    /// Absolute tolerance; `None` means exact equality
    pub tolerance: Option<f64>,
}

impl FillMatcher {
    pub fn exact(fill_value: f64) -> Self {
        Self {
            fill_value,
            tolerance: None,
        }
    }

    pub fn with_tolerance(fill_value: f64, tolerance: Option<f64>) -> Self {
        Self {
            fill_value,
            tolerance,
        }
    }

    #[inline]
    pub fn is_fill(&self, v: f64) -> bool {
        match self.tolerance {
            None => v == self.fill_value,
            Some(tol) => (v - self.fill_value).abs() <= tol,
        }
    }
}

/// Replace every sentinel in `values` with NaN, in place.
pub fn mask_fill(values: &mut Array2<f64>, matcher: FillMatcher) {
    values.mapv_inplace(|v| if matcher.is_fill(v) { f64::NAN } else { v });
}

/// Entries where both coordinates are finite.
pub fn joint_validity(x: &Array2<f64>, y: &Array2<f64>) -> Array2<bool> {
    Zip::from(x)
        .and(y)
        .map_collect(|a, b| a.is_finite() && b.is_finite())
}

/// Masked coordinates plus their joint validity mask.
#[derive(Debug, Clone)]
pub struct Masked {
    pub x: Array2<f64>,
    pub y: Array2<f64>,
    pub valid: Array2<bool>,
}

/// Mask both coordinate arrays with the same sentinel and derive validity.
pub fn apply(mut x: Array2<f64>, mut y: Array2<f64>, matcher: FillMatcher) -> Masked {
    mask_fill(&mut x, matcher);
    mask_fill(&mut y, matcher);
    let valid = joint_validity(&x, &y);
    Masked { x, y, valid }
}
