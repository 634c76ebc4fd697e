//! The `(approx, reference)` pair returned by every strategy and the harness

use crate::constants::{DEFAULT_ATOL, DEFAULT_RTOL};

/// A limited-precision result together with its `f64` ground truth
///
/// Both numbers are computed from the same input snapshot, so the error
/// helpers compare like with like.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResultPair {
    /// Value produced by a specific strategy in `f32`
    pub approx: f32,
    /// Double-precision reference computed by [`reference_dot`](crate::reference_dot)
    pub reference: f64,
}

impl ResultPair {
    pub fn new(approx: f32, reference: f64) -> Self {
        Self { approx, reference }
    }

    /// `|approx - reference|`, evaluated in `f64`
    pub fn abs_error(&self) -> f64 {
        (self.approx as f64 - self.reference).abs()
    }

    /// Absolute error divided by `|reference|`
    ///
    /// Falls back to the absolute error when the reference is zero.
    pub fn rel_error(&self) -> f64 {
        let denom = self.reference.abs();
        if denom == 0.0 {
            self.abs_error()
        } else {
            self.abs_error() / denom
        }
    }

    /// `abs_error <= atol + rtol * |reference|`
    pub fn is_close(&self, rtol: f64, atol: f64) -> bool {
        self.abs_error() <= atol + rtol * self.reference.abs()
    }

    /// [`is_close`](Self::is_close) with the default tolerances
    pub fn is_close_default(&self) -> bool {
        self.is_close(DEFAULT_RTOL, DEFAULT_ATOL)
    }
}
