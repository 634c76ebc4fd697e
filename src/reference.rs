//! Reference implementation of the dot product in double precision
//!
//! This provides the ground truth every reduction strategy is measured against.
//! Products and the running sum are both widened to `f64` and accumulated in
//! index order, so the result is deterministic for a given input pair.

use crate::error::{check_lengths, Result};

/// Computes `Σ a[i] * b[i]` in `f64`, strictly in index order
///
/// # Examples
///
/// ```
/// use dotprec::reference_dot;
///
/// let r = reference_dot(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]).unwrap();
/// assert_eq!(r, 32.0);
/// ```
pub fn reference_dot(a: &[f32], b: &[f32]) -> Result<f64> {
    check_lengths(a, b)?;
    Ok(reference_dot_unchecked(a, b))
}

/// Same as [`reference_dot`] for callers that already validated the lengths
pub(crate) fn reference_dot_unchecked(a: &[f32], b: &[f32]) -> f64 {
    let mut sum = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        sum += x as f64 * y as f64;
    }
    sum
}
