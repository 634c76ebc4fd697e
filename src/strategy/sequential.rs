//! Sequential accumulation in single precision
//!
//! The baseline: one `f32` accumulator, products added in index order.
//! Rounding error can grow linearly with the input length.

use super::ReductionStrategy;

/// Term-by-term `f32` accumulation in index order
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialStrategy;

impl SequentialStrategy {
    pub fn new() -> Self {
        SequentialStrategy
    }
}

impl ReductionStrategy for SequentialStrategy {
    fn name(&self) -> &'static str {
        "sequential"
    }

    fn approximate(&self, a: &[f32], b: &[f32]) -> f32 {
        let mut sum = 0.0f32;
        for (&x, &y) in a.iter().zip(b.iter()) {
            sum += x * y;
        }
        sum
    }
}
