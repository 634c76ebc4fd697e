//! Pairwise tree reduction
//!
//! Products go into a buffer of size `n` which is then halved level by
//! level. Any path from a product to the root passes through at most
//! `ceil(log2 n)` additions, against `n - 1` for the sequential chain.

use super::reduce::reduce_tree;
use super::{products_buffer, ReductionStrategy};

/// Logarithmic-depth pairwise summation of the products
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeStrategy;

impl TreeStrategy {
    pub fn new() -> Self {
        TreeStrategy
    }
}

impl ReductionStrategy for TreeStrategy {
    fn name(&self) -> &'static str {
        "tree"
    }

    fn approximate(&self, a: &[f32], b: &[f32]) -> f32 {
        let mut products = products_buffer(a, b);
        reduce_tree(&mut products)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::SequentialStrategy;

    #[test]
    fn test_tree_basic() {
        let pair = TreeStrategy::new()
            .compute(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0])
            .unwrap();
        assert_eq!(pair.approx, 32.0);
        assert_eq!(pair.reference, 32.0);
    }

    #[test]
    fn test_tree_non_power_of_two_carry() {
        // products [1, 1e8, -1e8]: (1 + 1e8) + (-1e8) = 0 under the carry rule
        let pair = TreeStrategy::new()
            .compute(&[1.0, 1.0e8, -1.0e8], &[1.0, 1.0, 1.0])
            .unwrap();
        assert_eq!(pair.approx, 0.0);
        assert_eq!(pair.reference, 1.0);
    }

    #[test]
    fn test_tree_beats_sequential_on_large_head() {
        // 1e8 followed by 1023 ones: sequential drops every one,
        // the tree only loses the 1 + 2 + 4 absorbed on the leftmost path
        let mut a = vec![1.0e8f32];
        a.extend(std::iter::repeat(1.0).take(1023));
        let b = vec![1.0f32; a.len()];

        let tree = TreeStrategy::new().compute(&a, &b).unwrap();
        let sequential = SequentialStrategy::new().compute(&a, &b).unwrap();

        assert_eq!(sequential.abs_error(), 1023.0);
        assert_eq!(tree.abs_error(), 7.0);
    }
}
