//! Reduction strategies for the dot product
//!
//! Every strategy computes the same mathematical quantity with a different
//! combination order and therefore a different rounding error profile:
//!
//! - **Sequential**: one `f32` chain in index order, error grows with `n`
//! - **Segmented**: several lane accumulators, shorter dependency chains
//! - **Atomic**: concurrent partial sums merged in unspecified order
//! - **Tree**: pairwise halving, `O(log n)` additions per path
//!
//! Each call also computes the `f64` reference from the same inputs, so the
//! returned [`ResultPair`] always measures error against one oracle.

pub mod atomic;
pub mod reduce;
pub mod segmented;
pub mod sequential;
pub mod tree;

pub use atomic::{AtomicF32, AtomicStrategy};
pub use reduce::{reduce_lanes, reduce_lanes_with, reduce_sequential, reduce_tree};
pub use segmented::SegmentedStrategy;
pub use sequential::SequentialStrategy;
pub use tree::TreeStrategy;

use crate::config::DotConfig;
use crate::constants::PRODUCT_BUFFER_ALIGN;
use crate::error::{check_lengths, Result};
use crate::reference::reference_dot_unchecked;
use crate::result::ResultPair;
use aligned_vec::AVec;
use tracing::debug;

/// Trait implemented by every dot product reduction strategy
///
/// Implementors only provide the limited-precision computation;
/// [`compute`](ReductionStrategy::compute) validates the inputs and pairs
/// the result with the reference value.
pub trait ReductionStrategy: Send + Sync {
    /// Short identifier used in logs and benchmarks
    fn name(&self) -> &'static str;

    /// The strategy's own `f32` result. Inputs have equal length.
    fn approximate(&self, a: &[f32], b: &[f32]) -> f32;

    /// Compute `(approx, reference)` for the pair of vectors
    fn compute(&self, a: &[f32], b: &[f32]) -> Result<ResultPair> {
        check_lengths(a, b)?;
        debug!(strategy = self.name(), n = a.len(), "computing dot product");
        let approx = self.approximate(a, b);
        let reference = reference_dot_unchecked(a, b);
        Ok(ResultPair::new(approx, reference))
    }
}

/// Available strategies, for selection at runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    Sequential,
    Segmented,
    Atomic,
    Tree,
}

impl Strategy {
    /// Every strategy, in order of increasing sophistication
    pub const ALL: [Strategy; 4] = [
        Strategy::Sequential,
        Strategy::Segmented,
        Strategy::Atomic,
        Strategy::Tree,
    ];

    /// Whether repeated calls on identical inputs give bit-identical results
    pub fn is_deterministic(&self) -> bool {
        !matches!(self, Strategy::Atomic)
    }
}

/// Create a strategy instance configured from `config`
pub fn create_strategy(strategy: Strategy, config: &DotConfig) -> Box<dyn ReductionStrategy> {
    match strategy {
        Strategy::Sequential => Box::new(SequentialStrategy::new()),
        Strategy::Segmented => Box::new(SegmentedStrategy::from_config(config)),
        Strategy::Atomic => Box::new(AtomicStrategy::from_config(config)),
        Strategy::Tree => Box::new(TreeStrategy::new()),
    }
}

/// Compute the dot product of `a` and `b` with the default configuration
///
/// # Examples
///
/// ```
/// use dotprec::{dot_product, Strategy};
///
/// let pair = dot_product(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0], Strategy::Tree).unwrap();
/// assert_eq!(pair.approx, 32.0);
/// assert_eq!(pair.reference, 32.0);
/// ```
pub fn dot_product(a: &[f32], b: &[f32], strategy: Strategy) -> Result<ResultPair> {
    create_strategy(strategy, &DotConfig::default()).compute(a, b)
}

/// Element-wise products in a cache-line aligned buffer
pub(crate) fn products_buffer(a: &[f32], b: &[f32]) -> AVec<f32> {
    AVec::from_iter(
        PRODUCT_BUFFER_ALIGN,
        a.iter().zip(b.iter()).map(|(&x, &y)| x * y),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DotError;

    #[test]
    fn test_create_strategy_names() {
        let config = DotConfig::default();
        let names: Vec<_> = Strategy::ALL
            .iter()
            .map(|&s| create_strategy(s, &config).name())
            .collect();
        assert_eq!(names, vec!["sequential", "segmented", "atomic", "tree"]);
    }

    #[test]
    fn test_strategies_reject_mismatch() {
        let config = DotConfig::default();
        for strategy in Strategy::ALL {
            let err = create_strategy(strategy, &config)
                .compute(&[1.0, 2.0, 3.0], &[1.0, 2.0])
                .unwrap_err();
            assert_eq!(err, DotError::LengthMismatch { left: 3, right: 2 });
        }
    }

    #[test]
    fn test_products_buffer_alignment() {
        let buf = products_buffer(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]);
        assert_eq!(&buf[..], &[4.0, 10.0, 18.0]);
        assert_eq!(buf.as_ptr() as usize % PRODUCT_BUFFER_ALIGN, 0);
    }

    #[test]
    fn test_determinism_flags() {
        assert!(Strategy::Sequential.is_deterministic());
        assert!(Strategy::Segmented.is_deterministic());
        assert!(Strategy::Tree.is_deterministic());
        assert!(!Strategy::Atomic.is_deterministic());
    }
}
