//! Segmented (wide-lane) reduction
//!
//! Products are first written into an aligned intermediate buffer and then
//! summed by several independent lane accumulators, mirroring how a vector
//! unit would split the dependency chain. The lane count follows the
//! detected architecture (16 on AVX-512, 8 on AVX2, 4 on NEON).

use super::{products_buffer, ReductionStrategy};
use super::reduce::reduce_lanes_with;
use crate::config::DotConfig;
use crate::constants::MAX_LANES;

/// Multi-lane reduction over an intermediate product buffer
#[derive(Debug, Clone, Copy)]
pub struct SegmentedStrategy {
    lanes: usize,
}

impl SegmentedStrategy {
    /// Create a segmented strategy with an explicit lane count, clamped to `1..=MAX_LANES`
    pub fn new(lanes: usize) -> Self {
        Self {
            lanes: lanes.clamp(1, MAX_LANES),
        }
    }

    /// Lane count taken from the configuration
    pub fn from_config(config: &DotConfig) -> Self {
        Self::new(config.lanes)
    }

    pub fn lanes(&self) -> usize {
        self.lanes
    }
}

impl Default for SegmentedStrategy {
    fn default() -> Self {
        Self::from_config(&DotConfig::default())
    }
}

impl ReductionStrategy for SegmentedStrategy {
    fn name(&self) -> &'static str {
        "segmented"
    }

    fn approximate(&self, a: &[f32], b: &[f32]) -> f32 {
        let mut products = products_buffer(a, b);
        reduce_lanes_with(&mut products, self.lanes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segmented_basic() {
        let a: Vec<f32> = (0..19).map(|i| i as f32).collect();
        let b = vec![2.0f32; 19];
        for lanes in [1, 2, 4, 8, 16] {
            let pair = SegmentedStrategy::new(lanes).compute(&a, &b).unwrap();
            // 2 * (0 + 1 + ... + 18) = 342
            assert_eq!(pair.approx, 342.0, "lanes = {}", lanes);
            assert_eq!(pair.reference, 342.0);
        }
    }

    #[test]
    fn test_segmented_keeps_terms_sequential_drops() {
        // 1e8 lands in lane 0, the ones spread over the other lanes
        let mut a = vec![1.0e8f32];
        a.extend(std::iter::repeat(1.0).take(63));
        let b = vec![1.0f32; a.len()];

        let pair = SegmentedStrategy::new(8).compute(&a, &b).unwrap();
        let sequential = super::super::SequentialStrategy::new()
            .compute(&a, &b)
            .unwrap();
        assert!(pair.abs_error() < sequential.abs_error());
    }

    #[test]
    fn test_lanes_clamped() {
        assert_eq!(SegmentedStrategy::new(0).lanes(), 1);
        assert_eq!(SegmentedStrategy::new(1000).lanes(), MAX_LANES);

        // The reported lane count is the one the reduction runs with
        let a: Vec<f32> = (0..200).map(|i| i as f32).collect();
        let b = vec![1.0f32; 200];
        let wide = SegmentedStrategy::new(1000).compute(&a, &b).unwrap();
        let capped = SegmentedStrategy::new(MAX_LANES).compute(&a, &b).unwrap();
        assert_eq!(wide.approx.to_bits(), capped.approx.to_bits());
    }
}
