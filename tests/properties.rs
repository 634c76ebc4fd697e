//! Property-based tests for the reduction strategies

use dotprec::strategy::Strategy as Reduction;
use dotprec::{create_strategy, reduce_tree, reference_dot, DotConfig};
use proptest::prelude::*;

/// Two vectors of the same random length
fn vector_pair(max_len: usize) -> impl Strategy<Value = (Vec<f32>, Vec<f32>)> {
    (0..max_len).prop_flat_map(|n| {
        (
            prop::collection::vec(-1.0e3f32..1.0e3, n),
            prop::collection::vec(-1.0e3f32..1.0e3, n),
        )
    })
}

proptest! {
    #[test]
    fn reference_identical_across_strategies((a, b) in vector_pair(300)) {
        let expected = reference_dot(&a, &b).unwrap();
        let config = DotConfig::default();
        for strategy in Reduction::ALL {
            let pair = create_strategy(strategy, &config).compute(&a, &b).unwrap();
            prop_assert_eq!(pair.reference.to_bits(), expected.to_bits());
        }
    }

    #[test]
    fn deterministic_strategies_repeat((a, b) in vector_pair(300)) {
        let config = DotConfig::default();
        for strategy in Reduction::ALL.into_iter().filter(|s| s.is_deterministic()) {
            let reducer = create_strategy(strategy, &config);
            let first = reducer.compute(&a, &b).unwrap();
            let second = reducer.compute(&a, &b).unwrap();
            prop_assert_eq!(first.approx.to_bits(), second.approx.to_bits());
        }
    }

    #[test]
    fn error_within_summation_bound((a, b) in vector_pair(300)) {
        // Any summation order stays within (n + 1) * eps * Σ|a_i b_i|
        let n = a.len();
        let magnitude: f64 = a.iter().zip(&b).map(|(&x, &y)| (x as f64 * y as f64).abs()).sum();
        let bound = (n as f64 + 1.0) * f32::EPSILON as f64 * magnitude;
        let config = DotConfig::default();
        for strategy in Reduction::ALL {
            let pair = create_strategy(strategy, &config).compute(&a, &b).unwrap();
            prop_assert!(
                pair.abs_error() <= bound,
                "{:?}: error {} exceeds bound {}",
                strategy,
                pair.abs_error(),
                bound
            );
        }
    }

    #[test]
    fn zero_vectors_give_zero(n in 0usize..2000) {
        let zeros = vec![0.0f32; n];
        for strategy in Reduction::ALL {
            let pair = dotprec::dot_product(&zeros, &zeros, strategy).unwrap();
            prop_assert_eq!(pair.approx, 0.0);
            prop_assert_eq!(pair.reference, 0.0);
        }
    }

    #[test]
    fn mismatched_lengths_rejected(
        a in prop::collection::vec(-1.0f32..1.0, 0..50),
        extra in 1usize..10,
    ) {
        let mut b = a.clone();
        b.extend(std::iter::repeat(0.5).take(extra));
        for strategy in Reduction::ALL {
            prop_assert!(dotprec::dot_product(&a, &b, strategy).is_err());
        }
    }

    #[test]
    fn tree_of_integers_is_exact(values in prop::collection::vec(-1000i32..1000, 0..500)) {
        // Integer partial sums stay far below 2^24, so no rounding happens
        let mut buf: Vec<f32> = values.iter().map(|&v| v as f32).collect();
        let expected: i32 = values.iter().sum();
        prop_assert_eq!(reduce_tree(&mut buf), expected as f32);
    }
}
