//! # dotprec: dot product reductions with measurable rounding error
//!
//! Computes the dot product of two `f32` vectors with several accumulation
//! strategies and pairs every result with an `f64` reference, so the
//! rounding error of each strategy can be measured against one oracle.
//!
//! ## Components
//!
//! 1. **Reference accumulator**: `f64` products and sum in index order.
//!
//! 2. **Reduction strategies**:
//!    - **Sequential**: one `f32` accumulator, the baseline
//!    - **Segmented**: wide-lane accumulation over an aligned product buffer
//!    - **Atomic**: concurrent partial sums merged through an atomic add
//!    - **Tree**: pairwise reduction with `O(log n)` depth
//!
//! 3. **Accelerator harness**: runs a named kernel on a parallel backend
//!    (Metal on Apple Silicon, CPU emulation elsewhere), combines its output
//!    with a reduce callback and checks it against the reference.
//!
//! ## Usage
//!
//! ```
//! use dotprec::{dot_product, Strategy};
//!
//! let a = [1.0, 2.0, 3.0];
//! let b = [4.0, 5.0, 6.0];
//! for strategy in Strategy::ALL {
//!     let pair = dot_product(&a, &b, strategy).unwrap();
//!     assert_eq!(pair.approx, 32.0);
//!     assert_eq!(pair.reference, 32.0);
//! }
//! ```
//!
//! Running the element-wise multiply kernel on an accelerator:
//!
//! ```
//! use dotprec::accelerator::{run_on_accelerator, CpuAccelerator, KernelId, LaunchGeometry};
//! use dotprec::reduce_tree;
//!
//! let backend = CpuAccelerator::new();
//! let geometry = LaunchGeometry::single_group(3).unwrap();
//! let outcome = run_on_accelerator(
//!     &backend,
//!     &[1.0, 2.0, 3.0],
//!     &[4.0, 5.0, 6.0],
//!     reduce_tree,
//!     &geometry,
//!     &KernelId::new("dot_product_mul"),
//! )
//! .unwrap();
//! assert_eq!(outcome.pair.approx, 32.0);
//! ```

pub mod accelerator;
pub mod config;
pub mod constants;
pub mod error;
pub mod reference;
pub mod result;
pub mod strategy;

// Re-export primary components
pub use accelerator::{
    default_accelerator, run_on_accelerator, validate_against_cpu, Accelerator, CpuAccelerator,
    CrossCheck, HarnessOutcome, KernelId, LaunchGeometry, ReduceCallback,
};
pub use config::{detect_architecture, Architecture, DotConfig};
pub use error::{DotError, Result};
pub use reference::reference_dot;
pub use result::ResultPair;
pub use strategy::{
    create_strategy, dot_product, reduce_lanes, reduce_lanes_with, reduce_sequential, reduce_tree,
    AtomicStrategy, ReductionStrategy, SegmentedStrategy, SequentialStrategy, Strategy,
    TreeStrategy,
};

/// Version information for the dotprec library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
