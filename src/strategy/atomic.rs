//! Atomic parallel reduction
//!
//! The input is split into one contiguous chunk per worker. Each rayon task
//! computes its partial `f32` sum and folds it into a single shared
//! accumulator with an atomic read-modify-write. No update is lost, but the
//! order in which the partial sums are combined depends on scheduling, so
//! the result may differ run-to-run at the rounding-error level.

use super::ReductionStrategy;
use crate::config::DotConfig;
use rayon::prelude::*;
use std::sync::atomic::{AtomicU32, Ordering};

/// An `f32` stored as raw bits in an `AtomicU32`
#[derive(Debug, Default)]
pub struct AtomicF32 {
    bits: AtomicU32,
}

impl AtomicF32 {
    pub fn new(value: f32) -> Self {
        Self {
            bits: AtomicU32::new(value.to_bits()),
        }
    }

    /// Atomically adds `value`, retrying the compare-exchange until it lands
    pub fn fetch_add(&self, value: f32) -> f32 {
        let mut current = self.bits.load(Ordering::Relaxed);
        loop {
            let next = (f32::from_bits(current) + value).to_bits();
            match self.bits.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(previous) => return f32::from_bits(previous),
                Err(observed) => current = observed,
            }
        }
    }

    pub fn load(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Acquire))
    }

    pub fn into_inner(self) -> f32 {
        f32::from_bits(self.bits.into_inner())
    }
}

/// Concurrent partial sums combined through one atomic accumulator
#[derive(Debug, Clone, Copy)]
pub struct AtomicStrategy {
    n_workers: usize,
}

impl AtomicStrategy {
    /// Create an atomic strategy with an explicit worker count
    pub fn new(n_workers: usize) -> Self {
        Self {
            n_workers: n_workers.max(1),
        }
    }

    /// Worker count taken from the configuration
    pub fn from_config(config: &DotConfig) -> Self {
        Self::new(config.n_workers)
    }

    pub fn n_workers(&self) -> usize {
        self.n_workers
    }
}

impl Default for AtomicStrategy {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}

impl ReductionStrategy for AtomicStrategy {
    fn name(&self) -> &'static str {
        "atomic"
    }

    fn approximate(&self, a: &[f32], b: &[f32]) -> f32 {
        let n = a.len();
        if n == 0 {
            return 0.0;
        }

        let workers = self.n_workers.min(n);
        let chunk = (n + workers - 1) / workers;
        let total = AtomicF32::new(0.0);

        a.par_chunks(chunk)
            .zip(b.par_chunks(chunk))
            .for_each(|(xs, ys)| {
                let mut partial = 0.0f32;
                for (&x, &y) in xs.iter().zip(ys.iter()) {
                    partial += x * y;
                }
                total.fetch_add(partial);
            });

        // par_chunks joins every task before returning
        total.into_inner()
    }
}
