//! CPU-emulated accelerator backend
//!
//! Runs registered kernels as if they were dispatched over a GPU grid. Each
//! emulated thread owns one contiguous, disjoint slice of the output buffer
//! and is executed as a rayon task, so the host never touches the buffer
//! while the kernel window is open.

use super::{Accelerator, DeviceOutput, KernelId, LaunchGeometry};
use crate::constants::{CPU_MAX_THREADS_PER_GROUP, DOT_PRODUCT_KERNEL};
use crate::error::{DotError, Result};
use rayon::prelude::*;
use std::collections::HashMap;
use std::time::Instant;
use tracing::debug;

/// Position of one emulated thread within the launch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelContext {
    /// Linear thread index in the grid
    pub thread_index: usize,
    /// Thread position inside its group
    pub thread_in_group: [u32; 3],
    /// Group position inside the grid
    pub group_in_grid: [u32; 3],
    /// Total number of threads in the launch
    pub threads_per_grid: usize,
    /// Index of the first element owned by this thread
    pub offset: usize,
}

impl KernelContext {
    fn new(thread_index: usize, offset: usize, geometry: &LaunchGeometry) -> Self {
        let per_group = geometry.threads_per_group();
        Self {
            thread_index,
            thread_in_group: unflatten(thread_index % per_group, geometry.group()),
            group_in_grid: unflatten(thread_index / per_group, geometry.grid()),
            threads_per_grid: geometry.total_threads(),
            offset,
        }
    }
}

fn unflatten(linear: usize, dims: [u32; 3]) -> [u32; 3] {
    let x = dims[0] as usize;
    let xy = x * dims[1] as usize;
    [
        (linear % x) as u32,
        ((linear / x) % dims[1] as usize) as u32,
        (linear / xy) as u32,
    ]
}

/// A kernel body: fills `out` (the thread's slice) from the full inputs
pub type CpuKernel = fn(&KernelContext, &[f32], &[f32], &mut [f32]);

/// Element-wise multiply: `out[j] = a[offset + j] * b[offset + j]`
pub fn dot_product_mul_kernel(ctx: &KernelContext, a: &[f32], b: &[f32], out: &mut [f32]) {
    let a = &a[ctx.offset..ctx.offset + out.len()];
    let b = &b[ctx.offset..ctx.offset + out.len()];
    for ((o, &x), &y) in out.iter_mut().zip(a).zip(b) {
        *o = x * y;
    }
}

/// Accelerator backend that emulates the kernel grid on the CPU
#[derive(Clone)]
pub struct CpuAccelerator {
    kernels: HashMap<KernelId, CpuKernel>,
    max_threads_per_group: u32,
}

impl CpuAccelerator {
    /// Backend with the built-in `dot_product_mul` kernel registered
    pub fn new() -> Self {
        let mut backend = Self::empty();
        backend.register(KernelId::new(DOT_PRODUCT_KERNEL), dot_product_mul_kernel);
        backend
    }

    /// Backend with no kernels registered
    pub fn empty() -> Self {
        Self {
            kernels: HashMap::new(),
            max_threads_per_group: CPU_MAX_THREADS_PER_GROUP,
        }
    }

    /// Register (or replace) a kernel under `id`
    pub fn register(&mut self, id: KernelId, kernel: CpuKernel) {
        self.kernels.insert(id, kernel);
    }

    /// Limit on `group` threads, like a device's max threads per threadgroup
    pub fn with_max_threads_per_group(mut self, max: u32) -> Self {
        self.max_threads_per_group = max;
        self
    }

    pub fn kernel_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.kernels.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl Default for CpuAccelerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Accelerator for CpuAccelerator {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn submit(
        &self,
        kernel: &KernelId,
        a: &[f32],
        b: &[f32],
        geometry: &LaunchGeometry,
    ) -> Result<DeviceOutput> {
        let body = *self
            .kernels
            .get(kernel)
            .ok_or_else(|| DotError::KernelNotFound(kernel.to_string()))?;

        if geometry.threads_per_group() > self.max_threads_per_group as usize {
            return Err(DotError::LaunchFailed(format!(
                "{} threads per group exceeds the limit of {}",
                geometry.threads_per_group(),
                self.max_threads_per_group
            )));
        }

        let n = a.len();
        let mut products: Vec<f32> = Vec::new();
        products
            .try_reserve_exact(n)
            .map_err(|_| DotError::BufferAllocation(n * std::mem::size_of::<f32>()))?;
        products.resize(n, 0.0);

        let threads = geometry.total_threads().min(n.max(1));
        let per_thread = n.div_ceil(threads).max(1);
        debug!(kernel = %kernel, n, threads, per_thread, "cpu kernel dispatch");

        let start = Instant::now();
        products
            .par_chunks_mut(per_thread)
            .enumerate()
            .for_each(|(t, out)| {
                let ctx = KernelContext::new(t, t * per_thread, geometry);
                body(&ctx, a, b, out);
            });
        let kernel_time = start.elapsed();

        Ok(DeviceOutput {
            products,
            kernel_time,
        })
    }
}
