//! Accelerator invocation harness
//!
//! The harness treats a parallel kernel as a black box: it hands the inputs
//! to a backend together with a launch geometry and a kernel name, waits for
//! the per-element products to come back, combines them with a caller
//! supplied [`ReduceCallback`], and pairs the result with the CPU-side `f64`
//! reference.
//!
//! Backends implement [`Accelerator`], so a Metal device, the CPU emulation
//! or a test double can be swapped without touching the reduction logic.

pub mod cpu;
pub mod geometry;
#[cfg(all(target_arch = "aarch64", target_os = "macos"))]
pub mod metal;

pub use cpu::{CpuAccelerator, CpuKernel, KernelContext};
pub use geometry::LaunchGeometry;
#[cfg(all(target_arch = "aarch64", target_os = "macos"))]
pub use metal::{KernelSource, MetalAccelerator};

use crate::config::DotConfig;
use crate::error::{check_lengths, DotError, Result};
use crate::reference::reference_dot_unchecked;
use crate::result::ResultPair;
use crate::strategy::{ReductionStrategy, TreeStrategy};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

/// Combines the device output buffer into one scalar
///
/// The slice length is the element count. The callback may reduce in place;
/// [`reduce_sequential`](crate::reduce_sequential),
/// [`reduce_lanes`](crate::reduce_lanes) and
/// [`reduce_tree`](crate::reduce_tree) all fit this signature.
pub type ReduceCallback = fn(&mut [f32]) -> f32;

/// Opaque name of a compiled kernel, resolved by a backend's registry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KernelId(String);

impl KernelId {
    pub fn new(name: impl Into<String>) -> Self {
        KernelId(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KernelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for KernelId {
    fn from(name: &str) -> Self {
        KernelId::new(name)
    }
}

/// What a backend hands back once the kernel window has closed
#[derive(Debug, Clone)]
pub struct DeviceOutput {
    /// One product per input element, copied off the device
    pub products: Vec<f32>,
    /// Time between dispatch and completion
    pub kernel_time: Duration,
}

/// Capability interface for a parallel compute backend
pub trait Accelerator: Send + Sync {
    /// Backend identifier, e.g. `"cpu"` or `"metal"`
    fn name(&self) -> &'static str;

    /// Run `kernel` over `a` and `b` with the given geometry and block until
    /// it completes. Device resources acquired here are released before
    /// returning, on success and on failure.
    fn submit(
        &self,
        kernel: &KernelId,
        a: &[f32],
        b: &[f32],
        geometry: &LaunchGeometry,
    ) -> Result<DeviceOutput>;
}

/// Result of one harness run
#[derive(Debug, Clone)]
pub struct HarnessOutcome {
    /// Reduced device result and the CPU reference
    pub pair: ResultPair,
    /// Duration of the kernel window
    pub kernel_time: Duration,
    /// Name of the backend that ran the kernel
    pub backend: &'static str,
}

/// Run `kernel` on `backend` and validate it against the `f64` reference
///
/// Length mismatches and invalid geometry are rejected before the backend
/// is touched. Device failures are returned as-is; there is no retry. A
/// backend that hands back the wrong number of products fails the call
/// with [`DotError::LaunchFailed`].
pub fn run_on_accelerator<R>(
    backend: &dyn Accelerator,
    a: &[f32],
    b: &[f32],
    reduce: R,
    geometry: &LaunchGeometry,
    kernel: &KernelId,
) -> Result<HarnessOutcome>
where
    R: FnOnce(&mut [f32]) -> f32,
{
    check_lengths(a, b)?;
    geometry.validate()?;

    debug!(
        backend = backend.name(),
        kernel = %kernel,
        n = a.len(),
        grid = ?geometry.grid(),
        group = ?geometry.group(),
        "submitting kernel"
    );

    let mut output = backend.submit(kernel, a, b, geometry).map_err(|err| {
        warn!(backend = backend.name(), kernel = %kernel, error = %err, "kernel invocation failed");
        err
    })?;

    if output.products.len() != a.len() {
        let err = DotError::LaunchFailed(format!(
            "expected {} products, got {}",
            a.len(),
            output.products.len()
        ));
        warn!(
            backend = backend.name(),
            kernel = %kernel,
            error = %err,
            "kernel output has the wrong length"
        );
        return Err(err);
    }

    let approx = reduce(&mut output.products);
    let reference = reference_dot_unchecked(a, b);
    debug!(approx, reference, kernel_time = ?output.kernel_time, "kernel completed");

    Ok(HarnessOutcome {
        pair: ResultPair::new(approx, reference),
        kernel_time: output.kernel_time,
        backend: backend.name(),
    })
}

/// Device result checked against the CPU tree reduction of the same inputs
#[derive(Debug, Clone)]
pub struct CrossCheck {
    pub device: HarnessOutcome,
    pub cpu: ResultPair,
    /// `|device - cpu| <= atol + rtol * |cpu|` with the config tolerances
    pub within_tolerance: bool,
}

/// Run the harness and compare its result with [`TreeStrategy`] on the CPU
pub fn validate_against_cpu<R>(
    backend: &dyn Accelerator,
    a: &[f32],
    b: &[f32],
    reduce: R,
    geometry: &LaunchGeometry,
    kernel: &KernelId,
    config: &DotConfig,
) -> Result<CrossCheck>
where
    R: FnOnce(&mut [f32]) -> f32,
{
    let device = run_on_accelerator(backend, a, b, reduce, geometry, kernel)?;
    let cpu = TreeStrategy::new().compute(a, b)?;

    let diff = (device.pair.approx as f64 - cpu.approx as f64).abs();
    let within_tolerance = diff <= config.atol + config.rtol * (cpu.approx as f64).abs();
    if !within_tolerance {
        warn!(
            device = device.pair.approx,
            cpu = cpu.approx,
            diff,
            "device result outside tolerance"
        );
    }

    Ok(CrossCheck {
        device,
        cpu,
        within_tolerance,
    })
}

/// The best backend for this machine: Metal when a device exists, CPU otherwise
pub fn default_accelerator() -> Box<dyn Accelerator> {
    #[cfg(all(target_arch = "aarch64", target_os = "macos"))]
    {
        match MetalAccelerator::new() {
            Ok(backend) => return Box::new(backend),
            Err(err) => debug!(error = %err, "falling back to the cpu backend"),
        }
    }
    Box::new(CpuAccelerator::new())
}
