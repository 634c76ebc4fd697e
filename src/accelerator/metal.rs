//! Metal GPU backend using the metal-rs crate
//!
//! Kernels are resolved by name from a registry of library files
//! (`.metallib`) or inline shader sources. The device and command queue are
//! shared for the lifetime of the backend. Pipelines are compiled on the
//! first submission of a kernel and cached until it is re-registered;
//! buffers are created per submission and released when it returns.

#![cfg(all(target_arch = "aarch64", target_os = "macos"))]

use super::{Accelerator, DeviceOutput, KernelId, LaunchGeometry};
use crate::constants::DOT_PRODUCT_KERNEL;
use crate::error::{DotError, Result};
use metal::{
    Buffer, CommandQueue, CompileOptions, ComputePipelineState, Device, Library,
    MTLCommandBufferStatus, MTLResourceOptions, MTLSize,
};
use std::collections::HashMap;
use std::mem;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Instant;
use tracing::debug;

/// Shader source of the built-in element-wise multiply kernel
const DOT_PRODUCT_SOURCE: &str = include_str!("kernels/dot_product.metal");

/// Where a registered kernel comes from
#[derive(Debug, Clone)]
pub enum KernelSource {
    /// A precompiled `.metallib` file and the function to load from it
    LibraryFile { path: PathBuf, function: String },
    /// Metal shading language source compiled at submission time
    Source { source: String, function: String },
}

impl KernelSource {
    fn function(&self) -> &str {
        match self {
            KernelSource::LibraryFile { function, .. } => function,
            KernelSource::Source { function, .. } => function,
        }
    }

    fn load(&self, device: &Device) -> Result<Library> {
        match self {
            KernelSource::LibraryFile { path, .. } => device
                .new_library_with_file(path)
                .map_err(DotError::PipelineCreation),
            KernelSource::Source { source, .. } => device
                .new_library_with_source(source, &CompileOptions::new())
                .map_err(DotError::PipelineCreation),
        }
    }
}

/// Accelerator backend running kernels on the system default Metal device
pub struct MetalAccelerator {
    device: Device,
    command_queue: CommandQueue,
    kernels: Mutex<HashMap<KernelId, KernelSource>>,
    pipelines: Mutex<HashMap<KernelId, ComputePipelineState>>,
}

// Safety: Metal devices and command queues are thread-safe
unsafe impl Send for MetalAccelerator {}
unsafe impl Sync for MetalAccelerator {}

impl MetalAccelerator {
    /// Create a backend on the default device with the built-in kernel registered
    pub fn new() -> Result<Self> {
        let device = Device::system_default().ok_or(DotError::DeviceUnavailable)?;
        let command_queue = device.new_command_queue();

        let backend = MetalAccelerator {
            device,
            command_queue,
            kernels: Mutex::new(HashMap::new()),
            pipelines: Mutex::new(HashMap::new()),
        };
        backend.register(
            KernelId::new(DOT_PRODUCT_KERNEL),
            KernelSource::Source {
                source: DOT_PRODUCT_SOURCE.to_string(),
                function: DOT_PRODUCT_KERNEL.to_string(),
            },
        )?;
        Ok(backend)
    }

    /// Check if a Metal device is present
    pub fn is_available() -> bool {
        Device::system_default().is_some()
    }

    /// Register (or replace) a kernel under `id`, dropping any cached pipeline for it
    pub fn register(&self, id: KernelId, source: KernelSource) -> Result<()> {
        // Never hold both locks: `pipeline` takes the cache before the registry
        self.kernels
            .lock()
            .map_err(|_| DotError::LaunchFailed("kernel registry poisoned".into()))?
            .insert(id.clone(), source);
        self.pipelines
            .lock()
            .map_err(|_| DotError::LaunchFailed("pipeline cache poisoned".into()))?
            .remove(&id);
        Ok(())
    }

    /// Number of kernels with a compiled pipeline in the cache
    pub fn cached_pipelines(&self) -> usize {
        self.pipelines.lock().map(|p| p.len()).unwrap_or(0)
    }

    fn resolve(&self, id: &KernelId) -> Result<KernelSource> {
        let kernels = self
            .kernels
            .lock()
            .map_err(|_| DotError::LaunchFailed("kernel registry poisoned".into()))?;
        kernels
            .get(id)
            .cloned()
            .ok_or_else(|| DotError::KernelNotFound(id.to_string()))
    }

    fn pipeline(&self, id: &KernelId) -> Result<ComputePipelineState> {
        let mut pipelines = self
            .pipelines
            .lock()
            .map_err(|_| DotError::LaunchFailed("pipeline cache poisoned".into()))?;
        if let Some(pipeline) = pipelines.get(id) {
            return Ok(pipeline.clone());
        }

        let source = self.resolve(id)?;
        let pipeline = self.compile(&source)?;
        debug!(kernel = %id, "compiled metal pipeline");
        pipelines.insert(id.clone(), pipeline.clone());
        Ok(pipeline)
    }

    fn compile(&self, source: &KernelSource) -> Result<ComputePipelineState> {
        let library = source.load(&self.device)?;
        let function = library
            .get_function(source.function(), None)
            .map_err(|_| DotError::KernelNotFound(source.function().to_string()))?;
        self.device
            .new_compute_pipeline_state_with_function(&function)
            .map_err(DotError::PipelineCreation)
    }

    fn input_buffer(&self, data: &[f32]) -> Result<Buffer> {
        // Metal refuses zero-length buffers
        let placeholder = [0.0f32];
        let data = if data.is_empty() { &placeholder[..] } else { data };
        let bytes = mem::size_of_val(data);
        let buffer = self.device.new_buffer_with_data(
            data.as_ptr() as *const _,
            bytes as u64,
            MTLResourceOptions::StorageModeShared,
        );
        checked(buffer, bytes)
    }
}

fn checked(buffer: Buffer, bytes: usize) -> Result<Buffer> {
    if buffer.contents().is_null() {
        return Err(DotError::BufferAllocation(bytes));
    }
    Ok(buffer)
}

fn mtl_size(dims: [u32; 3]) -> MTLSize {
    MTLSize::new(dims[0] as u64, dims[1] as u64, dims[2] as u64)
}

impl Accelerator for MetalAccelerator {
    fn name(&self) -> &'static str {
        "metal"
    }

    fn submit(
        &self,
        kernel: &KernelId,
        a: &[f32],
        b: &[f32],
        geometry: &LaunchGeometry,
    ) -> Result<DeviceOutput> {
        let pipeline = self.pipeline(kernel)?;

        let max_threads = pipeline.max_total_threads_per_threadgroup() as usize;
        if geometry.threads_per_group() > max_threads {
            return Err(DotError::LaunchFailed(format!(
                "{} threads per group exceeds the pipeline limit of {}",
                geometry.threads_per_group(),
                max_threads
            )));
        }

        let n = a.len();
        let n_u32 = u32::try_from(n)
            .map_err(|_| DotError::BufferAllocation(n * mem::size_of::<f32>()))?;
        let out_bytes = (n.max(1) * mem::size_of::<f32>()) as u64;

        let a_buffer = self.input_buffer(a)?;
        let b_buffer = self.input_buffer(b)?;
        let out_buffer = checked(
            self.device
                .new_buffer(out_bytes, MTLResourceOptions::StorageModeShared),
            out_bytes as usize,
        )?;

        debug!(kernel = %kernel, n, max_threads, "metal kernel dispatch");

        let command_buffer = self.command_queue.new_command_buffer();
        let encoder = command_buffer.new_compute_command_encoder();
        encoder.set_compute_pipeline_state(&pipeline);
        encoder.set_buffer(0, Some(&a_buffer), 0);
        encoder.set_buffer(1, Some(&b_buffer), 0);
        encoder.set_buffer(2, Some(&out_buffer), 0);
        encoder.set_bytes(
            3,
            mem::size_of::<u32>() as u64,
            &n_u32 as *const u32 as *const _,
        );
        encoder.dispatch_thread_groups(mtl_size(geometry.grid()), mtl_size(geometry.group()));
        encoder.end_encoding();

        let start = Instant::now();
        command_buffer.commit();
        command_buffer.wait_until_completed();
        let kernel_time = start.elapsed();

        if matches!(command_buffer.status(), MTLCommandBufferStatus::Error) {
            return Err(DotError::LaunchFailed(format!(
                "command buffer for kernel {} finished with an error",
                kernel
            )));
        }

        let out_ptr = out_buffer.contents() as *const f32;
        let products = unsafe { std::slice::from_raw_parts(out_ptr, n).to_vec() };

        Ok(DeviceOutput {
            products,
            kernel_time,
        })
    }
}
