//! Error type shared by the reduction strategies and the accelerator harness

use thiserror::Error;

/// Errors that can occur while computing or validating a dot product
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DotError {
    /// The two input vectors differ in length
    #[error("vector length mismatch: left has {left} elements, right has {right}")]
    LengthMismatch { left: usize, right: usize },

    /// A launch geometry dimension is zero
    #[error("invalid {which} geometry {dims:?}: every dimension must be positive")]
    InvalidGeometry { which: &'static str, dims: [u32; 3] },

    /// The kernel name is not known to the backend's registry
    #[error("kernel not found: {0}")]
    KernelNotFound(String),

    /// No accelerator device could be acquired
    #[error("accelerator device not available")]
    DeviceUnavailable,

    /// A device buffer could not be allocated
    #[error("buffer allocation failed with size {0} bytes")]
    BufferAllocation(usize),

    /// The kernel library or pipeline could not be built
    #[error("pipeline creation failed: {0}")]
    PipelineCreation(String),

    /// The kernel was rejected or failed during execution
    #[error("kernel launch failed: {0}")]
    LaunchFailed(String),
}

impl DotError {
    /// Whether the error came from device resources rather than caller input
    pub fn is_resource_failure(&self) -> bool {
        matches!(
            self,
            DotError::KernelNotFound(_)
                | DotError::DeviceUnavailable
                | DotError::BufferAllocation(_)
                | DotError::PipelineCreation(_)
                | DotError::LaunchFailed(_)
        )
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, DotError>;

/// Fail fast when the two vectors cannot be paired element by element
pub fn check_lengths(a: &[f32], b: &[f32]) -> Result<()> {
    if a.len() != b.len() {
        return Err(DotError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    Ok(())
}
