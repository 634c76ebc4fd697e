//! Centralized constants for the dotprec library
//!
//! This module contains all hardcoded constants used throughout the codebase.
//! All new constants should be added here rather than scattered throughout the code.
//! Constants are organized by category for easy reference and maintenance.

// ============================================================================
// ARCHITECTURE-SPECIFIC CONSTANTS
// ============================================================================

/// Vector width in bytes for AVX-512 architecture
pub const AVX512_VECTOR_WIDTH_BYTES: usize = 64;

/// Vector width in bytes for AVX2 architecture
pub const AVX2_VECTOR_WIDTH_BYTES: usize = 32;

/// Vector width in bytes for ARM NEON architecture
pub const NEON_VECTOR_WIDTH_BYTES: usize = 16;

/// Vector width in bytes for generic/scalar processing
pub const SCALAR_VECTOR_WIDTH_BYTES: usize = 8;

/// Alignment of intermediate product buffers (one cache line)
pub const PRODUCT_BUFFER_ALIGN: usize = 64;

/// Largest lane count accepted by the segmented reduction
pub const MAX_LANES: usize = 64;

// ============================================================================
// VALIDATION TOLERANCES
// ============================================================================

/// Default relative tolerance when comparing an approximation to its reference
pub const DEFAULT_RTOL: f64 = 1e-5;

/// Default absolute tolerance when comparing an approximation to its reference
pub const DEFAULT_ATOL: f64 = 1e-8;

// ============================================================================
// ACCELERATOR CONSTANTS
// ============================================================================

/// Name of the element-wise multiply kernel registered on every backend
pub const DOT_PRODUCT_KERNEL: &str = "dot_product_mul";

/// Maximum threads per group accepted by the CPU-emulated backend
pub const CPU_MAX_THREADS_PER_GROUP: u32 = 1024;

// ============================================================================
// ENVIRONMENT OVERRIDES
// ============================================================================

/// Overrides the lane count of the segmented reduction
pub const ENV_LANES: &str = "DOTPREC_LANES";

/// Overrides the worker count of the atomic reduction
pub const ENV_WORKERS: &str = "DOTPREC_WORKERS";
