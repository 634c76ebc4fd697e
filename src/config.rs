//! Configuration and system parameters for the reduction strategies

use crate::constants::{
    AVX2_VECTOR_WIDTH_BYTES, AVX512_VECTOR_WIDTH_BYTES, DEFAULT_ATOL, DEFAULT_RTOL, ENV_LANES,
    ENV_WORKERS, MAX_LANES, NEON_VECTOR_WIDTH_BYTES, SCALAR_VECTOR_WIDTH_BYTES,
};
use tracing::warn;

/// The target architecture for performance optimization
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Architecture {
    /// Intel/AMD x86_64 with AVX-512 support
    X86WithAVX512,
    /// Intel/AMD x86_64 without AVX-512 support
    X86WithoutAVX512,
    /// ARM architecture with NEON support (e.g., Apple Silicon)
    ArmNeon,
    /// Generic implementation for any architecture
    Generic,
}

impl Architecture {
    /// Check if this architecture has SIMD support
    pub fn has_simd_support(&self) -> bool {
        !matches!(self, Architecture::Generic)
    }

    /// Get the vector width in bytes for this architecture
    pub fn vector_width_bytes(&self) -> usize {
        match self {
            Architecture::X86WithAVX512 => AVX512_VECTOR_WIDTH_BYTES,
            Architecture::X86WithoutAVX512 => AVX2_VECTOR_WIDTH_BYTES,
            Architecture::ArmNeon => NEON_VECTOR_WIDTH_BYTES,
            Architecture::Generic => SCALAR_VECTOR_WIDTH_BYTES,
        }
    }

    /// Number of `f32` lanes in one vector register
    pub fn f32_lanes(&self) -> usize {
        self.vector_width_bytes() / std::mem::size_of::<f32>()
    }
}

/// Detects the current CPU architecture
pub fn detect_architecture() -> Architecture {
    #[cfg(all(target_arch = "aarch64", target_os = "macos"))]
    {
        // Apple Silicon always has NEON
        return Architecture::ArmNeon;
    }

    #[cfg(target_arch = "x86_64")]
    {
        #[cfg(target_feature = "avx512f")]
        {
            return Architecture::X86WithAVX512;
        }
        #[cfg(not(target_feature = "avx512f"))]
        {
            if std::is_x86_feature_detected!("avx512f") {
                return Architecture::X86WithAVX512;
            } else {
                return Architecture::X86WithoutAVX512;
            }
        }
    }

    #[cfg(all(target_arch = "aarch64", not(target_os = "macos")))]
    {
        return Architecture::ArmNeon;
    }

    #[allow(unreachable_code)]
    Architecture::Generic
}

/// Configuration for the reduction strategies and result validation
#[derive(Debug, Clone)]
pub struct DotConfig {
    /// Target architecture, used to derive the lane count
    pub architecture: Architecture,

    /// Number of independent accumulators in the segmented reduction
    pub lanes: usize,

    /// Number of concurrent workers in the atomic reduction
    pub n_workers: usize,

    /// Relative tolerance for `ResultPair::is_close`
    pub rtol: f64,

    /// Absolute tolerance for `ResultPair::is_close`
    pub atol: f64,
}

impl Default for DotConfig {
    fn default() -> Self {
        Self::for_architecture(detect_architecture())
    }
}

impl DotConfig {
    /// Create a config optimized for a specific architecture
    pub fn for_architecture(arch: Architecture) -> Self {
        Self {
            architecture: arch,
            lanes: arch.f32_lanes(),
            n_workers: num_cpus::get(),
            rtol: DEFAULT_RTOL,
            atol: DEFAULT_ATOL,
        }
    }

    /// Default config with `DOTPREC_LANES` / `DOTPREC_WORKERS` overrides applied
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(lanes) = read_env_count(ENV_LANES, MAX_LANES) {
            config.lanes = lanes;
        }
        if let Some(workers) = read_env_count(ENV_WORKERS, usize::MAX) {
            config.n_workers = workers;
        }
        config
    }

    /// Builder-style override of the lane count
    pub fn with_lanes(mut self, lanes: usize) -> Self {
        self.lanes = lanes.clamp(1, MAX_LANES);
        self
    }

    /// Builder-style override of the worker count
    pub fn with_workers(mut self, n_workers: usize) -> Self {
        self.n_workers = n_workers.max(1);
        self
    }
}

fn read_env_count(key: &str, max: usize) -> Option<usize> {
    let raw = std::env::var(key).ok()?;
    parse_count(&raw, max).or_else(|| {
        warn!(key, value = %raw, "ignoring invalid environment override");
        None
    })
}

/// Parses a positive count no larger than `max`
pub(crate) fn parse_count(raw: &str, max: usize) -> Option<usize> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n >= 1 && n <= max => Some(n),
        _ => None,
    }
}
