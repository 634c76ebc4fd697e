//! Launch geometry for accelerator kernels

use crate::error::{DotError, Result};

/// Grid and thread-group shape of a kernel launch
///
/// `grid` is the number of thread groups per dimension and `group` the
/// number of threads per group, matching a Metal `dispatchThreadgroups`
/// call. Every dimension is non-zero; the only way to build one is through
/// [`LaunchGeometry::new`], which rejects zeros before any device work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchGeometry {
    grid: [u32; 3],
    group: [u32; 3],
}

impl LaunchGeometry {
    pub fn new(grid: [u32; 3], group: [u32; 3]) -> Result<Self> {
        let geometry = Self { grid, group };
        geometry.validate()?;
        Ok(geometry)
    }

    /// One group of `threads` threads: `grid = [1, 1, 1]`, `group = [threads, 1, 1]`
    pub fn single_group(threads: u32) -> Result<Self> {
        Self::new([1, 1, 1], [threads, 1, 1])
    }

    /// Enough groups of `group_size` threads to give every element its own thread
    pub fn covering(n: usize, group_size: u32) -> Result<Self> {
        if group_size == 0 {
            return Err(DotError::InvalidGeometry {
                which: "group",
                dims: [group_size, 1, 1],
            });
        }
        let groups = n.div_ceil(group_size as usize).max(1);
        let groups = u32::try_from(groups).map_err(|_| {
            DotError::LaunchFailed(format!("{} elements need too many thread groups", n))
        })?;
        Self::new([groups, 1, 1], [group_size, 1, 1])
    }

    /// Check that no dimension is zero
    pub fn validate(&self) -> Result<()> {
        if self.grid.contains(&0) {
            return Err(DotError::InvalidGeometry {
                which: "grid",
                dims: self.grid,
            });
        }
        if self.group.contains(&0) {
            return Err(DotError::InvalidGeometry {
                which: "group",
                dims: self.group,
            });
        }
        Ok(())
    }

    pub fn grid(&self) -> [u32; 3] {
        self.grid
    }

    pub fn group(&self) -> [u32; 3] {
        self.group
    }

    /// Number of thread groups in the grid
    pub fn total_groups(&self) -> usize {
        product(self.grid)
    }

    /// Number of threads in one group
    pub fn threads_per_group(&self) -> usize {
        product(self.group)
    }

    /// Number of threads in the whole launch
    pub fn total_threads(&self) -> usize {
        self.total_groups().saturating_mul(self.threads_per_group())
    }
}

fn product(dims: [u32; 3]) -> usize {
    dims.iter()
        .fold(1usize, |acc, &d| acc.saturating_mul(d as usize))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_geometry() {
        let g = LaunchGeometry::new([2, 3, 1], [8, 4, 2]).unwrap();
        assert_eq!(g.total_groups(), 6);
        assert_eq!(g.threads_per_group(), 64);
        assert_eq!(g.total_threads(), 384);
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert_eq!(
            LaunchGeometry::new([1, 0, 1], [1, 1, 1]),
            Err(DotError::InvalidGeometry {
                which: "grid",
                dims: [1, 0, 1]
            })
        );
        assert_eq!(
            LaunchGeometry::new([1, 1, 1], [1, 1, 0]),
            Err(DotError::InvalidGeometry {
                which: "group",
                dims: [1, 1, 0]
            })
        );
        assert!(LaunchGeometry::single_group(0).is_err());
        assert!(LaunchGeometry::covering(10, 0).is_err());
    }

    #[test]
    fn test_covering() {
        let g = LaunchGeometry::covering(1000, 256).unwrap();
        assert_eq!(g.grid(), [4, 1, 1]);
        assert_eq!(g.group(), [256, 1, 1]);

        // An empty input still needs a launchable geometry
        let g = LaunchGeometry::covering(0, 64).unwrap();
        assert_eq!(g.grid(), [1, 1, 1]);
    }

    #[test]
    fn test_total_threads_saturates() {
        let g = LaunchGeometry::new([u32::MAX; 3], [u32::MAX; 3]).unwrap();
        assert_eq!(g.total_threads(), usize::MAX);
    }
}
