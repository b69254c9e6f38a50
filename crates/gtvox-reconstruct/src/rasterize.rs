//! Occupancy rasterization.

use glam::DVec3;
use gtvox_core::{GridBounds, GtError, OccupancyConfig, Result};
use gtvox_structures::{OccupancyGrid, PointCloud};

/// Bins point clouds into occupancy grids.
#[derive(Debug, Clone)]
pub struct OccupancyRasterizer {
    config: OccupancyConfig,
}

impl OccupancyRasterizer {
    pub fn new(config: OccupancyConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &OccupancyConfig {
        &self.config
    }

    /// Allocates an empty grid for `cloud` under the configured bounds.
    ///
    /// Extent bounds span the axis-aligned box of the cloud's non-marker points
    /// and fail on an empty cloud. An axis on which every point shares one
    /// coordinate has no cells, so such a grid stays empty; this is logged as a
    /// warning rather than padded.
    pub fn grid_for(&self, cloud: &PointCloud) -> Result<OccupancyGrid> {
        match self.config.bounds {
            GridBounds::Fixed {
                half_extent_xy,
                half_extent_z,
            } => OccupancyGrid::symmetric(
                DVec3::new(half_extent_xy, half_extent_xy, half_extent_z),
                self.config.voxel_size,
            ),
            GridBounds::Extent => {
                let mut points = cloud.points().iter().filter(|p| !p.is_marker());
                let first = points
                    .next()
                    .ok_or(GtError::EmptyPointSet("extent-bounded rasterization"))?
                    .position;
                let (min, max) = points.fold((first, first), |(min, max), p| {
                    (min.min(p.position), max.max(p.position))
                });
                let grid =
                    OccupancyGrid::new(min.as_dvec3(), max.as_dvec3(), self.config.voxel_size)?;
                // A flat axis gives zero cells; every point is then dropped
                if grid.num_cells() == 0 {
                    log::warn!(
                        "extent bounds {min} .. {max} are flat on some axis; grid {:?} has no cells",
                        grid.dims()
                    );
                }
                Ok(grid)
            }
        }
    }

    /// Rasterizes `cloud`. Points outside the grid are dropped; markers are skipped.
    pub fn rasterize(&self, cloud: &PointCloud) -> Result<OccupancyGrid> {
        let mut grid = self.grid_for(cloud)?;
        let mut dropped = 0_usize;
        for point in cloud.points().iter().filter(|p| !p.is_marker()) {
            if !grid.occupy(point.position) {
                dropped += 1;
            }
        }
        let [nx, ny, nz] = grid.dims();
        log::debug!(
            "rasterized {} points into {}x{}x{} grid, {} occupied, {} outside bounds",
            cloud.len(),
            nx,
            ny,
            nz,
            grid.occupied_count(),
            dropped
        );
        Ok(grid)
    }
}
