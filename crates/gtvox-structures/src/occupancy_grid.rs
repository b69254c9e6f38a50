//! Occupancy grid structure for regular 3D voxel lattices.

use glam::{DVec3, Vec3};
use gtvox_core::{GtError, Result};

/// A dense 3D grid of single-byte occupancy flags.
///
/// `OccupancyGrid` represents an axis-aligned voxel lattice defined by:
/// - A bounding box (min and max corners in world space)
/// - A voxel edge length
///
/// Dimensions are `ceil((bound_max - bound_min) / voxel_size)` per axis. Cells are
/// stored C-contiguously: cell `(i, j, k)` lives at `(i * ny + j) * nz + k`.
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyGrid {
    dims: [usize; 3],
    bound_min: DVec3,
    bound_max: DVec3,
    voxel_size: f64,
    data: Vec<u8>,
}

impl OccupancyGrid {
    /// Creates an empty grid covering `[bound_min, bound_max)`.
    ///
    /// # Arguments
    /// * `bound_min` - Minimum corner of the grid bounding box
    /// * `bound_max` - Maximum corner of the grid bounding box
    /// * `voxel_size` - Edge length of one voxel
    pub fn new(bound_min: DVec3, bound_max: DVec3, voxel_size: f64) -> Result<Self> {
        if !(voxel_size.is_finite() && voxel_size > 0.0) {
            return Err(GtError::InvalidConfig(format!(
                "voxel size must be positive, got {voxel_size}"
            )));
        }
        if !(bound_min.is_finite() && bound_max.is_finite()) || bound_max.cmplt(bound_min).any() {
            return Err(GtError::InvalidConfig(format!(
                "invalid grid bounds {bound_min} .. {bound_max}"
            )));
        }

        let extent = ((bound_max - bound_min) / voxel_size).ceil();
        let dims = [extent.x as usize, extent.y as usize, extent.z as usize];

        // Check for potential overflow in data allocation
        let len = dims[0]
            .checked_mul(dims[1])
            .and_then(|n| n.checked_mul(dims[2]))
            .ok_or_else(|| {
                GtError::InvalidConfig("grid dimensions too large, would overflow".to_string())
            })?;

        Ok(Self {
            dims,
            bound_min,
            bound_max,
            voxel_size,
            data: vec![0; len],
        })
    }

    /// Creates a grid symmetric about the origin.
    pub fn symmetric(half_extent: DVec3, voxel_size: f64) -> Result<Self> {
        Self::new(-half_extent, half_extent, voxel_size)
    }

    /// Returns the number of cells along each axis.
    #[must_use]
    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    /// Returns the total number of cells.
    #[must_use]
    pub fn num_cells(&self) -> usize {
        self.data.len()
    }

    /// Returns the minimum bound.
    #[must_use]
    pub fn bound_min(&self) -> DVec3 {
        self.bound_min
    }

    /// Returns the maximum bound.
    #[must_use]
    pub fn bound_max(&self) -> DVec3 {
        self.bound_max
    }

    /// Returns the voxel edge length.
    #[must_use]
    pub fn voxel_size(&self) -> f64 {
        self.voxel_size
    }

    /// Flattens a 3D cell index to a linear index.
    #[must_use]
    pub fn flatten_index(&self, i: usize, j: usize, k: usize) -> usize {
        (i * self.dims[1] + j) * self.dims[2] + k
    }

    /// Unflattens a linear index to a 3D cell index.
    #[must_use]
    pub fn unflatten_index(&self, idx: usize) -> [usize; 3] {
        let k = idx % self.dims[2];
        let j = (idx / self.dims[2]) % self.dims[1];
        let i = idx / (self.dims[1] * self.dims[2]);
        [i, j, k]
    }

    /// Cell containing `p`: `floor((p - bound_min) / voxel_size)`.
    ///
    /// Returns `None` when the index falls outside the grid on any axis, which
    /// includes points lying exactly on the max bound.
    #[must_use]
    pub fn cell_of(&self, p: Vec3) -> Option<[usize; 3]> {
        let idx = ((p.as_dvec3() - self.bound_min) / self.voxel_size).floor();
        let mut out = [0_usize; 3];
        for (axis, value) in idx.to_array().into_iter().enumerate() {
            if !(value >= 0.0 && value < self.dims[axis] as f64) {
                return None;
            }
            out[axis] = value as usize;
        }
        Some(out)
    }

    /// Marks the cell containing `p` as occupied.
    ///
    /// Returns false (and changes nothing) if `p` is outside the grid.
    pub fn occupy(&mut self, p: Vec3) -> bool {
        match self.cell_of(p) {
            Some([i, j, k]) => {
                let idx = self.flatten_index(i, j, k);
                self.data[idx] = 1;
                true
            }
            None => false,
        }
    }

    /// Returns true if cell `(i, j, k)` is occupied.
    #[must_use]
    pub fn is_occupied(&self, i: usize, j: usize, k: usize) -> bool {
        self.data[self.flatten_index(i, j, k)] != 0
    }

    /// Number of occupied cells.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }

    /// Indices of all occupied cells in storage order.
    pub fn occupied_cells(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        self.data
            .iter()
            .enumerate()
            .filter(|(_, &v)| v != 0)
            .map(|(idx, _)| self.unflatten_index(idx))
    }

    /// World position of the centre of cell `(i, j, k)`.
    #[must_use]
    pub fn center_of_cell(&self, i: usize, j: usize, k: usize) -> DVec3 {
        self.bound_min + (DVec3::new(i as f64, j as f64, k as f64) + 0.5) * self.voxel_size
    }

    /// Raw flags in storage order.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the grid, returning its flags.
    #[must_use]
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}
