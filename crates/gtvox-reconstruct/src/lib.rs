//! Reconstruction stages for gtvox.
//!
//! One frame flows through the stages in this order:
//! 1. [`DepthReprojector`] turns each rig camera's depth frame into world points
//! 2. [`fuse_rig`] concatenates the four views and recentres them
//! 3. [`VoxelDownsampler`] keeps one representative per voxel
//! 4. [`LidarAligner`] brings the lidar sweep into the same frame
//! 5. [`reconcile`] translates the ground truth onto the lidar origin and strips markers
//! 6. [`OccupancyRasterizer`] bins the result into an occupancy grid

// Geometry code intentionally uses casts for indices and coordinates
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::missing_errors_doc)]

pub mod downsample;
pub mod fuse;
pub mod lidar_align;
pub mod rasterize;
pub mod reconcile;
pub mod reproject;

pub use downsample::VoxelDownsampler;
pub use fuse::{fuse, fuse_rig, RigClouds};
pub use lidar_align::{LidarAligner, LidarAlignment};
pub use rasterize::OccupancyRasterizer;
pub use reconcile::{reconcile, Reconciled};
pub use reproject::{DepthReprojector, DepthView};
