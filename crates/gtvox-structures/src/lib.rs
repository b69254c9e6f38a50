//! Data model for gtvox.
//!
//! This crate provides the values flowing through the ground-truth pipeline:
//! - Depth frames decoded from raw sensor buffers
//! - Camera intrinsics and extrinsics
//! - Tagged point clouds
//! - Raw lidar sweeps
//! - Occupancy grids

// Geometry code intentionally uses casts for indices and coordinates
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]

pub mod camera;
pub mod depth_frame;
pub mod lidar_sweep;
pub mod occupancy_grid;
pub mod point_cloud;

pub use camera::{CameraCalibration, Extrinsic, Intrinsic};
pub use depth_frame::{BgraImage, DepthFrame};
pub use lidar_sweep::LidarSweep;
pub use occupancy_grid::OccupancyGrid;
pub use point_cloud::PointCloud;
