//! Core types for gtvox.
//!
//! This crate provides the pieces shared by every stage of the ground-truth pipeline:
//! - [`GtError`] and the crate-wide [`Result`] alias
//! - [`PipelineConfig`] and the sensor presets handed to sensor setup
//! - [`ColoredPoint`], [`Color`] and [`PointSource`] for tagged points
//! - Rigid rotation helpers used by the lidar alignment

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]

pub mod config;
pub mod error;
pub mod geometry;
pub mod point;

pub use config::{
    AlignmentStrategy, CameraAttributes, DepthDecodeConfig, GridBounds, LidarAttributes,
    MountTransform, OccupancyConfig, OperatingMode, OutputConfig, PipelineConfig,
    SensorRigConfig, ServerSettings,
};
pub use error::{GtError, Result};
pub use geometry::{centroid, rotate_about_origin, yaw_rotation};
pub use point::{Color, ColoredPoint, PointSource};

// Re-export glam types for convenience
pub use glam::{DVec3, Mat3, Mat4, Vec3, Vec4};
