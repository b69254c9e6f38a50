//! gtvox: ground-truth voxel occupancy from a depth-camera rig and a lidar.
//!
//! Each simulation tick, four depth cameras facing front, right, left and back
//! are reprojected into one world-space cloud. The cloud is fused, downsampled
//! and reconciled with an independently captured lidar sweep, then rasterized
//! into a fixed-resolution occupancy grid usable as training labels.
//!
//! # Quick Start
//!
//! ```no_run
//! use gtvox::*;
//!
//! fn main() -> gtvox::Result<()> {
//!     init_logging();
//!
//!     let config = PipelineConfig::for_mode(OperatingMode::Aligned);
//!     let mut sim = ReplaySimulator::open("recording")?;
//!     let summary = run(&mut sim, &config, &StopSignal::new())?;
//!     println!("{} frames written", summary.processed);
//!     Ok(())
//! }
//! ```
//!
//! # Crates
//!
//! - `gtvox-core` - errors, configuration and tagged points
//! - `gtvox-structures` - depth frames, calibration, clouds and grids
//! - `gtvox-reconstruct` - the reconstruction stages
//! - `gtvox` (this crate) - sensor streams, tick loop, export and replay

// Type casts in export code are intentional
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
// Documentation lints
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod export;
pub mod pipeline;
pub mod replay;
pub mod sensor;

pub use error::{Error, ExportError, Result};
pub use export::{
    log_depth_grey, save_bgra_png, save_depth_png, save_grid_npz, save_ply, write_ply,
    ArtifactWriter,
};
pub use pipeline::{
    run, sensor_streams, FrameOutput, FramePipeline, RunSummary, SensorSinks, SensorStreams,
    Simulator, TickFrames,
};
pub use replay::{CameraRecord, ReplaySimulator, TickManifest};
pub use sensor::{
    sensor_channel, ActorGuard, CameraFrame, LidarFrame, SensorActor, SensorId, SensorSink,
    SensorStream, StopSignal,
};

// Re-export the lower crates
pub use gtvox_core::{
    AlignmentStrategy, CameraAttributes, Color, ColoredPoint, DepthDecodeConfig, GridBounds,
    GtError, LidarAttributes, MountTransform, OccupancyConfig, OperatingMode, OutputConfig,
    PipelineConfig, PointSource, SensorRigConfig, ServerSettings,
};
pub use gtvox_core::{DVec3, Mat3, Mat4, Vec3};
pub use gtvox_reconstruct::{
    fuse, fuse_rig, reconcile, DepthReprojector, DepthView, LidarAligner, LidarAlignment,
    OccupancyRasterizer, Reconciled, RigClouds, VoxelDownsampler,
};
pub use gtvox_structures::{
    BgraImage, CameraCalibration, DepthFrame, Extrinsic, Intrinsic, LidarSweep, OccupancyGrid,
    PointCloud,
};

/// Initializes `env_logger` at `info` unless `RUST_LOG` says otherwise.
///
/// Safe to call more than once; later calls do nothing.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
