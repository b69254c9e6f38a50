//! Configuration for the ground-truth pipeline and the sensors feeding it.
//!
//! All settings are plain structs passed explicitly to the code that needs them.
//! They load from JSON; missing fields take the values of [`Default`].

use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{GtError, Result};

/// Whether the lidar sweep is reconciled with the camera-rig cloud.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OperatingMode {
    /// Align lidar and ground truth through marker points, fixed grid bounds.
    #[default]
    Aligned,
    /// Keep raw per-frame clouds, grid bounds from the point extents.
    Unaligned,
}

impl std::str::FromStr for OperatingMode {
    type Err = GtError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "aligned" => Ok(Self::Aligned),
            "unaligned" => Ok(Self::Unaligned),
            other => Err(GtError::InvalidConfig(format!("unknown mode '{other}'"))),
        }
    }
}

/// How the downsampled ground truth is translated onto the lidar frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentStrategy {
    /// Translate by `lidar_center - mean(ground-truth markers)`.
    #[default]
    MarkerCentroid,
    /// No translation; markers are still stripped.
    None,
}

/// Depth decoding parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthDecodeConfig {
    /// Distance in metres represented by a normalized depth of 1.
    pub far_plane_m: f32,
    /// Normalized depths at or above this value are "no return".
    pub max_normalized_depth: f32,
}

impl Default for DepthDecodeConfig {
    fn default() -> Self {
        Self {
            far_plane_m: 1000.0,
            max_normalized_depth: 1.0,
        }
    }
}

/// Bounding volume of the occupancy grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum GridBounds {
    /// Symmetric bounds around the origin.
    Fixed {
        half_extent_xy: f64,
        half_extent_z: f64,
    },
    /// Bounds taken from the component-wise min/max of the points.
    Extent,
}

impl Default for GridBounds {
    fn default() -> Self {
        Self::Fixed {
            half_extent_xy: 100.0,
            half_extent_z: 70.0,
        }
    }
}

/// Occupancy rasterization parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OccupancyConfig {
    /// Edge length of one grid voxel in metres.
    pub voxel_size: f64,
    /// Grid bounding volume.
    pub bounds: GridBounds,
}

impl Default for OccupancyConfig {
    fn default() -> Self {
        Self {
            voxel_size: 0.4,
            bounds: GridBounds::default(),
        }
    }
}

/// Where and what to write per frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root directory holding `rgb/`, `depth/`, `lidar/` and `ground_truth/`.
    pub root: PathBuf,
    /// Also write the aligned ground-truth cloud as PLY next to the grid.
    pub save_ground_truth_cloud: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("_out"),
            save_ground_truth_cloud: true,
        }
    }
}

/// Full pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub mode: OperatingMode,
    /// Voxel edge length used by the downsampler.
    pub leaf_size: f32,
    pub alignment: AlignmentStrategy,
    pub depth: DepthDecodeConfig,
    pub occupancy: OccupancyConfig,
    pub output: OutputConfig,
    pub rig: SensorRigConfig,
    pub server: ServerSettings,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::for_mode(OperatingMode::Aligned)
    }
}

impl PipelineConfig {
    /// Presets for an operating mode.
    pub fn for_mode(mode: OperatingMode) -> Self {
        match mode {
            OperatingMode::Aligned => Self {
                mode,
                leaf_size: 0.2,
                alignment: AlignmentStrategy::MarkerCentroid,
                depth: DepthDecodeConfig::default(),
                occupancy: OccupancyConfig::default(),
                output: OutputConfig::default(),
                rig: SensorRigConfig::default(),
                server: ServerSettings::default(),
            },
            OperatingMode::Unaligned => Self {
                mode,
                leaf_size: 0.1,
                alignment: AlignmentStrategy::None,
                depth: DepthDecodeConfig::default(),
                // Rasterized at the leaf size
                occupancy: OccupancyConfig {
                    voxel_size: 0.1,
                    bounds: GridBounds::Extent,
                },
                output: OutputConfig::default(),
                rig: SensorRigConfig {
                    camera: CameraAttributes {
                        motion_blur_intensity: 0.2,
                        ..CameraAttributes::default()
                    },
                    ..SensorRigConfig::default()
                },
                server: ServerSettings {
                    fixed_delta_seconds: 0.1,
                    ..ServerSettings::default()
                },
            },
        }
    }

    /// Loads a configuration from a JSON file and validates it.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        log::info!("loaded configuration from {}", path.as_ref().display());
        Ok(config)
    }

    /// Checks every scalar that must be strictly positive.
    pub fn validate(&self) -> Result<()> {
        if !(self.leaf_size.is_finite() && self.leaf_size > 0.0) {
            return Err(GtError::InvalidConfig(format!(
                "leaf_size must be positive, got {}",
                self.leaf_size
            )));
        }
        if !(self.occupancy.voxel_size.is_finite() && self.occupancy.voxel_size > 0.0) {
            return Err(GtError::InvalidConfig(format!(
                "occupancy voxel_size must be positive, got {}",
                self.occupancy.voxel_size
            )));
        }
        if let GridBounds::Fixed {
            half_extent_xy,
            half_extent_z,
        } = self.occupancy.bounds
        {
            if half_extent_xy <= 0.0 || half_extent_z <= 0.0 {
                return Err(GtError::InvalidConfig(
                    "grid half extents must be positive".to_string(),
                ));
            }
        }
        if self.depth.far_plane_m <= 0.0 || self.depth.max_normalized_depth <= 0.0 {
            return Err(GtError::InvalidConfig(
                "depth far plane and cutoff must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Simulation server settings applied before the first tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub synchronous_mode: bool,
    pub no_rendering_mode: bool,
    pub fixed_delta_seconds: f32,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            synchronous_mode: true,
            no_rendering_mode: true,
            fixed_delta_seconds: 0.05,
        }
    }
}

/// Attributes of the RGB and depth cameras.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraAttributes {
    pub image_size_x: u32,
    pub image_size_y: u32,
    /// Horizontal field of view in degrees.
    pub fov: f32,
    pub lens_k: f32,
    pub lens_kcube: f32,
    pub fstop: f32,
    pub iso: f32,
    pub focal_distance: f32,
    pub motion_blur_intensity: f32,
}

impl Default for CameraAttributes {
    fn default() -> Self {
        Self {
            image_size_x: 1280,
            image_size_y: 720,
            fov: 110.0,
            lens_k: 0.0,
            lens_kcube: 0.0,
            fstop: 0.5,
            iso: 1900.0,
            focal_distance: 2000.0,
            motion_blur_intensity: 0.1,
        }
    }
}

/// Attributes of the ray-cast lidar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LidarAttributes {
    pub channels: u32,
    /// Maximum range in metres.
    pub range: f32,
    pub points_per_second: u32,
    /// Rotation frequency in Hz.
    pub rotation_frequency: f32,
    pub upper_fov: f32,
    pub lower_fov: f32,
    pub dropoff_general_rate: f32,
    pub dropoff_intensity_limit: f32,
    pub dropoff_zero_intensity: f32,
    pub atmosphere_attenuation_rate: f32,
}

impl Default for LidarAttributes {
    fn default() -> Self {
        Self {
            channels: 128,
            range: 75.0,
            points_per_second: 2_621_440,
            rotation_frequency: 20.0,
            upper_fov: 45.0,
            lower_fov: -45.0,
            dropoff_general_rate: 0.1,
            dropoff_intensity_limit: 0.8,
            dropoff_zero_intensity: 0.4,
            atmosphere_attenuation_rate: 0.4,
        }
    }
}

/// Mounting position (metres) and orientation (degrees) relative to the vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MountTransform {
    pub location: Vec3,
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl MountTransform {
    /// Mount at a location with no rotation.
    pub fn at(location: Vec3) -> Self {
        Self {
            location,
            ..Self::default()
        }
    }
}

/// Every sensor preset handed to sensor setup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorRigConfig {
    /// Dataset RGB/depth cameras.
    pub camera: CameraAttributes,
    /// Ground-truth rig cameras (all four facings share these).
    pub rig_camera: CameraAttributes,
    pub lidar: LidarAttributes,
    pub camera_mount: MountTransform,
    pub lidar_mount: MountTransform,
}

impl Default for SensorRigConfig {
    fn default() -> Self {
        Self {
            camera: CameraAttributes::default(),
            rig_camera: CameraAttributes {
                image_size_y: 960,
                ..CameraAttributes::default()
            },
            lidar: LidarAttributes::default(),
            camera_mount: MountTransform::at(Vec3::new(0.9, 0.0, 1.3)),
            lidar_mount: MountTransform::at(Vec3::new(0.0, 0.0, 2.5)),
        }
    }
}
