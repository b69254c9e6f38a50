//! Shared fixtures: scratch directories and synthetic replay recordings.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use gtvox::{
    replay::{camera_file, LIDAR_FILE, MANIFEST_FILE},
    CameraRecord, GridBounds, LidarSweep, OccupancyConfig, OperatingMode, PipelineConfig,
    SensorId, TickManifest, Vec3,
};

/// Side length of the synthetic square images.
pub const SIZE: u32 = 4;

/// A unique directory under the system temp dir, removed on drop.
pub struct Scratch(PathBuf);

impl Scratch {
    pub fn new(name: &str) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let dir = std::env::temp_dir().join(format!(
            "gtvox-{name}-{}-{nanos}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).expect("create scratch dir");
        Self(dir)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    pub fn join(&self, part: &str) -> PathBuf {
        self.0.join(part)
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

/// BGRA buffer whose every pixel encodes `n / (2^24 - 1)` as normalized depth.
pub fn depth_buffer(n: u32) -> Vec<u8> {
    let pixel = [(n >> 16) as u8, (n >> 8) as u8, n as u8, 255];
    pixel.repeat((SIZE * SIZE) as usize)
}

/// Normalized depth code for roughly `meters` metres.
pub fn depth_code(meters: f64) -> u32 {
    (meters / 1000.0 * 16_777_215.0).round() as u32
}

/// The encoded value of the far-clip sentinel.
pub const SENTINEL: u32 = 16_777_215;

fn record(yaw: f32) -> CameraRecord {
    CameraRecord {
        location: [0.0, 0.0, 2.0],
        rotation: [0.0, yaw, 0.0],
        fov: 90.0,
        width: SIZE,
        height: SIZE,
    }
}

/// Writes one tick directory `<root>/<index:06>/`.
pub fn write_tick(root: &Path, index: usize, frame: u64, depth: u32, lidar: &[Vec3]) -> PathBuf {
    let dir = root.join(format!("{index:06}"));
    std::fs::create_dir_all(&dir).expect("create tick dir");

    let manifest = TickManifest {
        frame,
        rig: [record(0.0), record(90.0), record(-90.0), record(180.0)],
        dataset: record(0.0),
    };
    std::fs::write(
        dir.join(MANIFEST_FILE),
        serde_json::to_string_pretty(&manifest).expect("serialize manifest"),
    )
    .expect("write manifest");

    for id in SensorId::RIG {
        std::fs::write(camera_file(&dir, id), depth_buffer(depth)).expect("write depth");
    }
    std::fs::write(
        camera_file(&dir, SensorId::DatasetRgb),
        [40_u8, 80, 120, 255].repeat((SIZE * SIZE) as usize),
    )
    .expect("write rgb");
    std::fs::write(
        camera_file(&dir, SensorId::DatasetDepth),
        depth_buffer(depth),
    )
    .expect("write dataset depth");

    let sweep = LidarSweep::from_positions(lidar.iter().copied());
    std::fs::write(dir.join(LIDAR_FILE), sweep.to_le_bytes()).expect("write lidar");
    dir
}

/// A ring of lidar returns around the sensor.
pub fn lidar_ring() -> Vec<Vec3> {
    vec![
        Vec3::new(5.0, 0.0, 0.0),
        Vec3::new(0.0, 5.0, 0.0),
        Vec3::new(-5.0, 0.0, 0.0),
        Vec3::new(0.0, -5.0, 0.5),
    ]
}

/// Mode preset with a small grid and output under `out`.
pub fn small_config(mode: OperatingMode, out: &Path) -> PipelineConfig {
    let mut config = PipelineConfig::for_mode(mode);
    if mode == OperatingMode::Aligned {
        config.occupancy = OccupancyConfig {
            voxel_size: 0.4,
            bounds: GridBounds::Fixed {
                half_extent_xy: 20.0,
                half_extent_z: 10.0,
            },
        };
    }
    config.output.root = out.to_path_buf();
    config
}

/// Files with `extension` directly inside `dir`, sorted.
pub fn files_with_extension(dir: &Path, extension: &str) -> Vec<PathBuf> {
    let mut files: Vec<_> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok().map(|e| e.path()))
                .filter(|p| p.extension().is_some_and(|e| e == extension))
                .collect()
        })
        .unwrap_or_default();
    files.sort();
    files
}
