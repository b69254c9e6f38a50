//! File-backed simulator that replays recorded ticks.
//!
//! A recording is a directory with one sub-directory per tick, replayed in
//! lexicographic order:
//!
//! ```text
//! recording/
//!   000001/
//!     tick.json           frame index and per-camera calibration
//!     depth_front.bgra    raw BGRA buffers, one per camera
//!     depth_right.bgra
//!     depth_left.bgra
//!     depth_back.bgra
//!     dataset_rgb.bgra
//!     dataset_depth.bgra
//!     lidar.bin           little-endian f32 records (x, y, z, intensity)
//!   000002/
//!     ...
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use glam::Vec3;
use gtvox_core::{SensorRigConfig, ServerSettings};
use gtvox_structures::{BgraImage, CameraCalibration, Extrinsic, Intrinsic, LidarSweep};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::pipeline::{sensor_streams, SensorSinks, SensorStreams, Simulator};
use crate::sensor::{ActorGuard, CameraFrame, LidarFrame, SensorActor, SensorId};

/// Name of the per-tick manifest file.
pub const MANIFEST_FILE: &str = "tick.json";

/// Name of the per-tick lidar buffer.
pub const LIDAR_FILE: &str = "lidar.bin";

/// Calibration of one camera as recorded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraRecord {
    /// World location in metres.
    pub location: [f32; 3],
    /// Pitch, yaw and roll in degrees.
    pub rotation: [f32; 3],
    /// Horizontal field of view in degrees.
    pub fov: f32,
    pub width: u32,
    pub height: u32,
}

impl CameraRecord {
    #[must_use]
    pub fn calibration(&self) -> CameraCalibration {
        let [pitch, yaw, roll] = self.rotation;
        CameraCalibration::new(
            Intrinsic::from_fov(self.width, self.height, self.fov),
            Extrinsic::from_location_rotation(Vec3::from(self.location), pitch, yaw, roll),
        )
    }
}

/// Contents of `tick.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickManifest {
    pub frame: u64,
    /// Rig cameras in front, right, left, back order.
    pub rig: [CameraRecord; 4],
    /// The dataset RGB and depth cameras share one mount.
    pub dataset: CameraRecord,
}

impl TickManifest {
    pub fn load(tick_dir: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(tick_dir.join(MANIFEST_FILE))?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Raw buffer file of a camera inside a tick directory.
#[must_use]
pub fn camera_file(tick_dir: &Path, id: SensorId) -> PathBuf {
    tick_dir.join(format!("{}.bgra", id.name()))
}

struct ReplaySensor {
    id: SensorId,
    released: Arc<AtomicUsize>,
}

impl SensorActor for ReplaySensor {
    fn id(&self) -> SensorId {
        self.id
    }

    fn destroy(&mut self) {
        log::debug!("destroying replay sensor '{}'", self.id);
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Replays a recording directory through the sensor streams.
pub struct ReplaySimulator {
    ticks: Vec<PathBuf>,
    next: usize,
    settings: Option<ServerSettings>,
    sinks: Option<SensorSinks>,
    released: Arc<AtomicUsize>,
}

impl ReplaySimulator {
    /// Lists the tick directories of a recording.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let mut ticks = Vec::new();
        for entry in std::fs::read_dir(root)? {
            let path = entry?.path();
            if path.join(MANIFEST_FILE).is_file() {
                ticks.push(path);
            }
        }
        ticks.sort();
        log::info!("replaying {} ticks from {}", ticks.len(), root.display());
        Ok(Self {
            ticks,
            next: 0,
            settings: None,
            sinks: None,
            released: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Number of recorded ticks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    /// Settings applied by the last [`Simulator::apply_settings`] call.
    #[must_use]
    pub fn settings(&self) -> Option<&ServerSettings> {
        self.settings.as_ref()
    }

    /// Number of spawned sensors destroyed so far.
    #[must_use]
    pub fn released_sensors(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    fn read_camera(
        tick_dir: &Path,
        id: SensorId,
        frame: u64,
        record: &CameraRecord,
    ) -> Result<CameraFrame> {
        let raw = std::fs::read(camera_file(tick_dir, id))?;
        Ok(CameraFrame {
            frame,
            image: BgraImage::from_raw(record.width, record.height, raw)?,
            calibration: record.calibration(),
        })
    }

    fn deliver(tick_dir: &Path, sinks: &SensorSinks) -> Result<u64> {
        let manifest = TickManifest::load(tick_dir)?;
        let frame = manifest.frame;

        for ((sink, id), record) in sinks.rig.iter().zip(SensorId::RIG).zip(&manifest.rig) {
            sink.send(Self::read_camera(tick_dir, id, frame, record)?)?;
        }
        sinks.dataset_rgb.send(Self::read_camera(
            tick_dir,
            SensorId::DatasetRgb,
            frame,
            &manifest.dataset,
        )?)?;
        sinks.dataset_depth.send(Self::read_camera(
            tick_dir,
            SensorId::DatasetDepth,
            frame,
            &manifest.dataset,
        )?)?;

        let raw = std::fs::read(tick_dir.join(LIDAR_FILE))?;
        sinks.lidar.send(LidarFrame {
            frame,
            sweep: LidarSweep::from_le_bytes(&raw)?,
        })?;
        Ok(frame)
    }
}

impl Simulator for ReplaySimulator {
    fn apply_settings(&mut self, settings: &ServerSettings) -> Result<()> {
        if !settings.synchronous_mode {
            log::warn!("replay is always synchronous; ignoring asynchronous mode");
        }
        self.settings = Some(*settings);
        Ok(())
    }

    fn spawn_sensors(&mut self, rig: &SensorRigConfig) -> Result<(ActorGuard, SensorStreams)> {
        if self.sinks.is_some() {
            return Err(Error::Simulator("sensors already spawned".to_string()));
        }
        log::debug!(
            "replay sensors stand in for {}x{} rig cameras and a {}-channel lidar",
            rig.rig_camera.image_size_x,
            rig.rig_camera.image_size_y,
            rig.lidar.channels
        );

        let (sinks, streams) = sensor_streams();
        let mut guard = ActorGuard::new();
        for id in SensorId::ALL {
            guard.push(Box::new(ReplaySensor {
                id,
                released: Arc::clone(&self.released),
            }));
        }
        self.sinks = Some(sinks);
        Ok((guard, streams))
    }

    fn tick(&mut self) -> Result<Option<u64>> {
        if self.settings.is_none() {
            return Err(Error::Simulator("server settings not applied".to_string()));
        }
        let sinks = self
            .sinks
            .as_ref()
            .ok_or_else(|| Error::Simulator("sensors not spawned".to_string()))?;
        if self.released.load(Ordering::SeqCst) > 0 {
            return Err(Error::Simulator("sensors already released".to_string()));
        }

        let Some(tick_dir) = self.ticks.get(self.next) else {
            return Ok(None);
        };
        self.next += 1;
        let frame = Self::deliver(tick_dir, sinks)?;
        log::debug!("replayed frame {frame} from {}", tick_dir.display());
        Ok(Some(frame))
    }
}

impl std::fmt::Debug for ReplaySimulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplaySimulator")
            .field("ticks", &self.ticks.len())
            .field("next", &self.next)
            .field("released", &self.released_sensors())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> CameraRecord {
        CameraRecord {
            location: [1.0, 2.0, 3.0],
            rotation: [0.0, 90.0, 0.0],
            fov: 90.0,
            width: 4,
            height: 2,
        }
    }

    #[test]
    fn test_record_calibration() {
        let calib = record().calibration();
        assert_eq!(calib.intrinsic.width(), 4);
        assert!((calib.intrinsic.focal() - 2.0).abs() < 1e-5);
        assert_eq!(calib.extrinsic.translation(), Vec3::new(1.0, 2.0, 3.0));
        assert!((calib.extrinsic.yaw() - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn test_manifest_json_shape() {
        let manifest = TickManifest {
            frame: 42,
            rig: [record(); 4],
            dataset: record(),
        };
        let json = serde_json::to_value(&manifest).unwrap();
        assert_eq!(json["frame"], 42);
        assert_eq!(json["rig"].as_array().unwrap().len(), 4);
        assert_eq!(json["dataset"]["fov"], 90.0);
        let back: TickManifest = serde_json::from_value(json).unwrap();
        assert_eq!(back, manifest);
    }

    #[test]
    fn test_tick_requires_setup() {
        let mut sim = ReplaySimulator {
            ticks: Vec::new(),
            next: 0,
            settings: None,
            sinks: None,
            released: Arc::new(AtomicUsize::new(0)),
        };
        assert!(matches!(sim.tick(), Err(Error::Simulator(_))));
        sim.apply_settings(&ServerSettings::default()).unwrap();
        assert!(matches!(sim.tick(), Err(Error::Simulator(_))));

        let (guard, _streams) = sim.spawn_sensors(&SensorRigConfig::default()).unwrap();
        assert_eq!(guard.len(), SensorId::ALL.len());
        assert_eq!(sim.tick().unwrap(), None);
        assert!(sim.spawn_sensors(&SensorRigConfig::default()).is_err());

        drop(guard);
        assert_eq!(sim.released_sensors(), SensorId::ALL.len());
    }
}
