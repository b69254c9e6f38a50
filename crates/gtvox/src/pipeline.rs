//! The per-tick pipeline and the tick loop that drives it.

use glam::Vec3;
use gtvox_core::{
    AlignmentStrategy, GtError, PipelineConfig, PointSource, SensorRigConfig, ServerSettings,
};
use gtvox_reconstruct::{
    fuse, reconcile, DepthReprojector, DepthView, LidarAligner, OccupancyRasterizer,
    VoxelDownsampler,
};
use gtvox_structures::{DepthFrame, OccupancyGrid, PointCloud};

use crate::error::Result;
use crate::export::ArtifactWriter;
use crate::sensor::{
    sensor_channel, ActorGuard, CameraFrame, LidarFrame, SensorId, SensorSink, SensorStream,
    StopSignal,
};

/// The simulation collaborator driving the sensors.
pub trait Simulator {
    /// Applies server settings before the first tick.
    fn apply_settings(&mut self, settings: &ServerSettings) -> Result<()>;

    /// Spawns every sensor the pipeline consumes.
    ///
    /// The returned guard owns the spawned actors; the streams deliver their frames.
    fn spawn_sensors(&mut self, rig: &SensorRigConfig) -> Result<(ActorGuard, SensorStreams)>;

    /// Advances the simulation by one step and blocks until it is done.
    ///
    /// Returns the new frame index, or `None` when there is nothing left to simulate.
    fn tick(&mut self) -> Result<Option<u64>>;
}

/// Producer halves of every sensor stream.
#[derive(Debug, Clone)]
pub struct SensorSinks {
    /// Rig cameras in front, right, left, back order.
    pub rig: [SensorSink<CameraFrame>; 4],
    pub dataset_rgb: SensorSink<CameraFrame>,
    pub dataset_depth: SensorSink<CameraFrame>,
    pub lidar: SensorSink<LidarFrame>,
}

/// Consumer halves of every sensor stream.
#[derive(Debug)]
pub struct SensorStreams {
    /// Rig cameras in front, right, left, back order.
    pub rig: [SensorStream<CameraFrame>; 4],
    pub dataset_rgb: SensorStream<CameraFrame>,
    pub dataset_depth: SensorStream<CameraFrame>,
    pub lidar: SensorStream<LidarFrame>,
}

/// Creates one stream per sensor.
pub fn sensor_streams() -> (SensorSinks, SensorStreams) {
    let [front, right, left, back] = SensorId::RIG.map(sensor_channel::<CameraFrame>);
    let (rgb_tx, rgb_rx) = sensor_channel(SensorId::DatasetRgb);
    let (depth_tx, depth_rx) = sensor_channel(SensorId::DatasetDepth);
    let (lidar_tx, lidar_rx) = sensor_channel(SensorId::Lidar);
    (
        SensorSinks {
            rig: [front.0, right.0, left.0, back.0],
            dataset_rgb: rgb_tx,
            dataset_depth: depth_tx,
            lidar: lidar_tx,
        },
        SensorStreams {
            rig: [front.1, right.1, left.1, back.1],
            dataset_rgb: rgb_rx,
            dataset_depth: depth_rx,
            lidar: lidar_rx,
        },
    )
}

impl SensorStreams {
    /// Takes exactly one frame from every stream, blocking on each in turn.
    ///
    /// The frames are assumed to belong to tick `frame`; this is not checked.
    pub fn receive(&self, frame: u64) -> Result<TickFrames> {
        let [front, right, left, back] = &self.rig;
        Ok(TickFrames {
            frame,
            rig: [front.recv()?, right.recv()?, left.recv()?, back.recv()?],
            dataset_rgb: self.dataset_rgb.recv()?,
            dataset_depth: self.dataset_depth.recv()?,
            lidar: self.lidar.recv()?,
        })
    }
}

/// Everything consumed in one tick.
#[derive(Debug, Clone)]
pub struct TickFrames {
    /// Frame index reported by the simulator for this tick.
    pub frame: u64,
    /// Rig depth images in front, right, left, back order.
    pub rig: [CameraFrame; 4],
    pub dataset_rgb: CameraFrame,
    pub dataset_depth: CameraFrame,
    pub lidar: LidarFrame,
}

/// The products of one tick.
#[derive(Debug, Clone)]
pub struct FrameOutput {
    pub frame: u64,
    /// Downsampled, reconciled ground truth without markers.
    pub ground_truth: PointCloud,
    /// Aligned lidar cloud without markers.
    pub lidar: PointCloud,
    pub grid: OccupancyGrid,
    /// Lidar sensor origin after alignment, when markers are used.
    pub lidar_center: Option<Vec3>,
}

/// Reconstruction stages configured for one run.
#[derive(Debug, Clone)]
pub struct FramePipeline {
    alignment: AlignmentStrategy,
    reprojector: DepthReprojector,
    downsampler: VoxelDownsampler,
    aligner: LidarAligner,
    rasterizer: OccupancyRasterizer,
}

impl FramePipeline {
    /// Validates `config` and builds the stages.
    pub fn new(config: &PipelineConfig) -> gtvox_core::Result<Self> {
        config.validate()?;
        let use_markers = config.alignment == AlignmentStrategy::MarkerCentroid;
        Ok(Self {
            alignment: config.alignment,
            reprojector: DepthReprojector::new(config.depth).with_marker(use_markers),
            downsampler: VoxelDownsampler::new(config.leaf_size)?,
            aligner: LidarAligner::new(use_markers),
            rasterizer: OccupancyRasterizer::new(config.occupancy),
        })
    }

    /// Runs every stage on one tick's frames.
    pub fn process(&self, tick: &TickFrames) -> gtvox_core::Result<FrameOutput> {
        let mut views = Vec::with_capacity(tick.rig.len());
        for (source, capture) in PointSource::RIG.into_iter().zip(&tick.rig) {
            let depth = DepthFrame::from_image(&capture.image)?;
            views.push(self.reprojector.reproject(&DepthView {
                source,
                frame: tick.frame,
                depth: &depth,
                calibration: capture.calibration,
                color: None,
            })?);
        }

        let (fused, _) = fuse(views)?;
        let downsampled = self.downsampler.downsample(&fused);

        let front = &tick.rig[0].calibration.extrinsic;
        let lidar = self.aligner.align(&tick.lidar.sweep, front);
        let lidar_center = lidar.center;

        let reconciled = reconcile(downsampled, lidar, self.alignment)?;
        let grid = self.rasterizer.rasterize(&reconciled.ground_truth)?;

        let [nx, ny, nz] = grid.dims();
        log::info!(
            "frame {}: {} ground-truth points, {} lidar points, grid {}x{}x{} ({} occupied)",
            tick.frame,
            reconciled.ground_truth.len(),
            reconciled.lidar.len(),
            nx,
            ny,
            nz,
            grid.occupied_count()
        );

        Ok(FrameOutput {
            frame: tick.frame,
            ground_truth: reconciled.ground_truth,
            lidar: reconciled.lidar,
            grid,
            lidar_center,
        })
    }
}

/// Counts of what a run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Ticks whose artifacts were written.
    pub processed: usize,
    /// Ticks dropped because a stage had no points to work with.
    pub skipped: usize,
    pub last_frame: Option<u64>,
}

/// Drives `sim` until it runs out of ticks or `stop` is raised.
///
/// Sensors are spawned here and released on every exit path, including errors.
/// A tick whose processing yields an empty point set is skipped with a warning;
/// any other error ends the run.
pub fn run<S>(sim: &mut S, config: &PipelineConfig, stop: &StopSignal) -> Result<RunSummary>
where
    S: Simulator + ?Sized,
{
    let pipeline = FramePipeline::new(config)?;
    let writer = ArtifactWriter::create(&config.output)?;

    sim.apply_settings(&config.server)?;
    let (mut guard, streams) = sim.spawn_sensors(&config.rig)?;
    log::info!(
        "spawned {} sensors, mode {:?}, leaf size {}",
        guard.len(),
        config.mode,
        config.leaf_size
    );

    let result = tick_loop(sim, &streams, &pipeline, &writer, stop);
    guard.release();
    result
}

fn tick_loop<S>(
    sim: &mut S,
    streams: &SensorStreams,
    pipeline: &FramePipeline,
    writer: &ArtifactWriter,
    stop: &StopSignal,
) -> Result<RunSummary>
where
    S: Simulator + ?Sized,
{
    let mut summary = RunSummary::default();
    loop {
        if stop.is_stopped() {
            log::info!("stop requested");
            break;
        }
        let Some(frame) = sim.tick()? else {
            log::info!("simulation finished");
            break;
        };
        summary.last_frame = Some(frame);

        let tick = streams.receive(frame)?;
        let stem = writer.frame_stem(frame);
        writer.write_inputs(&stem, &tick)?;

        match pipeline.process(&tick) {
            Ok(output) => {
                writer.write_output(&stem, &output)?;
                summary.processed += 1;
            }
            Err(GtError::EmptyPointSet(what)) => {
                log::warn!("skipping frame {frame}: empty point set in {what}");
                summary.skipped += 1;
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gtvox_core::OperatingMode;
    use gtvox_structures::{BgraImage, CameraCalibration, Extrinsic, Intrinsic, LidarSweep};

    /// BGRA pixel encoding a normalized depth of `n / (2^24 - 1)`.
    fn depth_pixel(n: u32) -> [u8; 4] {
        [(n >> 16) as u8, (n >> 8) as u8, n as u8, 255]
    }

    fn camera(frame: u64, pixel: [u8; 4], yaw: f32) -> CameraFrame {
        CameraFrame {
            frame,
            image: BgraImage::from_raw(2, 2, pixel.repeat(4)).unwrap(),
            calibration: CameraCalibration::new(
                Intrinsic::from_fov(2, 2, 90.0),
                Extrinsic::from_location_rotation(Vec3::new(0.0, 0.0, 2.0), 0.0, yaw, 0.0),
            ),
        }
    }

    fn tick(pixel: [u8; 4]) -> TickFrames {
        TickFrames {
            frame: 3,
            rig: [
                camera(3, pixel, 0.0),
                camera(3, pixel, 90.0),
                camera(3, pixel, -90.0),
                camera(3, pixel, 180.0),
            ],
            dataset_rgb: camera(3, [10, 20, 30, 255], 0.0),
            dataset_depth: camera(3, pixel, 0.0),
            lidar: LidarFrame {
                frame: 3,
                sweep: LidarSweep::from_positions([
                    Vec3::new(5.0, 0.0, 0.0),
                    Vec3::new(0.0, 5.0, 0.0),
                ]),
            },
        }
    }

    #[test]
    fn test_aligned_frame() {
        let pipeline =
            FramePipeline::new(&PipelineConfig::for_mode(OperatingMode::Aligned)).unwrap();
        // 10 m everywhere
        let out = pipeline.process(&tick(depth_pixel(167_772))).unwrap();
        assert_eq!(out.frame, 3);
        assert_eq!(out.ground_truth.marker_count(), 0);
        assert_eq!(out.lidar.marker_count(), 0);
        assert!(out.lidar_center.is_some());
        assert_eq!(out.grid.dims(), [500, 500, 350]);
        assert!(out.grid.occupied_count() > 0);
        assert!(out.grid.occupied_count() <= out.ground_truth.len());
    }

    #[test]
    fn test_aligned_frame_with_empty_sweep() {
        let pipeline =
            FramePipeline::new(&PipelineConfig::for_mode(OperatingMode::Aligned)).unwrap();
        let mut frames = tick(depth_pixel(167_772));
        frames.lidar.sweep = LidarSweep::default();

        let out = pipeline.process(&frames).unwrap();
        assert!(out.lidar.is_empty());
        assert_eq!(out.lidar_center, Some(Vec3::ZERO));
        assert!(!out.ground_truth.is_empty());
        assert!(out.grid.occupied_count() > 0);
    }

    #[test]
    fn test_unaligned_frame_uses_extent_bounds() {
        let pipeline =
            FramePipeline::new(&PipelineConfig::for_mode(OperatingMode::Unaligned)).unwrap();
        let out = pipeline.process(&tick(depth_pixel(167_772))).unwrap();
        assert!(out.lidar_center.is_none());
        assert_eq!(out.lidar.len(), 2);
        assert_ne!(out.grid.dims(), [500, 500, 350]);
    }

    #[test]
    fn test_all_sentinel_frame_is_empty_point_set() {
        let pipeline =
            FramePipeline::new(&PipelineConfig::for_mode(OperatingMode::Unaligned)).unwrap();
        let err = pipeline.process(&tick([255, 255, 255, 255])).unwrap_err();
        assert!(matches!(err, GtError::EmptyPointSet(_)));
    }

    #[test]
    fn test_receive_takes_one_frame_per_stream() {
        let (sinks, streams) = sensor_streams();
        let frames = tick(depth_pixel(167_772));
        for (sink, frame) in sinks.rig.iter().zip(frames.rig.clone()) {
            sink.send(frame).unwrap();
        }
        sinks.dataset_rgb.send(frames.dataset_rgb.clone()).unwrap();
        sinks.dataset_depth.send(frames.dataset_depth.clone()).unwrap();
        sinks.lidar.send(frames.lidar.clone()).unwrap();

        let received = streams.receive(3).unwrap();
        assert_eq!(received.rig, frames.rig);
        assert!(streams.rig.iter().all(SensorStream::is_empty));
    }

    #[test]
    fn test_invalid_leaf_size_is_rejected() {
        let config = PipelineConfig {
            leaf_size: -1.0,
            ..PipelineConfig::default()
        };
        assert!(FramePipeline::new(&config).is_err());
    }
}
