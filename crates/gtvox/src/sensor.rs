//! Sensor streams, sensor actors and their cleanup.
//!
//! Each sensor delivers frames through its own single-producer/single-consumer
//! channel. The consumer blocks in [`SensorStream::recv`] until a frame arrives.
//! Nothing checks that the frames taken in one tick come from the same tick;
//! a sensor that skips or doubles a frame shifts its stream relative to the
//! others.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use gtvox_structures::{BgraImage, CameraCalibration, LidarSweep};

use crate::error::{Error, Result};

/// Identity of one sensor stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorId {
    DepthFront,
    DepthRight,
    DepthLeft,
    DepthBack,
    /// Forward-facing colour camera whose frames are exported.
    DatasetRgb,
    /// Forward-facing depth camera whose frames are exported.
    DatasetDepth,
    Lidar,
}

impl SensorId {
    /// The ground-truth rig cameras in fusion order.
    pub const RIG: [Self; 4] = [
        Self::DepthFront,
        Self::DepthRight,
        Self::DepthLeft,
        Self::DepthBack,
    ];

    /// Every sensor the pipeline consumes.
    pub const ALL: [Self; 7] = [
        Self::DepthFront,
        Self::DepthRight,
        Self::DepthLeft,
        Self::DepthBack,
        Self::DatasetRgb,
        Self::DatasetDepth,
        Self::Lidar,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::DepthFront => "depth_front",
            Self::DepthRight => "depth_right",
            Self::DepthLeft => "depth_left",
            Self::DepthBack => "depth_back",
            Self::DatasetRgb => "dataset_rgb",
            Self::DatasetDepth => "dataset_depth",
            Self::Lidar => "lidar",
        }
    }
}

impl std::fmt::Display for SensorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One camera image with the calibration the camera reported for it.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraFrame {
    /// Simulation frame the image was captured at.
    pub frame: u64,
    pub image: BgraImage,
    pub calibration: CameraCalibration,
}

/// One lidar sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct LidarFrame {
    pub frame: u64,
    pub sweep: LidarSweep,
}

/// Producer half of a sensor stream.
#[derive(Debug, Clone)]
pub struct SensorSink<T> {
    id: SensorId,
    tx: Sender<T>,
}

impl<T> SensorSink<T> {
    #[must_use]
    pub fn id(&self) -> SensorId {
        self.id
    }

    /// Queues a frame. Fails once the consumer is gone.
    pub fn send(&self, frame: T) -> Result<()> {
        self.tx
            .send(frame)
            .map_err(|_| Error::SensorDisconnected(self.id))
    }
}

/// Consumer half of a sensor stream.
#[derive(Debug)]
pub struct SensorStream<T> {
    id: SensorId,
    rx: Receiver<T>,
}

impl<T> SensorStream<T> {
    #[must_use]
    pub fn id(&self) -> SensorId {
        self.id
    }

    /// Blocks until the next frame arrives.
    ///
    /// Blocks forever if the producer is alive but never sends.
    pub fn recv(&self) -> Result<T> {
        self.rx.recv().map_err(|_| Error::SensorDisconnected(self.id))
    }

    /// Takes a frame if one is already queued.
    #[must_use]
    pub fn try_recv(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    /// Number of queued frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

/// Creates an unbounded FIFO stream for one sensor.
pub fn sensor_channel<T>(id: SensorId) -> (SensorSink<T>, SensorStream<T>) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (SensorSink { id, tx }, SensorStream { id, rx })
}

/// A spawned sensor that holds simulator resources until destroyed.
pub trait SensorActor {
    fn id(&self) -> SensorId;

    /// Stops the sensor and releases it. Called exactly once by [`ActorGuard`].
    fn destroy(&mut self);
}

/// Owns spawned sensor actors and destroys all of them when dropped.
///
/// Dropping happens on normal return, on `?` propagation and while unwinding
/// from a panic, so every exit path of the tick loop releases the sensors.
#[derive(Default)]
pub struct ActorGuard {
    actors: Vec<Box<dyn SensorActor>>,
}

impl ActorGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes ownership of a spawned actor.
    pub fn push(&mut self, actor: Box<dyn SensorActor>) {
        log::debug!("tracking sensor actor '{}'", actor.id());
        self.actors.push(actor);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.actors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// Destroys every actor now. Dropping the guard afterwards is a no-op.
    pub fn release(&mut self) {
        if self.actors.is_empty() {
            return;
        }
        let count = self.actors.len();
        for mut actor in self.actors.drain(..) {
            actor.destroy();
        }
        log::info!("all sensors released ({count})");
    }
}

impl Drop for ActorGuard {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for ActorGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActorGuard")
            .field("actors", &self.actors.iter().map(|a| a.id()).collect::<Vec<_>>())
            .finish()
    }
}

/// A single-shot stop flag shared between the tick loop and whoever ends it.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests the loop to stop before its next tick.
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct CountingActor {
        id: SensorId,
        destroyed: Arc<AtomicUsize>,
    }

    impl SensorActor for CountingActor {
        fn id(&self) -> SensorId {
            self.id
        }

        fn destroy(&mut self) {
            self.destroyed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn guard_with(n: usize, destroyed: &Arc<AtomicUsize>) -> ActorGuard {
        let mut guard = ActorGuard::new();
        for id in SensorId::ALL.into_iter().take(n) {
            guard.push(Box::new(CountingActor {
                id,
                destroyed: Arc::clone(destroyed),
            }));
        }
        guard
    }

    #[test]
    fn test_channel_is_fifo() {
        let (sink, stream) = sensor_channel::<u32>(SensorId::Lidar);
        sink.send(1).unwrap();
        sink.send(2).unwrap();
        assert_eq!(stream.len(), 2);
        assert_eq!(stream.recv().unwrap(), 1);
        assert_eq!(stream.recv().unwrap(), 2);
        assert!(stream.try_recv().is_none());
    }

    #[test]
    fn test_disconnected_producer() {
        let (sink, stream) = sensor_channel::<u32>(SensorId::DepthBack);
        drop(sink);
        assert!(matches!(
            stream.recv(),
            Err(Error::SensorDisconnected(SensorId::DepthBack))
        ));
    }

    #[test]
    fn test_disconnected_consumer() {
        let (sink, stream) = sensor_channel::<u32>(SensorId::DatasetRgb);
        drop(stream);
        assert!(sink.send(3).is_err());
    }

    #[test]
    fn test_guard_destroys_on_drop() {
        let destroyed = Arc::new(AtomicUsize::new(0));
        {
            let guard = guard_with(4, &destroyed);
            assert_eq!(guard.len(), 4);
        }
        assert_eq!(destroyed.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_guard_release_is_once() {
        let destroyed = Arc::new(AtomicUsize::new(0));
        let mut guard = guard_with(3, &destroyed);
        guard.release();
        assert!(guard.is_empty());
        drop(guard);
        assert_eq!(destroyed.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_guard_destroys_while_unwinding() {
        let destroyed = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&destroyed);
        let result = std::panic::catch_unwind(move || {
            let _guard = guard_with(7, &inner);
            panic!("tick failed");
        });
        assert!(result.is_err());
        assert_eq!(destroyed.load(Ordering::SeqCst), 7);
    }

    #[test]
    fn test_stop_signal_is_shared() {
        let stop = StopSignal::new();
        let other = stop.clone();
        assert!(!other.is_stopped());
        stop.stop();
        assert!(other.is_stopped());
    }
}
