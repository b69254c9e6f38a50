//! Sensor streams do not check that the frames of one tick belong together.
//!
//! A sensor that delivers two frames for one tick shifts its stream by one
//! relative to every other stream, and nothing reports it.

use gtvox::*;

fn camera(frame: u64) -> CameraFrame {
    CameraFrame {
        frame,
        image: BgraImage::from_raw(1, 1, vec![0, 0, 0, 255]).unwrap(),
        calibration: CameraCalibration::new(Intrinsic::from_fov(1, 1, 90.0), Extrinsic::IDENTITY),
    }
}

fn deliver(sinks: &SensorSinks, frame: u64) {
    for sink in &sinks.rig {
        sink.send(camera(frame)).unwrap();
    }
    sinks.dataset_rgb.send(camera(frame)).unwrap();
    sinks.dataset_depth.send(camera(frame)).unwrap();
    sinks
        .lidar
        .send(LidarFrame {
            frame,
            sweep: LidarSweep::default(),
        })
        .unwrap();
}

#[test]
fn test_in_step_streams_yield_one_tick() {
    let (sinks, streams) = sensor_streams();
    deliver(&sinks, 1);
    deliver(&sinks, 2);

    let first = streams.receive(1).unwrap();
    assert!(first.rig.iter().all(|c| c.frame == 1));
    assert_eq!(first.lidar.frame, 1);

    let second = streams.receive(2).unwrap();
    assert!(second.rig.iter().all(|c| c.frame == 2));
}

#[test]
fn test_doubled_frame_mixes_ticks_silently() {
    let (sinks, streams) = sensor_streams();
    deliver(&sinks, 1);
    // the front camera fires twice during tick 1
    sinks.rig[0].send(camera(1)).unwrap();
    deliver(&sinks, 2);

    let first = streams.receive(1).unwrap();
    assert!(first.rig.iter().all(|c| c.frame == 1));

    let second = streams.receive(2).unwrap();
    assert_eq!(second.rig[0].frame, 1, "front stream lags one tick behind");
    assert_eq!(second.rig[1].frame, 2);
    assert_eq!(second.lidar.frame, 2);

    // the extra frame stays queued
    assert_eq!(streams.rig[0].len(), 1);
}

#[test]
fn test_missing_frame_is_disconnect_only_without_producer() {
    let (sinks, streams) = sensor_streams();
    deliver(&sinks, 1);
    let _ = streams.receive(1).unwrap();

    // with every producer gone the next receive fails instead of blocking
    drop(sinks);
    assert!(matches!(
        streams.receive(2),
        Err(Error::SensorDisconnected(SensorId::DepthFront))
    ));
}
