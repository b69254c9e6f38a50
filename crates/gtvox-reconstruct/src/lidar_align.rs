//! Lidar-to-camera alignment.
//!
//! Lidar returns arrive in the sensor's native axis convention. A fixed chain
//! of rotations maps them into the camera convention used by reprojection, and
//! a yaw taken from the front camera's extrinsic matches the heading. In
//! aligned mode the result is recentred and the sensor origin is reported so
//! the ground truth can be brought onto it.

use glam::{Mat3, Vec3};
use gtvox_core::{centroid, rotate_about_origin, yaw_rotation, ColoredPoint, PointSource};
use gtvox_structures::{Extrinsic, LidarSweep, PointCloud};

/// `(x, y, z) -> (y, -x, z)`.
const NATIVE_TO_CAMERA: Mat3 = Mat3::from_cols(
    Vec3::new(0.0, -1.0, 0.0),
    Vec3::new(1.0, 0.0, 0.0),
    Vec3::new(0.0, 0.0, 1.0),
);

const FLIP_Z: Mat3 = Mat3::from_cols(
    Vec3::new(1.0, 0.0, 0.0),
    Vec3::new(0.0, 1.0, 0.0),
    Vec3::new(0.0, 0.0, -1.0),
);

const HALF_TURN_X: Mat3 = Mat3::from_cols(
    Vec3::new(1.0, 0.0, 0.0),
    Vec3::new(0.0, -1.0, 0.0),
    Vec3::new(0.0, 0.0, -1.0),
);

const HALF_TURN_Y: Mat3 = Mat3::from_cols(
    Vec3::new(-1.0, 0.0, 0.0),
    Vec3::new(0.0, -1.0, 0.0),
    Vec3::new(0.0, 0.0, 1.0),
);

/// The fixed part of the lidar transform, applied before the yaw.
///
/// Net effect: `(x, y, z) -> (-y, -x, z)`.
#[must_use]
pub fn fixed_correction() -> Mat3 {
    HALF_TURN_Y * HALF_TURN_X * FLIP_Z * NATIVE_TO_CAMERA
}

/// An aligned lidar cloud.
#[derive(Debug, Clone, PartialEq)]
pub struct LidarAlignment {
    /// Aligned returns, without any marker.
    pub cloud: PointCloud,
    /// Sensor origin after alignment; only produced in aligned mode.
    pub center: Option<Vec3>,
}

/// Applies the fixed correction and heading yaw to lidar sweeps.
#[derive(Debug, Clone, Copy)]
pub struct LidarAligner {
    recenter: bool,
}

impl LidarAligner {
    /// Creates an aligner. With `recenter` set the cloud is translated to a zero
    /// centroid and the sensor origin is reported.
    pub fn new(recenter: bool) -> Self {
        Self { recenter }
    }

    /// Aligns `sweep` using the yaw of the front camera's extrinsic.
    ///
    /// An empty sweep yields an empty cloud; when recentring, its reported
    /// centre is the origin. A degenerate rotation block is treated as zero yaw.
    #[must_use]
    pub fn align(&self, sweep: &LidarSweep, front: &Extrinsic) -> LidarAlignment {
        let rotation = yaw_rotation(front.yaw()) * fixed_correction();

        let mut positions = sweep.positions();
        rotate_about_origin(&mut positions, &rotation);

        // An empty sweep still reports the origin: the centroid of the marker alone
        let center = if self.recenter {
            let origin = rotation * Vec3::ZERO;
            let shift = centroid(positions.iter().copied().chain(std::iter::once(origin)))
                .unwrap_or_default()
                .as_vec3();
            for p in &mut positions {
                *p -= shift;
            }
            Some(origin - shift)
        } else {
            None
        };

        let points = positions
            .into_iter()
            .map(|p| ColoredPoint::tagged(p, PointSource::Lidar))
            .collect();
        log::debug!(
            "aligned {} lidar returns, yaw {:.4} rad",
            sweep.len(),
            front.yaw()
        );
        LidarAlignment {
            cloud: PointCloud::new("lidar", points),
            center,
        }
    }
}
