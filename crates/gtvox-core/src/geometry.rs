//! Small geometric helpers shared by the pipeline stages.
//!
//! Rotations here are always rigid rotations about the origin, applied as plain
//! matrix-vector products over the point array.

use glam::{DVec3, Mat3, Vec3};

/// Arithmetic mean of a set of positions, accumulated in `f64`.
///
/// Returns `None` for an empty set, where the centroid is undefined.
pub fn centroid<I>(positions: I) -> Option<DVec3>
where
    I: IntoIterator<Item = Vec3>,
{
    let mut sum = DVec3::ZERO;
    let mut count = 0_usize;
    for p in positions {
        sum += p.as_dvec3();
        count += 1;
    }
    #[allow(clippy::cast_precision_loss)]
    (count > 0).then(|| sum / count as f64)
}

/// Rotates positions about the origin.
pub fn rotate_about_origin(positions: &mut [Vec3], rotation: &Mat3) {
    for p in positions {
        *p = *rotation * *p;
    }
}

/// Pure rotation about the vertical (Z) axis by `theta` radians.
#[must_use]
pub fn yaw_rotation(theta: f32) -> Mat3 {
    let (s, c) = theta.sin_cos();
    Mat3::from_cols(
        Vec3::new(c, s, 0.0),
        Vec3::new(-s, c, 0.0),
        Vec3::new(0.0, 0.0, 1.0),
    )
}
