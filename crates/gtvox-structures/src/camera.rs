//! Camera calibration (intrinsics and extrinsics).

use glam::{Mat3, Mat4, Vec3, Vec4};

/// Pinhole intrinsic matrix of a camera.
///
/// Maps camera-space rays to pixel coordinates:
/// `K = [[f, 0, cx], [0, f, cy], [0, 0, 1]]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intrinsic {
    matrix: Mat3,
    width: u32,
    height: u32,
}

impl Intrinsic {
    /// Creates intrinsics from a horizontal field of view and the image size.
    ///
    /// `f = width / (2 tan(fov / 2))`, principal point at the image centre.
    pub fn from_fov(width: u32, height: u32, fov_horizontal_degrees: f32) -> Self {
        let focal = width as f32 / (2.0 * (fov_horizontal_degrees.to_radians() / 2.0).tan());
        Self::new(focal, width as f32 / 2.0, height as f32 / 2.0, width, height)
    }

    /// Creates intrinsics from a focal length and principal point.
    pub fn new(focal: f32, cx: f32, cy: f32, width: u32, height: u32) -> Self {
        let matrix = Mat3::from_cols(
            Vec3::new(focal, 0.0, 0.0),
            Vec3::new(0.0, focal, 0.0),
            Vec3::new(cx, cy, 1.0),
        );
        Self {
            matrix,
            width,
            height,
        }
    }

    /// Returns the 3x3 matrix.
    #[must_use]
    pub fn matrix(&self) -> Mat3 {
        self.matrix
    }

    /// Focal length in pixels.
    #[must_use]
    pub fn focal(&self) -> f32 {
        self.matrix.x_axis.x
    }

    /// Principal point in pixels.
    #[must_use]
    pub fn principal_point(&self) -> (f32, f32) {
        (self.matrix.z_axis.x, self.matrix.z_axis.y)
    }

    /// Image width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Inverse matrix, or `None` if the matrix is singular or not finite.
    #[must_use]
    pub fn inverse(&self) -> Option<Mat3> {
        let det = self.matrix.determinant();
        if !self.matrix.is_finite() || !det.is_finite() || det.abs() <= f32::EPSILON {
            return None;
        }
        Some(self.matrix.inverse())
    }
}

/// Pose of a sensor in world space at capture time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extrinsic {
    matrix: Mat4,
}

impl Extrinsic {
    /// Identity pose.
    pub const IDENTITY: Self = Self {
        matrix: Mat4::IDENTITY,
    };

    /// Wraps a homogeneous pose matrix.
    pub fn from_matrix(matrix: Mat4) -> Self {
        Self { matrix }
    }

    /// Creates a pose from row-major rows.
    pub fn from_rows(rows: [[f32; 4]; 4]) -> Self {
        Self::from_matrix(Mat4::from_cols_array_2d(&rows).transpose())
    }

    /// Creates a pose from a location in metres and pitch/yaw/roll in degrees.
    ///
    /// Uses the simulator's transform convention (x forward, y right, z up).
    pub fn from_location_rotation(location: Vec3, pitch: f32, yaw: f32, roll: f32) -> Self {
        let (sp, cp) = pitch.to_radians().sin_cos();
        let (sy, cy) = yaw.to_radians().sin_cos();
        let (sr, cr) = roll.to_radians().sin_cos();
        Self::from_rows([
            [
                cp * cy,
                cy * sp * sr - sy * cr,
                -cy * sp * cr - sy * sr,
                location.x,
            ],
            [
                sy * cp,
                sy * sp * sr + cy * cr,
                -sy * sp * cr + cy * sr,
                location.y,
            ],
            [sp, -cp * sr, cp * cr, location.z],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Returns the 4x4 matrix.
    #[must_use]
    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }

    /// Rotation block.
    #[must_use]
    pub fn rotation(&self) -> Mat3 {
        Mat3::from_mat4(self.matrix)
    }

    /// Translation column, i.e. the sensor origin in world space.
    #[must_use]
    pub fn translation(&self) -> Vec3 {
        self.matrix.w_axis.truncate()
    }

    /// Rotation about the vertical axis in radians: `atan2(R[1,0], R[0,0])`.
    ///
    /// A zero rotation block has no defined yaw; it is taken as zero.
    #[must_use]
    pub fn yaw(&self) -> f32 {
        let r10 = self.matrix.x_axis.y;
        let r00 = self.matrix.x_axis.x;
        if r10 == 0.0 && r00 == 0.0 {
            return 0.0;
        }
        r10.atan2(r00)
    }

    /// Returns true if every entry is finite and the bottom row is `[0, 0, 0, 1]`.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.matrix.is_finite() && self.matrix.row(3) == Vec4::W
    }

    /// Maps a sensor-local point to world space.
    #[must_use]
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        (self.matrix * p.extend(1.0)).truncate()
    }
}

impl Default for Extrinsic {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Combined calibration of one camera for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraCalibration {
    pub intrinsic: Intrinsic,
    pub extrinsic: Extrinsic,
}

impl CameraCalibration {
    /// Creates a calibration.
    pub fn new(intrinsic: Intrinsic, extrinsic: Extrinsic) -> Self {
        Self {
            intrinsic,
            extrinsic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intrinsic_from_fov() {
        let k = Intrinsic::from_fov(2, 2, 90.0);
        assert!((k.focal() - 1.0).abs() < 1e-6);
        assert_eq!(k.principal_point(), (1.0, 1.0));
        let inv = k.inverse().unwrap();
        let ray = inv * Vec3::new(0.0, 0.0, 1.0);
        assert!((ray - Vec3::new(-1.0, -1.0, 1.0)).length() < 1e-6);
    }

    #[test]
    fn test_degenerate_intrinsic_has_no_inverse() {
        let k = Intrinsic::new(0.0, 1.0, 1.0, 2, 2);
        assert!(k.inverse().is_none());
        let k = Intrinsic::new(f32::NAN, 1.0, 1.0, 2, 2);
        assert!(k.inverse().is_none());
    }

    #[test]
    fn test_extrinsic_yaw_round_trip() {
        let e = Extrinsic::from_location_rotation(Vec3::new(1.0, 2.0, 3.0), 0.0, 30.0, 0.0);
        assert!((e.yaw().to_degrees() - 30.0).abs() < 1e-4);
        assert_eq!(e.translation(), Vec3::new(1.0, 2.0, 3.0));
        assert!(e.is_valid());
    }

    #[test]
    fn test_zero_rotation_block_gives_zero_yaw() {
        let e = Extrinsic::from_matrix(Mat4::from_cols(Vec4::ZERO, Vec4::ZERO, Vec4::ZERO, Vec4::W));
        assert_eq!(e.yaw(), 0.0);
    }

    #[test]
    fn test_from_rows_is_row_major() {
        let e = Extrinsic::from_rows([
            [1.0, 0.0, 0.0, 5.0],
            [0.0, 1.0, 0.0, 6.0],
            [0.0, 0.0, 1.0, 7.0],
            [0.0, 0.0, 0.0, 1.0],
        ]);
        assert_eq!(e.transform_point(Vec3::ZERO), Vec3::new(5.0, 6.0, 7.0));
    }

    #[test]
    fn test_location_rotation_matches_yaw_only_matrix() {
        let e = Extrinsic::from_location_rotation(Vec3::ZERO, 0.0, 90.0, 0.0);
        // Forward axis turns to +Y
        assert!((e.transform_point(Vec3::X) - Vec3::Y).length() < 1e-6);
    }
}
