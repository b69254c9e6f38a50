//! Depth reprojection: one depth frame plus calibration to world points.
//!
//! For pixel `(u, v)` with depth `d` metres along the camera's forward axis:
//!
//! ```text
//! optical = d * K^-1 * [u, v, 1]        (x right, y down, z forward)
//! sensor  = (optical.z, optical.x, -optical.y)   (x forward, y right, z up)
//! world   = (E * [sensor, 1])[..3]
//! ```

use glam::{Mat3, Vec3};
use gtvox_core::{ColoredPoint, DepthDecodeConfig, GtError, PointSource, Result};
use gtvox_structures::{BgraImage, CameraCalibration, DepthFrame, PointCloud};

/// One camera's input for a single frame.
#[derive(Debug, Clone, Copy)]
pub struct DepthView<'a> {
    /// Which rig camera produced the frame.
    pub source: PointSource,
    /// Frame index, used in error context.
    pub frame: u64,
    pub depth: &'a DepthFrame,
    pub calibration: CameraCalibration,
    /// Paired colour image of the same size, if any.
    pub color: Option<&'a BgraImage>,
}

/// Converts depth frames into world-space points.
#[derive(Debug, Clone, Copy)]
pub struct DepthReprojector {
    config: DepthDecodeConfig,
    emit_marker: bool,
}

impl DepthReprojector {
    /// Creates a reprojector that also emits one marker at each camera origin.
    pub fn new(config: DepthDecodeConfig) -> Self {
        Self {
            config,
            emit_marker: true,
        }
    }

    /// Enables or disables the camera-origin marker.
    #[must_use]
    pub fn with_marker(mut self, emit_marker: bool) -> Self {
        self.emit_marker = emit_marker;
        self
    }

    /// Reprojects every valid pixel of `view` into world space.
    ///
    /// Pixels at or beyond the far-clip sentinel, or with non-positive depth,
    /// produce no point. Non-finite depth and unusable calibration are errors
    /// naming the sensor and frame.
    pub fn reproject(&self, view: &DepthView<'_>) -> Result<PointCloud> {
        let k_inv = self.validate(view)?;
        let depth = view.depth;
        let extrinsic = view.calibration.extrinsic;

        let mut points = Vec::with_capacity(depth.values().len() + 1);
        for v in 0..depth.height() {
            for u in 0..depth.width() {
                let normalized = depth.get(u, v);
                if !normalized.is_finite() {
                    return Err(GtError::InvalidDepth {
                        sensor: view.source.to_string(),
                        frame: view.frame,
                        pixel: (u, v),
                    });
                }
                if normalized <= 0.0 || normalized >= self.config.max_normalized_depth {
                    continue;
                }

                let meters = normalized * self.config.far_plane_m;
                let optical = k_inv * Vec3::new(u as f32, v as f32, 1.0) * meters;
                let sensor = Vec3::new(optical.z, optical.x, -optical.y);
                let world = extrinsic.transform_point(sensor);

                let color = match view.color {
                    Some(image) => image.color(u, v),
                    None => view.source.tag_color(),
                };
                points.push(ColoredPoint::new(world, color, view.source));
            }
        }

        let valid = points.len();
        if self.emit_marker {
            points.push(ColoredPoint::marker(extrinsic.translation()));
        }
        log::debug!(
            "reprojected {} of {} pixels from {} camera (frame {})",
            valid,
            depth.values().len(),
            view.source,
            view.frame
        );

        Ok(PointCloud::new(view.source.name(), points))
    }

    fn validate(&self, view: &DepthView<'_>) -> Result<Mat3> {
        let invalid = |reason: String| GtError::InvalidCalibration {
            sensor: view.source.to_string(),
            frame: view.frame,
            reason,
        };

        let intrinsic = view.calibration.intrinsic;
        let k_inv = intrinsic
            .inverse()
            .ok_or_else(|| invalid("intrinsic matrix is singular or not finite".to_string()))?;
        if intrinsic.focal() <= 0.0 {
            return Err(invalid(format!(
                "focal length must be positive, got {}",
                intrinsic.focal()
            )));
        }
        if (intrinsic.width(), intrinsic.height()) != (view.depth.width(), view.depth.height()) {
            return Err(invalid(format!(
                "intrinsic is {}x{} but depth frame is {}x{}",
                intrinsic.width(),
                intrinsic.height(),
                view.depth.width(),
                view.depth.height()
            )));
        }
        if !view.calibration.extrinsic.is_valid() {
            return Err(invalid(
                "extrinsic is not a finite homogeneous pose".to_string(),
            ));
        }
        if let Some(image) = view.color {
            if (image.width(), image.height()) != (view.depth.width(), view.depth.height()) {
                return Err(GtError::SizeMismatch {
                    expected: view.depth.values().len(),
                    actual: image.width() as usize * image.height() as usize,
                });
            }
        }
        if !(self.config.far_plane_m.is_finite() && self.config.far_plane_m > 0.0) {
            return Err(GtError::InvalidConfig(format!(
                "far plane must be positive, got {}",
                self.config.far_plane_m
            )));
        }
        Ok(k_inv)
    }
}
