//! Ground-truth and lidar reconciliation.

use glam::DVec3;
use gtvox_core::{AlignmentStrategy, GtError, Result};
use gtvox_structures::PointCloud;

use crate::LidarAlignment;

/// Both clouds in a shared frame, free of markers.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    pub ground_truth: PointCloud,
    pub lidar: PointCloud,
    /// Offset that was added to the ground truth.
    pub translation: DVec3,
}

/// Brings the ground truth onto the lidar's frame and strips markers.
///
/// With [`AlignmentStrategy::MarkerCentroid`] the ground truth is translated by
/// `lidar_center - mean(ground-truth markers)`. With [`AlignmentStrategy::None`]
/// only the markers are removed.
pub fn reconcile(
    ground_truth: PointCloud,
    lidar: LidarAlignment,
    strategy: AlignmentStrategy,
) -> Result<Reconciled> {
    let translation = match strategy {
        AlignmentStrategy::MarkerCentroid => {
            let gt_center = ground_truth
                .marker_centroid()
                .ok_or(GtError::EmptyPointSet("ground-truth markers"))?;
            let lidar_center = lidar
                .center
                .ok_or(GtError::EmptyPointSet("lidar sensor origin"))?;
            lidar_center.as_dvec3() - gt_center
        }
        AlignmentStrategy::None => DVec3::ZERO,
    };

    log::debug!(
        "reconciling with offset ({:.3}, {:.3}, {:.3})",
        translation.x,
        translation.y,
        translation.z
    );

    Ok(Reconciled {
        ground_truth: ground_truth.translated(translation).without_markers(),
        lidar: lidar.cloud.without_markers(),
        translation,
    })
}
