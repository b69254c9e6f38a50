//! Multi-view fusion.

use glam::DVec3;
use gtvox_core::{GtError, Result};
use gtvox_structures::PointCloud;

/// The four rig views of one frame.
#[derive(Debug, Clone)]
pub struct RigClouds {
    pub front: PointCloud,
    pub right: PointCloud,
    pub left: PointCloud,
    pub back: PointCloud,
}

/// Fuses the rig views in front, right, left, back order.
pub fn fuse_rig(views: RigClouds) -> Result<(PointCloud, DVec3)> {
    let RigClouds {
        front,
        right,
        left,
        back,
    } = views;
    fuse([front, right, left, back])
}

/// Concatenates clouds in the given order and recentres the result on its centroid.
///
/// Returns the fused cloud together with the centroid that was subtracted.
/// Markers take part in the centroid like any other point.
pub fn fuse(clouds: impl IntoIterator<Item = PointCloud>) -> Result<(PointCloud, DVec3)> {
    let mut points = Vec::new();
    for cloud in clouds {
        points.extend(cloud.into_points());
    }
    if points.is_empty() {
        return Err(GtError::EmptyPointSet("multi-view fusion"));
    }

    let (fused, center) = PointCloud::new("ground_truth", points).centered();
    log::debug!(
        "fused {} points, centroid ({:.3}, {:.3}, {:.3})",
        fused.len(),
        center.x,
        center.y,
        center.z
    );
    Ok((fused, center))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use gtvox_core::PointSource;
    use proptest::prelude::*;

    fn single(source: PointSource, p: Vec3) -> PointCloud {
        PointCloud::from_positions(source.name(), [p], source)
    }

    #[test]
    fn test_rig_order_is_front_right_left_back() {
        let views = RigClouds {
            front: single(PointSource::Front, Vec3::X),
            right: single(PointSource::Right, Vec3::Y),
            left: single(PointSource::Left, -Vec3::Y),
            back: single(PointSource::Back, -Vec3::X),
        };
        let (fused, center) = fuse_rig(views).unwrap();
        let sources: Vec<_> = fused.points().iter().map(|p| p.source).collect();
        assert_eq!(sources, PointSource::RIG.to_vec());
        assert!(center.length() < 1e-12);
    }

    #[test]
    fn test_all_empty_views_is_an_error() {
        let err = fuse([PointCloud::empty("a"), PointCloud::empty("b")]).unwrap_err();
        assert!(matches!(err, GtError::EmptyPointSet(_)));
    }

    #[test]
    fn test_fusion_recentres() {
        let a = PointCloud::from_positions("a", [Vec3::new(10.0, 0.0, 0.0)], PointSource::Front);
        let b = PointCloud::from_positions("b", [Vec3::new(12.0, 2.0, 0.0)], PointSource::Back);
        let (fused, center) = fuse([a, b]).unwrap();
        assert_eq!(center, DVec3::new(11.0, 1.0, 0.0));
        assert_eq!(fused.points()[0].position, Vec3::new(-1.0, -1.0, 0.0));
    }

    proptest! {
        #[test]
        fn prop_fused_size_and_centroid(
            sizes in prop::collection::vec(0_usize..20, 4),
            offset in -100.0_f32..100.0,
        ) {
            prop_assume!(sizes.iter().sum::<usize>() > 0);
            let clouds: Vec<_> = sizes
                .iter()
                .zip(PointSource::RIG)
                .map(|(&n, source)| {
                    let pts = (0..n).map(|i| Vec3::new(offset + i as f32, offset * 0.5, -(i as f32)));
                    PointCloud::from_positions(source.name(), pts, source)
                })
                .collect();

            let (fused, _) = fuse(clouds).unwrap();
            prop_assert_eq!(fused.len(), sizes.iter().sum::<usize>());
            prop_assert!(fused.centroid().unwrap().length() < 1e-3);
        }
    }
}
