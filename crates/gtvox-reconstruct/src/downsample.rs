//! Voxel-grid downsampling.
//!
//! Space is partitioned into cubes of edge `leaf_size`; the cube holding `p` is
//! `floor(p / leaf_size)`. Each occupied cube keeps exactly one of its input
//! points unchanged. Positions and colours are never averaged, so a marker that
//! wins its cube survives bit-for-bit.

use std::collections::HashMap;

use gtvox_core::{ColoredPoint, GtError, Result};
use gtvox_structures::PointCloud;

/// Keeps one representative point per occupied voxel.
///
/// The representative is the first point seen in the cube, except that the
/// first marker seen always replaces a non-marker representative. Output is in
/// the order cubes were first occupied.
#[derive(Debug, Clone, Copy)]
pub struct VoxelDownsampler {
    leaf_size: f32,
}

impl VoxelDownsampler {
    /// Creates a downsampler with the given cube edge length.
    pub fn new(leaf_size: f32) -> Result<Self> {
        if !(leaf_size.is_finite() && leaf_size > 0.0) {
            return Err(GtError::InvalidConfig(format!(
                "leaf size must be positive, got {leaf_size}"
            )));
        }
        Ok(Self { leaf_size })
    }

    #[must_use]
    pub fn leaf_size(&self) -> f32 {
        self.leaf_size
    }

    /// Downsamples `cloud`. An empty cloud comes back empty.
    #[must_use]
    pub fn downsample(&self, cloud: &PointCloud) -> PointCloud {
        let leaf = f64::from(self.leaf_size);
        let mut slots: HashMap<[i64; 3], usize> = HashMap::with_capacity(cloud.len() / 4);
        let mut kept: Vec<ColoredPoint> = Vec::new();

        for point in cloud.points() {
            let key = (point.position.as_dvec3() / leaf).floor();
            let key = [key.x as i64, key.y as i64, key.z as i64];
            match slots.get(&key) {
                Some(&slot) => {
                    if point.is_marker() && !kept[slot].is_marker() {
                        kept[slot] = *point;
                    }
                }
                None => {
                    slots.insert(key, kept.len());
                    kept.push(*point);
                }
            }
        }

        log::debug!(
            "downsampled {} -> {} points (leaf {})",
            cloud.len(),
            kept.len(),
            self.leaf_size
        );
        PointCloud::new(cloud.name(), kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use gtvox_core::PointSource;
    use proptest::prelude::*;

    #[test]
    fn test_first_seen_representative() {
        let cloud = PointCloud::from_positions(
            "c",
            [
                Vec3::new(0.05, 0.05, 0.05),
                Vec3::new(0.15, 0.15, 0.15),
                Vec3::new(0.25, 0.05, 0.05),
            ],
            PointSource::Front,
        );
        let out = VoxelDownsampler::new(0.2).unwrap().downsample(&cloud);
        assert_eq!(
            out.positions().collect::<Vec<_>>(),
            vec![Vec3::new(0.05, 0.05, 0.05), Vec3::new(0.25, 0.05, 0.05)]
        );
    }

    #[test]
    fn test_marker_wins_its_voxel() {
        let cloud = PointCloud::new(
            "c",
            vec![
                ColoredPoint::tagged(Vec3::new(0.01, 0.01, 0.01), PointSource::Left),
                ColoredPoint::marker(Vec3::new(0.02, 0.02, 0.02)),
                ColoredPoint::marker(Vec3::new(0.03, 0.03, 0.03)),
            ],
        );
        let out = VoxelDownsampler::new(0.2).unwrap().downsample(&cloud);
        assert_eq!(out.len(), 1);
        assert!(out.points()[0].is_marker());
        assert_eq!(out.points()[0].position, Vec3::new(0.02, 0.02, 0.02));
    }

    #[test]
    fn test_negative_coordinates_use_floor() {
        let cloud = PointCloud::from_positions(
            "c",
            [Vec3::new(-0.05, 0.0, 0.0), Vec3::new(0.05, 0.0, 0.0)],
            PointSource::Back,
        );
        let out = VoxelDownsampler::new(0.2).unwrap().downsample(&cloud);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_empty_and_invalid_leaf() {
        let out = VoxelDownsampler::new(0.1)
            .unwrap()
            .downsample(&PointCloud::empty("e"));
        assert!(out.is_empty());
        assert!(VoxelDownsampler::new(0.0).is_err());
        assert!(VoxelDownsampler::new(f32::NAN).is_err());
    }

    fn arb_cloud() -> impl Strategy<Value = PointCloud> {
        prop::collection::vec(
            ((-5.0_f32..5.0, -5.0_f32..5.0, -5.0_f32..5.0), any::<bool>()),
            0..200,
        )
        .prop_map(|pts| {
            let points = pts
                .into_iter()
                .map(|((x, y, z), marker)| {
                    let p = Vec3::new(x, y, z);
                    if marker {
                        ColoredPoint::marker(p)
                    } else {
                        ColoredPoint::tagged(p, PointSource::Front)
                    }
                })
                .collect();
            PointCloud::new("arb", points)
        })
    }

    proptest! {
        #[test]
        fn prop_downsample_is_idempotent(cloud in arb_cloud(), leaf in 0.05_f32..2.0) {
            let ds = VoxelDownsampler::new(leaf).unwrap();
            let once = ds.downsample(&cloud);
            let twice = ds.downsample(&once);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_output_is_subset_with_distinct_voxels(cloud in arb_cloud(), leaf in 0.05_f32..2.0) {
            let out = VoxelDownsampler::new(leaf).unwrap().downsample(&cloud);
            prop_assert!(out.len() <= cloud.len());
            for p in out.points() {
                prop_assert!(cloud.points().contains(p));
            }
            let mut keys: Vec<_> = out
                .positions()
                .map(|p| {
                    let k = (p.as_dvec3() / f64::from(leaf)).floor();
                    [k.x as i64, k.y as i64, k.z as i64]
                })
                .collect();
            let n = keys.len();
            keys.sort_unstable();
            keys.dedup();
            prop_assert_eq!(keys.len(), n);
        }

        #[test]
        fn prop_voxels_with_markers_keep_a_marker(cloud in arb_cloud(), leaf in 0.05_f32..2.0) {
            let out = VoxelDownsampler::new(leaf).unwrap().downsample(&cloud);
            let had_marker = cloud.marker_count() > 0;
            prop_assert_eq!(out.marker_count() > 0, had_marker);
        }
    }
}
