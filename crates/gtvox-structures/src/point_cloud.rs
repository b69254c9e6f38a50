//! Point cloud structure.

use glam::{DVec3, Vec3};
use gtvox_core::{centroid, Color, ColoredPoint, PointSource};

/// An ordered collection of tagged points.
///
/// Order carries no meaning for the geometry but decides tie-breaks during
/// downsampling. Clouds are rebuilt by each stage rather than edited in place.
#[derive(Debug, Clone, PartialEq)]
pub struct PointCloud {
    name: String,
    points: Vec<ColoredPoint>,
}

impl PointCloud {
    /// Creates a new point cloud.
    pub fn new(name: impl Into<String>, points: Vec<ColoredPoint>) -> Self {
        Self {
            name: name.into(),
            points,
        }
    }

    /// Creates a point cloud with no points.
    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    /// Creates a cloud where every position gets the same source tag.
    pub fn from_positions(
        name: impl Into<String>,
        positions: impl IntoIterator<Item = Vec3>,
        source: PointSource,
    ) -> Self {
        let points = positions
            .into_iter()
            .map(|p| ColoredPoint::tagged(p, source))
            .collect();
        Self::new(name, points)
    }

    /// Returns the name of this cloud.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if the cloud has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns the points.
    #[must_use]
    pub fn points(&self) -> &[ColoredPoint] {
        &self.points
    }

    /// Consumes the cloud, returning its points.
    #[must_use]
    pub fn into_points(self) -> Vec<ColoredPoint> {
        self.points
    }

    /// Iterates over positions.
    pub fn positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.points.iter().map(|p| p.position)
    }

    /// Iterates over colours, index-aligned with [`Self::positions`].
    pub fn colors(&self) -> impl Iterator<Item = Color> + '_ {
        self.points.iter().map(|p| p.color)
    }

    /// Mean position, or `None` for an empty cloud.
    #[must_use]
    pub fn centroid(&self) -> Option<DVec3> {
        centroid(self.positions())
    }

    /// Axis-aligned bounding box, or `None` for an empty cloud.
    #[must_use]
    pub fn bounding_box(&self) -> Option<(Vec3, Vec3)> {
        let first = self.points.first()?.position;
        Some(
            self.positions()
                .fold((first, first), |(min, max), p| (min.min(p), max.max(p))),
        )
    }

    /// Number of marker points.
    #[must_use]
    pub fn marker_count(&self) -> usize {
        self.points.iter().filter(|p| p.is_marker()).count()
    }

    /// Mean position of the marker points, or `None` if there are none.
    #[must_use]
    pub fn marker_centroid(&self) -> Option<DVec3> {
        centroid(
            self.points
                .iter()
                .filter(|p| p.is_marker())
                .map(|p| p.position),
        )
    }

    /// Returns the cloud with every marker point removed.
    #[must_use]
    pub fn without_markers(self) -> Self {
        let points = self.points.into_iter().filter(|p| !p.is_marker()).collect();
        Self::new(self.name, points)
    }

    /// Returns the cloud moved by `offset`.
    #[must_use]
    pub fn translated(self, offset: DVec3) -> Self {
        let points = self
            .points
            .into_iter()
            .map(|p| p.with_position((p.position.as_dvec3() + offset).as_vec3()))
            .collect();
        Self::new(self.name, points)
    }

    /// Returns the cloud recentred on its centroid, with the centroid removed.
    ///
    /// An empty cloud is returned unchanged with a zero centroid.
    #[must_use]
    pub fn centered(self) -> (Self, DVec3) {
        match self.centroid() {
            Some(c) => (self.translated(-c), c),
            None => (self, DVec3::ZERO),
        }
    }

    /// Returns the cloud under a new name.
    #[must_use]
    pub fn renamed(self, name: impl Into<String>) -> Self {
        Self::new(name, self.points)
    }
}
