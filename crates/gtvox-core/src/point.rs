//! Tagged points.
//!
//! Every point carries the sensor it came from. Marker points are recognised by
//! their [`PointSource::Marker`] tag, never by their colour, so a genuinely red
//! sample from an RGB camera is never confused with a marker.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// An 8-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// Pure red, used for marker points.
    pub const RED: Self = Self::new(255, 0, 0);
    /// Pure blue, used for lidar returns.
    pub const BLUE: Self = Self::new(0, 0, 255);

    /// Creates a colour from its components.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Reads a colour from one BGRA pixel.
    #[must_use]
    pub const fn from_bgra(pixel: [u8; 4]) -> Self {
        Self::new(pixel[2], pixel[1], pixel[0])
    }
}

/// The sensor (or synthetic origin) a point belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointSource {
    /// Front-facing rig depth camera.
    Front,
    /// Right-facing rig depth camera.
    Right,
    /// Left-facing rig depth camera.
    Left,
    /// Rear-facing rig depth camera.
    Back,
    /// Lidar return.
    Lidar,
    /// Synthetic sentinel tracking a sensor's reconstructed origin.
    Marker,
}

impl PointSource {
    /// The rig cameras in fusion order.
    pub const RIG: [Self; 4] = [Self::Front, Self::Right, Self::Left, Self::Back];

    /// Fixed colour used when no paired RGB image is available.
    #[must_use]
    pub const fn tag_color(self) -> Color {
        match self {
            Self::Front => Color::new(0, 200, 0),
            Self::Right => Color::new(200, 200, 0),
            Self::Left => Color::new(0, 200, 200),
            Self::Back => Color::new(200, 0, 200),
            Self::Lidar => Color::BLUE,
            Self::Marker => Color::RED,
        }
    }

    /// Returns true for synthetic marker points.
    #[must_use]
    pub const fn is_marker(self) -> bool {
        matches!(self, Self::Marker)
    }

    /// Short lowercase name used in logs and error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Front => "front",
            Self::Right => "right",
            Self::Left => "left",
            Self::Back => "back",
            Self::Lidar => "lidar",
            Self::Marker => "marker",
        }
    }
}

impl std::fmt::Display for PointSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A 3D position with its colour and source tag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColoredPoint {
    pub position: Vec3,
    pub color: Color,
    pub source: PointSource,
}

impl ColoredPoint {
    /// Creates a point with an explicit colour.
    #[must_use]
    pub const fn new(position: Vec3, color: Color, source: PointSource) -> Self {
        Self {
            position,
            color,
            source,
        }
    }

    /// Creates a point coloured with its source's tag colour.
    #[must_use]
    pub const fn tagged(position: Vec3, source: PointSource) -> Self {
        Self::new(position, source.tag_color(), source)
    }

    /// Creates a marker point.
    #[must_use]
    pub const fn marker(position: Vec3) -> Self {
        Self::tagged(position, PointSource::Marker)
    }

    /// Returns true if this is a synthetic marker.
    #[must_use]
    pub const fn is_marker(&self) -> bool {
        self.source.is_marker()
    }

    /// Returns a copy moved to `position`, keeping colour and tag.
    #[must_use]
    pub const fn with_position(self, position: Vec3) -> Self {
        Self { position, ..self }
    }
}
