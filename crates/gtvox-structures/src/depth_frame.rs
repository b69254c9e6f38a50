//! Depth frames and raw BGRA images.
//!
//! Depth cameras encode distance into the R, G and B bytes of a BGRA buffer:
//!
//! ```text
//! normalized = (R + G * 256 + B * 256^2) / (256^3 - 1)
//! ```
//!
//! A normalized depth of 1 sits on the far clip plane and means "no return".

use gtvox_core::{Color, GtError, Result};

/// Denominator of the 24-bit depth encoding.
const DEPTH_SCALE: f64 = 16_777_215.0;

/// Decodes one BGRA pixel into a normalized depth in `[0, 1]`.
#[must_use]
pub fn decode_depth_pixel(pixel: [u8; 4]) -> f32 {
    let [b, g, r, _a] = pixel;
    let encoded = f64::from(r) + f64::from(g) * 256.0 + f64::from(b) * 65_536.0;
    (encoded / DEPTH_SCALE) as f32
}

/// A raw 8-bit BGRA image as delivered by a camera sensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BgraImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl BgraImage {
    /// Wraps a raw buffer, failing if it does not hold `width * height` pixels.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(GtError::BufferSize {
                what: "BGRA image",
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw BGRA bytes, row-major from the top-left pixel.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Pixel at column `u`, row `v`.
    #[must_use]
    pub fn pixel(&self, u: u32, v: u32) -> [u8; 4] {
        let i = (v as usize * self.width as usize + u as usize) * 4;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    /// Colour at column `u`, row `v`.
    #[must_use]
    pub fn color(&self, u: u32, v: u32) -> Color {
        Color::from_bgra(self.pixel(u, v))
    }
}

/// A 2D grid of normalized depth values.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthFrame {
    width: u32,
    height: u32,
    depth: Vec<f32>,
}

impl DepthFrame {
    /// Creates a frame from normalized depths, row-major.
    pub fn from_normalized(width: u32, height: u32, depth: Vec<f32>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if depth.len() != expected {
            return Err(GtError::SizeMismatch {
                expected,
                actual: depth.len(),
            });
        }
        Ok(Self {
            width,
            height,
            depth,
        })
    }

    /// Decodes a raw BGRA depth buffer.
    pub fn from_bgra(width: u32, height: u32, raw: &[u8]) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if raw.len() != expected {
            return Err(GtError::BufferSize {
                what: "depth image",
                expected,
                actual: raw.len(),
            });
        }
        let depth = raw
            .chunks_exact(4)
            .map(|c| decode_depth_pixel([c[0], c[1], c[2], c[3]]))
            .collect();
        Ok(Self {
            width,
            height,
            depth,
        })
    }

    /// Decodes an already-validated BGRA image.
    pub fn from_image(image: &BgraImage) -> Result<Self> {
        Self::from_bgra(image.width(), image.height(), image.data())
    }

    /// A frame filled with one normalized depth.
    #[must_use]
    pub fn filled(width: u32, height: u32, value: f32) -> Self {
        Self {
            width,
            height,
            depth: vec![value; width as usize * height as usize],
        }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Normalized depth at column `u`, row `v`.
    #[must_use]
    pub fn get(&self, u: u32, v: u32) -> f32 {
        self.depth[v as usize * self.width as usize + u as usize]
    }

    /// All normalized depths, row-major.
    #[must_use]
    pub fn values(&self) -> &[f32] {
        &self.depth
    }
}
