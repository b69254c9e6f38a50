//! Raw lidar sweeps.

use glam::Vec3;
use gtvox_core::{GtError, Result};

/// Bytes per `(x, y, z, intensity)` record.
const RECORD_BYTES: usize = 16;

/// One lidar sweep in sensor-local coordinates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LidarSweep {
    records: Vec<[f32; 4]>,
}

impl LidarSweep {
    /// Creates a sweep from `(x, y, z, intensity)` records.
    pub fn new(records: Vec<[f32; 4]>) -> Self {
        Self { records }
    }

    /// Creates a sweep from positions with zero intensity.
    pub fn from_positions(positions: impl IntoIterator<Item = Vec3>) -> Self {
        Self::new(positions.into_iter().map(|p| [p.x, p.y, p.z, 0.0]).collect())
    }

    /// Parses a flat little-endian buffer of 4-float records.
    ///
    /// Fails if the buffer length is not a whole number of records.
    pub fn from_le_bytes(raw: &[u8]) -> Result<Self> {
        if raw.len() % RECORD_BYTES != 0 {
            return Err(GtError::BufferSize {
                what: "lidar",
                expected: (raw.len() / RECORD_BYTES + 1) * RECORD_BYTES,
                actual: raw.len(),
            });
        }
        let records = raw
            .chunks_exact(RECORD_BYTES)
            .map(|rec| {
                let mut out = [0.0_f32; 4];
                for (value, bytes) in out.iter_mut().zip(rec.chunks_exact(4)) {
                    *value = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                }
                out
            })
            .collect();
        Ok(Self { records })
    }

    /// Serializes back to the flat little-endian layout.
    #[must_use]
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.records
            .iter()
            .flat_map(|rec| rec.iter().flat_map(|v| v.to_le_bytes()))
            .collect()
    }

    /// Number of returns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Positions with the intensity channel dropped.
    #[must_use]
    pub fn positions(&self) -> Vec<Vec3> {
        self.records
            .iter()
            .map(|&[x, y, z, _intensity]| Vec3::new(x, y, z))
            .collect()
    }
}
