//! Artifact export: images, point clouds and occupancy archives.
//!
//! Every frame writes into four sibling directories under the output root:
//!
//! ```text
//! <root>/rgb/<stem>.png
//! <root>/depth/<stem>.png
//! <root>/lidar/<stem>.ply
//! <root>/ground_truth/<stem>.npz   (+ <stem>.ply when enabled)
//! ```
//!
//! `<stem>` is `YYYYmmdd_HHMMSS_<frame:06>`, so names sort by capture time and
//! then by frame.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use gtvox_core::OutputConfig;
use gtvox_structures::{BgraImage, DepthFrame, OccupancyGrid, PointCloud};
use image::{GrayImage, ImageBuffer, Rgba};
use ndarray::Array3;
use ndarray_npy::NpzWriter;
use ply_rs::ply::{
    Addable, DefaultElement, ElementDef, Encoding, Ply, Property, PropertyDef, PropertyType,
    ScalarType,
};
use ply_rs::writer::Writer;

use crate::error::{ExportError, Result};
use crate::pipeline::{FrameOutput, TickFrames};

/// `ln` of the smallest normalized depth that maps to a non-zero grey level.
const LOG_DEPTH_RANGE: f32 = 5.703_78;

/// Saves a raw BGRA buffer as a PNG.
pub fn save_bgra_png(path: &Path, image: &BgraImage) -> std::result::Result<(), ExportError> {
    // Swap B and R
    let mut rgba = image.data().to_vec();
    for chunk in rgba.chunks_exact_mut(4) {
        chunk.swap(0, 2);
    }

    let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
        ImageBuffer::from_raw(image.width(), image.height(), rgba)
            .ok_or(ExportError::InvalidImageData)?;
    img.save_with_format(path, image::ImageFormat::Png)?;
    Ok(())
}

/// Grey level for one normalized depth on a logarithmic scale.
///
/// `v = clamp(1 + ln(depth) / 5.70378, 0, 1)`, grey = `round(255 * v)`.
#[must_use]
pub fn log_depth_grey(normalized: f32) -> u8 {
    if normalized <= 0.0 || !normalized.is_finite() {
        return 0;
    }
    let v = (1.0 + normalized.ln() / LOG_DEPTH_RANGE).clamp(0.0, 1.0);
    (v * 255.0).round() as u8
}

/// Saves a depth frame as a greyscale PNG using [`log_depth_grey`].
pub fn save_depth_png(path: &Path, depth: &DepthFrame) -> std::result::Result<(), ExportError> {
    let grey = depth.values().iter().map(|&d| log_depth_grey(d)).collect();
    let img = GrayImage::from_raw(depth.width(), depth.height(), grey)
        .ok_or(ExportError::InvalidImageData)?;
    img.save_with_format(path, image::ImageFormat::Png)?;
    Ok(())
}

/// Encodes a cloud as binary little-endian PLY.
///
/// Vertices carry `x, y, z` as float and, with `with_colors`, `red, green, blue` as uchar.
pub fn write_ply<W: Write>(
    out: &mut W,
    cloud: &PointCloud,
    with_colors: bool,
) -> std::result::Result<(), ExportError> {
    let mut ply = Ply::<DefaultElement>::new();
    ply.header.encoding = Encoding::BinaryLittleEndian;

    let mut vertex = ElementDef::new("vertex".to_string());
    for axis in ["x", "y", "z"] {
        vertex.properties.add(PropertyDef::new(
            axis.to_string(),
            PropertyType::Scalar(ScalarType::Float),
        ));
    }
    if with_colors {
        for channel in ["red", "green", "blue"] {
            vertex.properties.add(PropertyDef::new(
                channel.to_string(),
                PropertyType::Scalar(ScalarType::UChar),
            ));
        }
    }
    ply.header.elements.add(vertex);

    let vertices = cloud
        .points()
        .iter()
        .map(|p| {
            let mut element = DefaultElement::new();
            element.insert("x".to_string(), Property::Float(p.position.x));
            element.insert("y".to_string(), Property::Float(p.position.y));
            element.insert("z".to_string(), Property::Float(p.position.z));
            if with_colors {
                element.insert("red".to_string(), Property::UChar(p.color.r));
                element.insert("green".to_string(), Property::UChar(p.color.g));
                element.insert("blue".to_string(), Property::UChar(p.color.b));
            }
            element
        })
        .collect();
    ply.payload.insert("vertex".to_string(), vertices);

    Writer::new().write_ply(out, &mut ply)?;
    Ok(())
}

/// Saves a cloud as a PLY file.
pub fn save_ply(
    path: &Path,
    cloud: &PointCloud,
    with_colors: bool,
) -> std::result::Result<(), ExportError> {
    let mut out = BufWriter::new(File::create(path)?);
    write_ply(&mut out, cloud, with_colors)?;
    out.flush()?;
    Ok(())
}

/// The grid as an `(nx, ny, nz)` byte array.
pub fn grid_array(grid: &OccupancyGrid) -> std::result::Result<Array3<u8>, ExportError> {
    let [nx, ny, nz] = grid.dims();
    Ok(Array3::from_shape_vec((nx, ny, nz), grid.data().to_vec())?)
}

/// Saves the grid into a compressed `.npz` archive under the name `arr_0`.
pub fn save_grid_npz(path: &Path, grid: &OccupancyGrid) -> std::result::Result<(), ExportError> {
    let array = grid_array(grid)?;
    let mut npz = NpzWriter::new_compressed(File::create(path)?);
    npz.add_array("arr_0", &array)?;
    npz.finish()?;
    Ok(())
}

/// Writes every per-frame artifact under one output root.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    root: PathBuf,
    save_ground_truth_cloud: bool,
}

impl ArtifactWriter {
    pub const RGB_DIR: &'static str = "rgb";
    pub const DEPTH_DIR: &'static str = "depth";
    pub const LIDAR_DIR: &'static str = "lidar";
    pub const GROUND_TRUTH_DIR: &'static str = "ground_truth";

    /// Creates the output directories.
    pub fn create(config: &OutputConfig) -> Result<Self> {
        for dir in [
            Self::RGB_DIR,
            Self::DEPTH_DIR,
            Self::LIDAR_DIR,
            Self::GROUND_TRUTH_DIR,
        ] {
            std::fs::create_dir_all(config.root.join(dir))?;
        }
        log::info!("writing artifacts under {}", config.root.display());
        Ok(Self {
            root: config.root.clone(),
            save_ground_truth_cloud: config.save_ground_truth_cloud,
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File stem for `frame`, stamped with the current local time.
    #[must_use]
    pub fn frame_stem(&self, frame: u64) -> String {
        format!("{}_{frame:06}", chrono::Local::now().format("%Y%m%d_%H%M%S"))
    }

    /// Path of an artifact with the given stem and extension.
    #[must_use]
    pub fn path(&self, dir: &str, stem: &str, extension: &str) -> PathBuf {
        self.root.join(dir).join(format!("{stem}.{extension}"))
    }

    /// Writes the dataset RGB and depth images of one tick.
    pub fn write_inputs(&self, stem: &str, tick: &TickFrames) -> Result<Vec<PathBuf>> {
        let rgb = self.path(Self::RGB_DIR, stem, "png");
        save_bgra_png(&rgb, &tick.dataset_rgb.image)?;

        let depth = self.path(Self::DEPTH_DIR, stem, "png");
        save_depth_png(&depth, &DepthFrame::from_image(&tick.dataset_depth.image)?)?;

        log::info!("saved {} and {}", rgb.display(), depth.display());
        Ok(vec![rgb, depth])
    }

    /// Writes the lidar cloud, the occupancy archive and optionally the ground-truth cloud.
    pub fn write_output(&self, stem: &str, output: &FrameOutput) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(3);

        let lidar = self.path(Self::LIDAR_DIR, stem, "ply");
        save_ply(&lidar, &output.lidar, false)?;
        written.push(lidar);

        let grid = self.path(Self::GROUND_TRUTH_DIR, stem, "npz");
        save_grid_npz(&grid, &output.grid)?;
        written.push(grid);

        if self.save_ground_truth_cloud {
            let cloud = self.path(Self::GROUND_TRUTH_DIR, stem, "ply");
            save_ply(&cloud, &output.ground_truth, true)?;
            written.push(cloud);
        }

        for path in &written {
            log::info!("saved {}", path.display());
        }
        Ok(written)
    }
}
