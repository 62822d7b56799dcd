use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, DynamicImage, Frame, GrayImage};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Cursor, Read, Write};
use std::path::{Path, PathBuf};

use crate::config::SimConfig;
use crate::error::{LatticeError, LatticeResult};
use crate::lattice::{grid_shape, Grid, Lattice};
use crate::profile_scope;
use crate::simulation::Simulation;

// ====================
// Charge maps
// ====================

/// Occupancy counts from an 8-bit grayscale charge map: a pixel of intensity
/// `v` becomes `floor(v * scale)` charges. Colour images are converted to
/// luma first.
pub fn occupancy_from_image<P: AsRef<Path>>(path: P, scale: f64) -> LatticeResult<Grid> {
    profile_scope!("occupancy_from_image");
    let image = image::open(path.as_ref())?.into_luma8();
    occupancy_from_luma(&image, scale)
}

pub fn occupancy_from_luma(image: &GrayImage, scale: f64) -> LatticeResult<Grid> {
    if !scale.is_finite() || scale < 0.0 {
        return Err(LatticeError::invalid_parameter(
            "scale",
            format!("image scale must be a non-negative finite number, got {scale}"),
        ));
    }
    let (width, height) = image.dimensions();
    let grid: Grid = (0..height)
        .map(|y| {
            (0..width)
                .map(|x| (image.get_pixel(x, y).0[0] as f64 * scale).floor() as i64)
                .collect()
        })
        .collect();
    grid_shape(&grid)?;
    Ok(grid)
}

/// Positive and negative occupancy maps from two images of the same size.
pub fn charge_maps_from_images<P: AsRef<Path>, Q: AsRef<Path>>(
    positive: P,
    negative: Q,
    scale: f64,
) -> LatticeResult<(Grid, Grid)> {
    let positive = occupancy_from_image(positive, scale)?;
    let negative = occupancy_from_image(negative, scale)?;
    let (pw, ph) = grid_shape(&positive)?;
    let (nw, nh) = grid_shape(&negative)?;
    if (pw, ph) != (nw, nh) {
        return Err(LatticeError::InvalidDimensions(format!(
            "positive map is {pw}x{ph} but negative map is {nw}x{nh}"
        )));
    }
    Ok((positive, negative))
}

// ====================
// Frames
// ====================

pub fn frame_path<P: AsRef<Path>>(dir: P, index: u64) -> PathBuf {
    dir.as_ref().join(format!("frame_{index:05}.png"))
}

/// Writes `frame_<index>.png` into `dir`, creating the directory if needed.
pub fn save_frame<P: AsRef<Path>>(image: &GrayImage, dir: P, index: u64) -> LatticeResult<PathBuf> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;
    let path = frame_path(dir, index);
    image.save(&path)?;
    Ok(path)
}

/// Encodes the frames as a looping animated GIF, `delay_ms` per frame.
pub fn write_gif<P: AsRef<Path>>(frames: &[GrayImage], path: P, delay_ms: u32) -> LatticeResult<()> {
    profile_scope!("write_gif");
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let writer = BufWriter::new(File::create(path)?);
    let mut encoder = GifEncoder::new(writer);
    encoder.set_repeat(Repeat::Infinite)?;
    let delay = Delay::from_numer_denom_ms(delay_ms, 1);
    let frames = frames.iter().map(|gray| {
        let rgba = DynamicImage::ImageLuma8(gray.clone()).into_rgba8();
        Frame::from_parts(rgba, 0, 0, delay)
    });
    encoder.encode_frames(frames)?;
    Ok(())
}

// ====================
// Snapshots
// ====================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotFormat {
    #[default]
    Json,
    Binary,
}

/// Everything needed to continue a run bit-for-bit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub frame: u64,
    pub config: SimConfig,
    pub lattice: Lattice,
}

impl Snapshot {
    pub fn from_simulation(sim: &Simulation) -> Self {
        Self {
            frame: sim.frame(),
            config: sim.config.clone(),
            lattice: sim.lattice().clone(),
        }
    }

    pub fn into_simulation(self) -> LatticeResult<Simulation> {
        Simulation::resume(self.lattice, self.config, self.frame)
    }
}

pub fn save_snapshot<P: AsRef<Path>>(
    path: P,
    snapshot: &Snapshot,
    format: SnapshotFormat,
    compress: bool,
) -> LatticeResult<()> {
    profile_scope!("save_snapshot");
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    // Write to a temporary file first to avoid truncation on crash/interruption
    let tmp_path = path.with_extension({
        let mut os = path.extension().map(|e| e.to_os_string()).unwrap_or_default();
        os.push(".tmp");
        os
    });
    {
        let writer = BufWriter::new(File::create(&tmp_path)?);
        if compress {
            let mut encoder = GzEncoder::new(writer, Compression::fast());
            encode_snapshot(&mut encoder, snapshot, format)?;
            let mut writer = encoder.finish()?;
            writer.flush()?;
        } else {
            let mut writer = writer;
            encode_snapshot(&mut writer, snapshot, format)?;
            writer.flush()?;
        }
    }
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

fn encode_snapshot<W: Write>(writer: W, snapshot: &Snapshot, format: SnapshotFormat) -> LatticeResult<()> {
    match format {
        SnapshotFormat::Json => serde_json::to_writer(writer, snapshot)?,
        SnapshotFormat::Binary => bincode::serialize_into(writer, snapshot)?,
    }
    Ok(())
}

/// Loads a snapshot written by `save_snapshot` in any format, gzipped or not.
pub fn load_snapshot<P: AsRef<Path>>(path: P) -> LatticeResult<Snapshot> {
    profile_scope!("load_snapshot");
    let data = std::fs::read(path.as_ref())?;
    let snapshot = match maybe_decompress_gzip(&data)? {
        Some(decoded) => parse_snapshot_bytes(&decoded)?,
        None => parse_snapshot_bytes(&data)?,
    };
    snapshot.lattice.validate()?;
    Ok(snapshot)
}

fn parse_snapshot_bytes(bytes: &[u8]) -> LatticeResult<Snapshot> {
    match serde_json::from_slice::<Snapshot>(bytes) {
        Ok(snapshot) => Ok(snapshot),
        Err(json_err) => bincode::deserialize::<Snapshot>(bytes).map_err(|_| json_err.into()),
    }
}

fn maybe_decompress_gzip(data: &[u8]) -> std::io::Result<Option<Vec<u8>>> {
    if data.len() < 2 || data[0] != 0x1f || data[1] != 0x8b {
        return Ok(None);
    }

    let mut decoder = GzDecoder::new(Cursor::new(data));
    let mut decoded = Vec::new();
    decoder.read_to_end(&mut decoded)?;
    Ok(Some(decoded))
}
