// renderer/mod.rs
// Maps a lattice field to a raster image. Pure functions; no window or GPU.

use std::fmt;
use std::str::FromStr;

use image::{GrayImage, ImageBuffer, Luma, Pixel, Rgb, RgbImage};
use palette::{LinSrgb, Mix, Srgb};
use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_RENDER_INTENSITY, DEFAULT_RENDER_UPSCALE};
use crate::error::{LatticeError, LatticeResult};
use crate::lattice::Lattice;

/// Grey level of a neutral cell in charge mode.
pub const CHARGE_MIDPOINT: f64 = 128.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    Population,
    Charge,
}

impl FromStr for RenderMode {
    type Err = LatticeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "population" => Ok(RenderMode::Population),
            "charge" => Ok(RenderMode::Charge),
            other => Err(LatticeError::InvalidMode(other.to_string())),
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderMode::Population => write!(f, "population"),
            RenderMode::Charge => write!(f, "charge"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Grey levels per unit of population (or charge)
    pub intensity: f64,
    /// Output pixels per lattice site along each axis
    pub upscale: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            intensity: DEFAULT_RENDER_INTENSITY,
            upscale: DEFAULT_RENDER_UPSCALE,
        }
    }
}

impl RenderOptions {
    fn validate(&self) -> LatticeResult<()> {
        if self.upscale == 0 {
            return Err(LatticeError::invalid_parameter("upscale", "must be at least 1"));
        }
        if !self.intensity.is_finite() {
            return Err(LatticeError::invalid_parameter(
                "intensity",
                format!("must be finite, got {}", self.intensity),
            ));
        }
        Ok(())
    }
}

/// Grayscale raster: `intensity * population`, or `128 + intensity * charge`,
/// clamped to 8 bits. Pixel `(x, y)` is lattice site `(x, y)`.
pub fn render(lattice: &Lattice, options: &RenderOptions, mode: RenderMode) -> LatticeResult<GrayImage> {
    options.validate()?;
    let (width, height) = lattice.dimensions();
    let mut image = GrayImage::new(width as u32, height as u32);
    for y in 0..height {
        for x in 0..width {
            let cell = lattice.cell(x, y);
            let level = match mode {
                RenderMode::Population => options.intensity * cell.population() as f64,
                RenderMode::Charge => CHARGE_MIDPOINT + options.intensity * cell.total_charge() as f64,
            };
            image.put_pixel(x as u32, y as u32, Luma([to_grey(level)]));
        }
    }
    Ok(upscale(image, options.upscale))
}

/// Diverging colour map of the charge field: blue for negative, white for
/// neutral, red for positive, normalised to the largest |charge|.
pub fn render_charge_rgb(lattice: &Lattice, upscale_factor: u32) -> LatticeResult<RgbImage> {
    if upscale_factor == 0 {
        return Err(LatticeError::invalid_parameter("upscale", "must be at least 1"));
    }
    let (width, height) = lattice.dimensions();
    let max_abs = lattice
        .cells()
        .iter()
        .map(|c| c.total_charge().abs())
        .max()
        .unwrap_or(0)
        .max(1) as f32;

    let negative = LinSrgb::new(0.0f32, 0.1, 1.0);
    let neutral = LinSrgb::new(1.0f32, 1.0, 1.0);
    let positive = LinSrgb::new(1.0f32, 0.05, 0.0);

    let mut image = RgbImage::new(width as u32, height as u32);
    for y in 0..height {
        for x in 0..width {
            let t = (lattice.charge_at(x, y) as f32 / max_abs).clamp(-1.0, 1.0);
            let lin = if t < 0.0 {
                neutral.mix(negative, -t)
            } else {
                neutral.mix(positive, t)
            };
            let srgb: Srgb<u8> = Srgb::from_linear(lin);
            image.put_pixel(x as u32, y as u32, Rgb([srgb.red, srgb.green, srgb.blue]));
        }
    }
    Ok(upscale(image, upscale_factor))
}

fn to_grey(level: f64) -> u8 {
    level.round().clamp(0.0, 255.0) as u8
}

/// Nearest-neighbour enlargement by an integer factor.
fn upscale<P: Pixel>(image: ImageBuffer<P, Vec<P::Subpixel>>, factor: u32) -> ImageBuffer<P, Vec<P::Subpixel>> {
    if factor == 1 {
        return image;
    }
    let (w, h) = image.dimensions();
    ImageBuffer::from_fn(w * factor, h * factor, |x, y| *image.get_pixel(x / factor, y / factor))
}
