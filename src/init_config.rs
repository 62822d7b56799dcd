// init_config.rs
// Handles loading and parsing a run configuration (initial lattice, simulation
// parameters, output options) from a TOML file

use rand::Rng;
use rand_distr::{Distribution, Poisson};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{self, SimConfig};
use crate::error::{LatticeError, LatticeResult};
use crate::io::{self, SnapshotFormat};
use crate::lattice::{filled_grid, grid_shape, Grid, Lattice};
use crate::renderer::{RenderMode, RenderOptions};
use crate::simulation::{streams, Simulation};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunConfig {
    #[serde(default)]
    pub simulation: SimulationSection,
    pub lattice: LatticeConfig,
    #[serde(default)]
    pub output: OutputConfig,
    /// Directory that relative image paths are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SimulationSection {
    /// Number of diffusion steps. Falls back to the default when omitted.
    pub steps: Option<u64>,
    #[serde(flatten)]
    pub params: SimConfig,
}

impl SimulationSection {
    pub fn steps(&self) -> u64 {
        self.steps.unwrap_or(config::DEFAULT_STEPS)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LatticeConfig {
    pub width: usize,
    pub height: usize,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

/// One contribution to the initial occupancy. Contributions add up.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Same count on every site
    Uniform { occupancy: i64 },
    /// Independent Poisson-distributed count on every site
    Poisson { mean: f64 },
    /// Axis-aligned rectangle; clipped to the lattice
    Block {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        occupancy: i64,
    },
    /// Grayscale charge map scaled by `scale`. With a `negative` map both
    /// images give exact signed counts; otherwise signs are random.
    Image {
        path: PathBuf,
        #[serde(default)]
        negative: Option<PathBuf>,
        #[serde(default = "default_image_scale")]
        scale: f64,
    },
}

fn default_image_scale() -> f64 {
    1.0
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
    /// Render every N-th frame; 0 disables frame output
    pub frame_interval: u64,
    pub mode: String,
    pub intensity: f64,
    pub upscale: u32,
    pub gif: bool,
    pub gif_delay_ms: u32,
    /// Also write a colour charge map per rendered frame
    pub colour_charge: bool,
    pub stats_csv: bool,
    pub snapshot: Option<SnapshotConfig>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("output"),
            frame_interval: 1,
            mode: RenderMode::Population.to_string(),
            intensity: config::DEFAULT_RENDER_INTENSITY,
            upscale: config::DEFAULT_RENDER_UPSCALE,
            gif: true,
            gif_delay_ms: config::DEFAULT_GIF_DELAY_MS,
            colour_charge: false,
            stats_csv: true,
            snapshot: None,
        }
    }
}

impl OutputConfig {
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            intensity: self.intensity,
            upscale: self.upscale,
        }
    }

    pub fn render_mode(&self) -> LatticeResult<RenderMode> {
        self.mode.parse()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SnapshotConfig {
    #[serde(default)]
    pub format: SnapshotFormat,
    #[serde(default)]
    pub compress: bool,
    /// File name inside the output directory
    #[serde(default = "default_snapshot_name")]
    pub file: String,
}

fn default_snapshot_name() -> String {
    "final_state.snap".to_string()
}

impl Default for RunConfig {
    /// A centred square of charges in an otherwise empty lattice.
    fn default() -> Self {
        let offset_x = (config::DEFAULT_WIDTH - config::DEFAULT_BLOCK_SIZE) / 2;
        let offset_y = (config::DEFAULT_HEIGHT - config::DEFAULT_BLOCK_SIZE) / 2;
        Self {
            simulation: SimulationSection::default(),
            lattice: LatticeConfig {
                width: config::DEFAULT_WIDTH,
                height: config::DEFAULT_HEIGHT,
                sources: vec![SourceConfig::Block {
                    x: offset_x,
                    y: offset_y,
                    width: config::DEFAULT_BLOCK_SIZE,
                    height: config::DEFAULT_BLOCK_SIZE,
                    occupancy: config::DEFAULT_BLOCK_OCCUPANCY,
                }],
            },
            output: OutputConfig::default(),
            base_dir: PathBuf::new(),
        }
    }
}

impl RunConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> LatticeResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&content)?;
        config.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> LatticeResult<Self> {
        let config: RunConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> LatticeResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> LatticeResult<()> {
        if self.lattice.width == 0 || self.lattice.height == 0 {
            return Err(LatticeError::InvalidDimensions(format!(
                "lattice must be non-empty, got {}x{}",
                self.lattice.width, self.lattice.height
            )));
        }
        self.simulation.params.validate()?;
        self.output.render_mode()?;
        if self.output.upscale == 0 {
            return Err(LatticeError::invalid_parameter("upscale", "must be at least 1"));
        }
        Ok(())
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Builds the initial lattice. Random signs and Poisson counts are drawn
    /// from the seed's initialisation stream.
    pub fn build_lattice(&self) -> LatticeResult<Lattice> {
        let mut rng = streams::init_stream(self.simulation.params.seed);
        self.build_lattice_with(&mut rng)
    }

    pub fn build_lattice_with<R: Rng + ?Sized>(&self, rng: &mut R) -> LatticeResult<Lattice> {
        let (width, height) = (self.lattice.width, self.lattice.height);
        let mut random_signs = filled_grid(width, height, 0);
        let mut positive = filled_grid(width, height, 0);
        let mut negative = filled_grid(width, height, 0);

        for source in &self.lattice.sources {
            match source {
                SourceConfig::Uniform { occupancy } => {
                    check_count("occupancy", *occupancy)?;
                    add_each(&mut random_signs, |_, _| *occupancy);
                }
                SourceConfig::Poisson { mean } => {
                    let poisson = Poisson::new(*mean).map_err(|e| {
                        LatticeError::invalid_parameter("mean", format!("{mean}: {e}"))
                    })?;
                    add_each(&mut random_signs, |_, _| poisson.sample(rng) as i64);
                }
                SourceConfig::Block {
                    x,
                    y,
                    width: w,
                    height: h,
                    occupancy,
                } => {
                    check_count("occupancy", *occupancy)?;
                    let x_end = (x + w).min(width);
                    let y_end = (y + h).min(height);
                    for row in random_signs.iter_mut().take(y_end).skip(*y) {
                        for count in row.iter_mut().take(x_end).skip(*x) {
                            *count += occupancy;
                        }
                    }
                }
                SourceConfig::Image {
                    path,
                    negative: negative_path,
                    scale,
                } => match negative_path {
                    Some(negative_path) => {
                        let (pos_map, neg_map) = io::charge_maps_from_images(
                            self.resolve(path),
                            self.resolve(negative_path),
                            *scale,
                        )?;
                        add_map(&mut positive, &pos_map)?;
                        add_map(&mut negative, &neg_map)?;
                    }
                    None => {
                        let map = io::occupancy_from_image(self.resolve(path), *scale)?;
                        add_map(&mut random_signs, &map)?;
                    }
                },
            }
        }

        let mut lattice = Lattice::from_occupancy(&random_signs, rng)?;
        lattice.deposit_maps(&positive, &negative)?;
        Ok(lattice)
    }

    pub fn build_simulation(&self) -> LatticeResult<Simulation> {
        let lattice = self.build_lattice()?;
        Simulation::new(lattice, self.simulation.params.clone())
    }
}

fn check_count(name: &'static str, count: i64) -> LatticeResult<()> {
    if count < 0 {
        return Err(LatticeError::invalid_parameter(
            name,
            format!("must be non-negative, got {count}"),
        ));
    }
    Ok(())
}

fn add_each(grid: &mut Grid, mut f: impl FnMut(usize, usize) -> i64) {
    for (y, row) in grid.iter_mut().enumerate() {
        for (x, count) in row.iter_mut().enumerate() {
            *count += f(x, y);
        }
    }
}

fn add_map(grid: &mut Grid, map: &[Vec<i64>]) -> LatticeResult<()> {
    let expected = grid_shape(grid)?;
    let found = grid_shape(map)?;
    if expected != found {
        return Err(LatticeError::InvalidDimensions(format!(
            "charge map is {}x{} but the lattice is {}x{}",
            found.0, found.1, expected.0, expected.1
        )));
    }
    add_each(grid, |x, y| map[y][x]);
    Ok(())
}
