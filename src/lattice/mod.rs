// lattice/mod.rs
// The fluid medium: a fixed width x height grid of charge cells

use image::GrayImage;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::cell::{ChargeCell, NEGATIVE, POSITIVE};
use crate::error::{LatticeError, LatticeResult};
use crate::renderer::{self, RenderMode, RenderOptions};

/// Row-major 2D array of counts; the outer index is `y`.
pub type Grid = Vec<Vec<i64>>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lattice {
    width: usize,
    height: usize,
    cells: Vec<ChargeCell>,
}

impl Lattice {
    pub fn empty(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![ChargeCell::empty(); width * height],
        }
    }

    /// One cell per grid position, each populated with randomly signed
    /// charges. Fails on an empty or ragged grid or a negative count.
    pub fn from_occupancy<R: Rng + ?Sized>(grid: &[Vec<i64>], rng: &mut R) -> LatticeResult<Self> {
        let (width, height) = grid_shape(grid)?;
        let mut cells = Vec::with_capacity(width * height);
        for row in grid {
            for &occupancy in row {
                cells.push(ChargeCell::new(occupancy, rng));
            }
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Deterministic construction from separate positive and negative
    /// count maps of identical shape.
    pub fn from_signed_maps(positive: &[Vec<i64>], negative: &[Vec<i64>]) -> LatticeResult<Self> {
        let (width, height) = grid_shape(positive)?;
        let shape = grid_shape(negative)?;
        if shape != (width, height) {
            return Err(LatticeError::InvalidDimensions(format!(
                "positive map is {width}x{height} but negative map is {}x{}",
                shape.0, shape.1
            )));
        }
        let mut lattice = Self::empty(width, height);
        lattice.deposit_maps(positive, negative)?;
        Ok(lattice)
    }

    /// Add deterministic signed charges on top of the current content.
    pub fn deposit_maps(&mut self, positive: &[Vec<i64>], negative: &[Vec<i64>]) -> LatticeResult<()> {
        for (name, grid) in [("positive", positive), ("negative", negative)] {
            let shape = grid_shape(grid)?;
            if shape != (self.width, self.height) {
                return Err(LatticeError::InvalidDimensions(format!(
                    "{name} map is {}x{} but the lattice is {}x{}",
                    shape.0, shape.1, self.width, self.height
                )));
            }
        }
        for y in 0..self.height {
            for x in 0..self.width {
                let idx = self.index(x, y);
                self.cells[idx].deposit(positive[y][x] as usize, negative[y][x] as usize);
            }
        }
        Ok(())
    }

    /// Rebuild from raw parts, checking that the cell count matches.
    pub fn from_cells(width: usize, height: usize, cells: Vec<ChargeCell>) -> LatticeResult<Self> {
        let lattice = Self {
            width,
            height,
            cells,
        };
        lattice.validate()?;
        Ok(lattice)
    }

    pub fn validate(&self) -> LatticeResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(LatticeError::InvalidDimensions(format!(
                "lattice must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }
        if self.cells.len() != self.width * self.height {
            return Err(LatticeError::InvalidDimensions(format!(
                "{}x{} lattice holds {} cells",
                self.width,
                self.height,
                self.cells.len()
            )));
        }
        for (idx, cell) in self.cells.iter().enumerate() {
            if let Some(q) = cell.iter().find(|&q| q != POSITIVE && q != NEGATIVE) {
                return Err(LatticeError::invalid_parameter(
                    "charge",
                    format!(
                        "site ({}, {}) holds charge {q}, expected +1 or -1",
                        idx % self.width,
                        idx / self.width
                    ),
                ));
            }
        }
        Ok(())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// Whether a signed coordinate lies in `[0, width) x [0, height)`.
    #[inline]
    pub fn contains(&self, x: isize, y: isize) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    pub fn cell(&self, x: usize, y: usize) -> &ChargeCell {
        &self.cells[self.index(x, y)]
    }

    pub fn cell_mut(&mut self, x: usize, y: usize) -> &mut ChargeCell {
        let idx = self.index(x, y);
        &mut self.cells[idx]
    }

    pub fn cells(&self) -> &[ChargeCell] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [ChargeCell] {
        &mut self.cells
    }

    /// Row `y` as a slice of cells.
    pub fn row(&self, y: usize) -> &[ChargeCell] {
        let start = y * self.width;
        &self.cells[start..start + self.width]
    }

    /// Net charge at `(x, y)`.
    #[inline]
    pub fn charge_at(&self, x: usize, y: usize) -> i64 {
        self.cell(x, y).total_charge()
    }

    /// Empty every cell, keeping dimensions and allocations.
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
    }

    pub fn population_field(&self) -> Grid {
        self.map_field(|cell| cell.population() as i64)
    }

    pub fn charge_field(&self) -> Grid {
        self.map_field(ChargeCell::total_charge)
    }

    fn map_field(&self, f: impl Fn(&ChargeCell) -> i64) -> Grid {
        self.cells
            .chunks(self.width.max(1))
            .map(|row| row.iter().map(&f).collect())
            .collect()
    }

    pub fn total_population(&self) -> usize {
        self.cells.iter().map(ChargeCell::population).sum()
    }

    pub fn total_charge(&self) -> i64 {
        self.cells.iter().map(ChargeCell::total_charge).sum()
    }

    /// Grayscale raster of the population or charge field. `mode` must be
    /// `"population"` or `"charge"`.
    pub fn render(&self, options: &RenderOptions, mode: &str) -> LatticeResult<GrayImage> {
        let mode: RenderMode = mode.parse()?;
        renderer::render(self, options, mode)
    }
}

/// `(width, height)` of a rectangular grid of non-negative counts.
pub fn grid_shape(grid: &[Vec<i64>]) -> LatticeResult<(usize, usize)> {
    let height = grid.len();
    let width = grid.first().map(Vec::len).unwrap_or(0);
    if width == 0 || height == 0 {
        return Err(LatticeError::InvalidDimensions(format!(
            "occupancy grid must be non-empty, got {width}x{height}"
        )));
    }
    for (y, row) in grid.iter().enumerate() {
        if row.len() != width {
            return Err(LatticeError::InvalidDimensions(format!(
                "row {y} has {} entries, expected {width}",
                row.len()
            )));
        }
        if let Some(x) = row.iter().position(|&n| n < 0) {
            return Err(LatticeError::InvalidDimensions(format!(
                "negative occupancy {} at ({x}, {y})",
                row[x]
            )));
        }
    }
    Ok((width, height))
}

/// `width x height` grid filled with `value`.
pub fn filled_grid(width: usize, height: usize, value: i64) -> Grid {
    vec![vec![value; width]; height]
}

#[cfg(test)]
mod tests;
