// diagnostics.rs
// Aggregate statistics of a lattice, a conservation check between steps, and
// a CSV time series writer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{LatticeError, LatticeResult};
use crate::lattice::Lattice;

/// Snapshot statistics for a single frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LatticeStats {
    pub total_population: usize,
    pub total_charge: i64,
    pub occupied_cells: usize,
    pub max_population: usize,
    pub max_abs_charge: i64,
    /// Variance of the per-site net charge
    pub charge_variance: f64,
    /// Mean product of net charges over orthogonally adjacent site pairs.
    /// Negative when opposite charges sit side by side, positive when like
    /// charges cluster.
    pub neighbour_correlation: f64,
}

impl LatticeStats {
    pub fn compute(lattice: &Lattice) -> Self {
        let (width, height) = lattice.dimensions();
        let sites = (width * height).max(1) as f64;

        let mut stats = LatticeStats::default();
        let mut sum_sq = 0.0f64;
        for cell in lattice.cells() {
            let population = cell.population();
            let charge = cell.total_charge();
            stats.total_population += population;
            stats.total_charge += charge;
            if population > 0 {
                stats.occupied_cells += 1;
            }
            stats.max_population = stats.max_population.max(population);
            stats.max_abs_charge = stats.max_abs_charge.max(charge.abs());
            sum_sq += (charge * charge) as f64;
        }
        let mean = stats.total_charge as f64 / sites;
        stats.charge_variance = sum_sq / sites - mean * mean;

        let mut pair_sum = 0.0f64;
        let mut pairs = 0usize;
        for y in 0..height {
            for x in 0..width {
                let q = lattice.charge_at(x, y);
                if x + 1 < width {
                    pair_sum += (q * lattice.charge_at(x + 1, y)) as f64;
                    pairs += 1;
                }
                if y + 1 < height {
                    pair_sum += (q * lattice.charge_at(x, y + 1)) as f64;
                    pairs += 1;
                }
            }
        }
        if pairs > 0 {
            stats.neighbour_correlation = pair_sum / pairs as f64;
        }
        stats
    }
}

/// Remembers the initial totals and fails when a later lattice differs.
#[derive(Clone, Copy, Debug)]
pub struct ConservationMonitor {
    population: usize,
    charge: i64,
}

impl ConservationMonitor {
    pub fn new(lattice: &Lattice) -> Self {
        Self {
            population: lattice.total_population(),
            charge: lattice.total_charge(),
        }
    }

    pub fn check(&self, lattice: &Lattice, frame: u64) -> LatticeResult<()> {
        let population = lattice.total_population();
        let charge = lattice.total_charge();
        if population != self.population || charge != self.charge {
            return Err(LatticeError::ConservationViolated {
                frame,
                expected: self.population,
                found: population,
                expected_charge: self.charge,
                found_charge: charge,
            });
        }
        Ok(())
    }
}

const STATS_HEADER: &str = "frame,physical_time_s,total_population,total_charge,occupied_cells,\
max_population,max_abs_charge,charge_variance,neighbour_correlation";

/// Appends one row of `LatticeStats` per recorded frame.
pub struct StatsCsv<W: Write> {
    writer: W,
}

impl StatsCsv<BufWriter<File>> {
    pub fn create<P: AsRef<Path>>(path: P) -> LatticeResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::new(BufWriter::new(File::create(path)?))
    }
}

impl<W: Write> StatsCsv<W> {
    pub fn new(mut writer: W) -> LatticeResult<Self> {
        writeln!(writer, "{STATS_HEADER}")?;
        Ok(Self { writer })
    }

    pub fn record(&mut self, frame: u64, physical_time: f64, stats: &LatticeStats) -> LatticeResult<()> {
        writeln!(
            self.writer,
            "{},{:e},{},{},{},{},{},{:.6},{:.6}",
            frame,
            physical_time,
            stats.total_population,
            stats.total_charge,
            stats.occupied_cells,
            stats.max_population,
            stats.max_abs_charge,
            stats.charge_variance,
            stats.neighbour_correlation,
        )?;
        Ok(())
    }

    pub fn finish(mut self) -> LatticeResult<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::ChargeCell;

    fn checkerboard() -> Lattice {
        // +1 -1
        // -1 +1
        Lattice::from_cells(
            2,
            2,
            vec![
                ChargeCell::with_counts(1, 0),
                ChargeCell::with_counts(0, 1),
                ChargeCell::with_counts(0, 1),
                ChargeCell::with_counts(1, 0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn checkerboard_is_anticorrelated() {
        let stats = LatticeStats::compute(&checkerboard());
        assert_eq!(stats.total_population, 4);
        assert_eq!(stats.total_charge, 0);
        assert_eq!(stats.occupied_cells, 4);
        assert_eq!(stats.max_abs_charge, 1);
        assert!((stats.charge_variance - 1.0).abs() < 1e-12);
        assert!((stats.neighbour_correlation + 1.0).abs() < 1e-12);
    }

    #[test]
    fn empty_lattice_has_zero_stats() {
        let stats = LatticeStats::compute(&Lattice::empty(3, 3));
        assert_eq!(stats, LatticeStats::default());
    }

    #[test]
    fn monitor_flags_lost_charge() {
        let mut lattice = checkerboard();
        let monitor = ConservationMonitor::new(&lattice);
        assert!(monitor.check(&lattice, 0).is_ok());
        lattice.cell_mut(0, 0).clear();
        let err = monitor.check(&lattice, 7).unwrap_err();
        assert!(matches!(
            err,
            LatticeError::ConservationViolated { frame: 7, expected: 4, found: 3, .. }
        ));
    }

    #[test]
    fn csv_rows_follow_header() {
        let mut csv = StatsCsv::new(Vec::new()).unwrap();
        csv.record(3, 0.0, &LatticeStats::compute(&checkerboard())).unwrap();
        let text = String::from_utf8(csv.finish().unwrap()).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(STATS_HEADER));
        let row = lines.next().unwrap();
        assert!(row.starts_with("3,0e0,4,0,4,1,1,"));
        assert_eq!(row.split(',').count(), STATS_HEADER.split(',').count());
    }
}
