/// Export sweep results to CSV for spreadsheet analysis
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::runner::CaseResult;
use crate::diagnostics::StatsCsv;
use crate::error::LatticeResult;

pub const SUMMARY_FILE: &str = "sweep_summary.csv";

/// Writes `<case_id>.csv` with one statistics row per sample.
pub fn export_case_csv(result: &CaseResult, output_dir: &Path) -> LatticeResult<PathBuf> {
    let path = output_dir.join(format!("{}.csv", result.case.case_id));
    let mut csv = StatsCsv::create(&path)?;
    for sample in &result.samples {
        csv.record(sample.frame, sample.physical_time, &sample.stats)?;
    }
    csv.finish()?;
    log::debug!("exported case {} to {}", result.case.case_id, path.display());
    Ok(path)
}

/// Summary statistics for all cases, one row each
pub fn export_summary(results: &[CaseResult], output_dir: &Path) -> LatticeResult<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join(SUMMARY_FILE);
    let mut file = BufWriter::new(File::create(&path)?);

    writeln!(
        file,
        "case_id,temperature,seed,walk,acceptance,final_frame,occupied_cells,\
         max_population,charge_variance,neighbour_correlation,mean_correlation"
    )?;

    for result in results {
        let Some(last) = result.final_sample() else {
            continue;
        };
        // Average over every sample after the initial state
        let tail = &result.samples[1.min(result.samples.len() - 1)..];
        let mean_correlation = tail
            .iter()
            .map(|s| s.stats.neighbour_correlation)
            .sum::<f64>()
            / tail.len() as f64;

        let walk = result
            .case
            .walk
            .map(|w| format!("{w:?}"))
            .unwrap_or_else(|| "base".to_string());
        let acceptance = result
            .case
            .acceptance
            .map(|a| format!("{a:?}"))
            .unwrap_or_else(|| "base".to_string());

        writeln!(
            file,
            "{},{},{},{},{},{},{},{},{:.6},{:.6},{:.6}",
            result.case.case_id,
            result.case.temperature,
            result.case.seed,
            walk,
            acceptance,
            last.frame,
            last.stats.occupied_cells,
            last.stats.max_population,
            last.stats.charge_variance,
            last.stats.neighbour_correlation,
            mean_correlation
        )?;
    }
    file.flush()?;
    Ok(path)
}
