/// Parameter sweeps over temperature and seed
///
/// This module provides functionality to:
/// - Define a study as a list of cases on top of one base run configuration
/// - Run every case headlessly, sampling lattice statistics along the way
/// - Export one CSV per case plus a summary table
pub mod config;
pub mod export;
pub mod runner;

pub use config::{SweepCase, SweepConfig};
pub use export::{export_case_csv, export_summary};
pub use runner::{CaseResult, SweepRunner, SweepSample};
