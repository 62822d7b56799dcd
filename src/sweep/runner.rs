/// Sweep runner for executing cases headlessly
use std::path::PathBuf;
use std::time::Instant;

use super::config::{SweepCase, SweepConfig};
use super::export::{export_case_csv, export_summary};
use crate::diagnostics::{ConservationMonitor, LatticeStats};
use crate::error::LatticeResult;
use crate::init_config::RunConfig;

#[derive(Clone, Debug, PartialEq)]
pub struct SweepSample {
    pub frame: u64,
    pub physical_time: f64,
    pub stats: LatticeStats,
}

#[derive(Clone, Debug)]
pub struct CaseResult {
    pub case: SweepCase,
    pub samples: Vec<SweepSample>,
}

impl CaseResult {
    pub fn final_sample(&self) -> Option<&SweepSample> {
        self.samples.last()
    }
}

pub struct SweepRunner {
    config: SweepConfig,
    base: RunConfig,
    output_dir: PathBuf,
}

impl SweepRunner {
    pub fn new(config: SweepConfig, base: RunConfig, output_dir: PathBuf) -> Self {
        Self {
            config,
            base,
            output_dir,
        }
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Run a specific case by ID
    pub fn run_case(&self, case_id: &str) -> LatticeResult<CaseResult> {
        let case = self.config.case(case_id)?;
        let result = self.execute_case(case)?;
        export_case_csv(&result, &self.output_dir)?;
        Ok(result)
    }

    /// Run all cases sequentially, then write the summary
    pub fn run_all(&self) -> LatticeResult<Vec<CaseResult>> {
        let mut results = Vec::with_capacity(self.config.cases.len());
        for case in &self.config.cases {
            let result = self.execute_case(case)?;
            export_case_csv(&result, &self.output_dir)?;
            results.push(result);
        }
        let summary = export_summary(&results, &self.output_dir)?;
        log::info!(
            "sweep '{}' finished: {} cases, summary at {}",
            self.config.study_name,
            results.len(),
            summary.display()
        );
        Ok(results)
    }

    fn execute_case(&self, case: &SweepCase) -> LatticeResult<CaseResult> {
        let run_config = case.apply(&self.base);
        run_config.validate()?;
        let mut sim = run_config.build_simulation()?;
        let monitor = ConservationMonitor::new(sim.lattice());
        log::info!(
            "case {}: T = {}, seed {}, {:?}/{:?}, {} steps",
            case.case_id,
            case.temperature,
            case.seed,
            sim.config.walk,
            sim.config.acceptance,
            self.config.steps
        );

        let sample = |sim: &crate::simulation::Simulation| SweepSample {
            frame: sim.frame(),
            physical_time: sim.physical_time(),
            stats: LatticeStats::compute(sim.lattice()),
        };

        let started = Instant::now();
        let mut samples = vec![sample(&sim)];
        for step in 1..=self.config.steps {
            sim.step();
            monitor.check(sim.lattice(), sim.frame())?;
            if step % self.config.sample_interval == 0 || step == self.config.steps {
                samples.push(sample(&sim));
            }
        }
        log::info!(
            "case {} completed in {:.2}s",
            case.case_id,
            started.elapsed().as_secs_f32()
        );

        Ok(CaseResult {
            case: case.clone(),
            samples,
        })
    }

    /// Print all cases in the study
    pub fn list_cases(&self) {
        println!(
            "Study '{}': {} cases",
            self.config.study_name,
            self.config.cases.len()
        );
        for (idx, case) in self.config.cases.iter().enumerate() {
            println!("  [{}] {}", idx + 1, case.case_id);
            println!("      Temperature: {}  Seed: {}", case.temperature, case.seed);
            if let Some(walk) = case.walk {
                println!("      Walk: {walk:?}");
            }
            if let Some(acceptance) = case.acceptance {
                println!("      Acceptance: {acceptance:?}");
            }
        }
    }
}
