// simulation.rs
// The Simulation owns the lattice and advances it one synchronous step at a
// time using two buffers that swap roles every step.

use crate::config::{validate_temperature, SimConfig};
use crate::error::LatticeResult;
use crate::lattice::Lattice;
use crate::profile_scope;
use crate::units;

use super::diffusion::{self, StepRules};
use super::streams;

#[derive(Clone, Debug)]
pub struct Simulation {
    pub config: SimConfig,
    frame: u64,
    current: Lattice,
    /// Next-state buffer; empty between steps
    scratch: Lattice,
}

impl Simulation {
    pub fn new(lattice: Lattice, config: SimConfig) -> LatticeResult<Self> {
        Self::resume(lattice, config, 0)
    }

    /// Continue a run that has already completed `frame` steps. Stepping
    /// on from here reproduces the uninterrupted run exactly.
    pub fn resume(lattice: Lattice, config: SimConfig, frame: u64) -> LatticeResult<Self> {
        lattice.validate()?;
        config.validate()?;
        let scratch = Lattice::empty(lattice.width(), lattice.height());
        Ok(Self {
            config,
            frame,
            current: lattice,
            scratch,
        })
    }

    /// Build the initial lattice from an occupancy grid, drawing charge signs
    /// from the config seed.
    pub fn from_occupancy(grid: &[Vec<i64>], config: SimConfig) -> LatticeResult<Self> {
        let mut rng = streams::init_stream(config.seed);
        let lattice = Lattice::from_occupancy(grid, &mut rng)?;
        Self::new(lattice, config)
    }

    pub fn step(&mut self) {
        profile_scope!("step");
        let rules = StepRules::from_config(&self.config);
        let step_seed = streams::step_seed(self.config.seed, self.frame);
        if self.config.parallel {
            diffusion::step_parallel(&self.current, &mut self.scratch, &rules, step_seed);
        } else {
            diffusion::step_serial(&self.current, &mut self.scratch, &rules, step_seed);
        }
        std::mem::swap(&mut self.current, &mut self.scratch);
        self.scratch.clear();
        self.frame += 1;
    }

    pub fn run(&mut self, steps: u64) {
        for _ in 0..steps {
            self.step();
        }
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn lattice(&self) -> &Lattice {
        &self.current
    }

    pub fn into_lattice(self) -> Lattice {
        self.current
    }

    pub fn temperature(&self) -> f64 {
        self.config.temperature
    }

    pub fn set_temperature(&mut self, temperature: f64) -> LatticeResult<()> {
        validate_temperature(temperature)?;
        self.config.temperature = temperature;
        Ok(())
    }

    /// Duration of one step in seconds at the current temperature, treating
    /// the temperature as kelvin.
    pub fn time_step(&self) -> f64 {
        units::time_step(
            self.config.temperature,
            self.config.molecular_mass,
            self.config.degrees_of_freedom,
        )
    }

    /// Elapsed physical time in seconds, assuming a constant temperature.
    pub fn physical_time(&self) -> f64 {
        self.frame as f64 * self.time_step()
    }
}
