// Centralized configuration for simulation parameters

use serde::{Deserialize, Serialize};

use crate::error::{LatticeError, LatticeResult};
use crate::units;

// ====================
// Simulation Parameters
// ====================
/// Boltzmann scale used when no temperature is configured (lattice units).
pub const DEFAULT_TEMPERATURE: f64 = 1.0;
/// Number of diffusion steps for a run without a config file.
pub const DEFAULT_STEPS: u64 = 10;
/// Master seed for a run without a config file.
pub const DEFAULT_SEED: u64 = 0;
/// Interaction energy of two unit charges, in the same units as the temperature.
pub const DEFAULT_COUPLING: f64 = 1.0;
/// Molecular mass (amu) used for the physical time step; NaCl.
pub const DEFAULT_MOLECULAR_MASS: f64 = 58.44;
/// Translational degrees of freedom of a particle confined to the lattice plane.
pub const DEFAULT_DEGREES_OF_FREEDOM: f64 = 2.0;

// ====================
// Default Lattice
// ====================
pub const DEFAULT_WIDTH: usize = 64;
pub const DEFAULT_HEIGHT: usize = 64;
/// Edge of the centred square seeded in the default lattice
pub const DEFAULT_BLOCK_SIZE: usize = 16;
/// Charges per site inside the default block
pub const DEFAULT_BLOCK_OCCUPANCY: i64 = 5;

// ====================
// Output
// ====================
/// Intensity multiplier applied before clamping to 8 bits
pub const DEFAULT_RENDER_INTENSITY: f64 = 5.0;
pub const DEFAULT_RENDER_UPSCALE: u32 = 1;
/// One frame per second
pub const DEFAULT_GIF_DELAY_MS: u32 = 1000;
/// Frames buffered between the simulation and the frame writer thread
pub const FRAME_QUEUE_DEPTH: usize = 16;

// ====================
// Threading/Parallelism
// ====================
pub const MIN_THREADS: usize = 3; // Minimum number of threads to use
pub const THREADS_LEAVE_FREE: usize = 2; // Number of logical cores to leave free

/// Proposal rule for a single charge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalkRule {
    /// `dx` and `dy` drawn independently from {-1, +1}; one candidate, accepted
    /// or rejected by the acceptance rule.
    #[default]
    Diagonal,
    /// Weighted choice among the four orthogonal neighbours. Always moves
    /// unless every neighbour lies outside the lattice.
    HeatBath,
}

/// Acceptance test applied to a `Diagonal` proposal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcceptanceRule {
    /// Accept when `bf > 1` or a uniform draw exceeds `bf`.
    #[default]
    Threshold,
    /// Accept when `bf >= 1` or a uniform draw falls below `bf`.
    Metropolis,
}

impl AcceptanceRule {
    /// `draw` is only consulted when the factor alone does not decide.
    pub fn accepts(self, boltzmann_factor: f64, draw: impl FnOnce() -> f64) -> bool {
        match self {
            AcceptanceRule::Threshold => boltzmann_factor > 1.0 || draw() > boltzmann_factor,
            AcceptanceRule::Metropolis => boltzmann_factor >= 1.0 || draw() < boltzmann_factor,
        }
    }
}

/// Scale of the pairwise interaction energy `coupling * q * q_dest`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Coupling {
    /// Energy in the same units as the temperature.
    Fixed { value: f64 },
    /// Coulomb energy between unit charges one fluid element apart, in kelvin.
    Physical { relative_permittivity: f64 },
}

impl Default for Coupling {
    fn default() -> Self {
        Coupling::Fixed {
            value: DEFAULT_COUPLING,
        }
    }
}

impl Coupling {
    pub fn value(&self) -> f64 {
        match *self {
            Coupling::Fixed { value } => value,
            Coupling::Physical {
                relative_permittivity,
            } => units::physical_coupling(relative_permittivity),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Boltzmann scale `T` in `exp(-energy / T)`
    pub temperature: f64,
    pub seed: u64,
    pub walk: WalkRule,
    pub acceptance: AcceptanceRule,
    pub coupling: Coupling,
    /// Shard rows across the rayon pool
    pub parallel: bool,
    /// Molecular mass (amu) for `physical_time`
    pub molecular_mass: f64,
    pub degrees_of_freedom: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            seed: DEFAULT_SEED,
            walk: WalkRule::default(),
            acceptance: AcceptanceRule::default(),
            coupling: Coupling::default(),
            parallel: false,
            molecular_mass: DEFAULT_MOLECULAR_MASS,
            degrees_of_freedom: DEFAULT_DEGREES_OF_FREEDOM,
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> LatticeResult<()> {
        validate_temperature(self.temperature)?;
        if !self.coupling.value().is_finite() {
            return Err(LatticeError::invalid_parameter(
                "coupling",
                format!("{:?} does not give a finite coupling", self.coupling),
            ));
        }
        if let Coupling::Physical {
            relative_permittivity,
        } = self.coupling
        {
            if relative_permittivity <= 0.0 {
                return Err(LatticeError::invalid_parameter(
                    "relative_permittivity",
                    format!("must be positive, got {relative_permittivity}"),
                ));
            }
        }
        if !(self.molecular_mass > 0.0) || !(self.degrees_of_freedom > 0.0) {
            return Err(LatticeError::invalid_parameter(
                "molecular_mass",
                "molecular mass and degrees of freedom must be positive",
            ));
        }
        Ok(())
    }
}

pub fn validate_temperature(temperature: f64) -> LatticeResult<()> {
    if temperature.is_finite() && temperature > 0.0 {
        Ok(())
    } else {
        Err(LatticeError::invalid_parameter(
            "temperature",
            format!("must be a positive finite number, got {temperature}"),
        ))
    }
}
