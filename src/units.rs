//! Physical constants of the fluid lattice and conversions to lattice units.
//!
//! All constants are SI. A lattice site is one fluid element of edge
//! `FLUID_ELEMENT_SIZE`; charges are in units of the elementary charge.

/// Edge length of one fluid element (lattice site) in meters.
pub const FLUID_ELEMENT_SIZE: f64 = 1.0e-6;

/// `e^2 / (4 pi epsilon_0 k_B)` in kelvin-meters.
pub const TEMPERATURE_PREFACTOR: f64 = 0.0000167;

/// `sqrt(m_u / k_B)` in sqrt(kg K / J).
pub const MASS_FACTOR: f64 = 0.01097;

/// Coulomb energy of two unit charges one fluid element apart, expressed as
/// a temperature (kelvin).
pub const CHARACTERISTIC_TEMPERATURE: f64 = TEMPERATURE_PREFACTOR / FLUID_ELEMENT_SIZE;

/// Room temperature in kelvin.
pub const ROOM_TEMPERATURE: f64 = 298.0;

/// Brightest value of an 8-bit grayscale charge map.
pub const IMAGE_MAXIMUM_INTENSITY: u8 = 255;

/// Coupling between neighbouring unit charges in a medium of the given
/// relative permittivity, in kelvin.
pub fn physical_coupling(relative_permittivity: f64) -> f64 {
    CHARACTERISTIC_TEMPERATURE / relative_permittivity
}

/// Physical duration of one lattice step: the time a particle of
/// `molecular_mass` (in atomic mass units) needs to cross one fluid element
/// at its thermal speed.
pub fn time_step(temperature: f64, molecular_mass: f64, degrees_of_freedom: f64) -> f64 {
    (MASS_FACTOR * FLUID_ELEMENT_SIZE * molecular_mass) / (degrees_of_freedom * temperature).sqrt()
}
