// simulation/mod.rs
// Re-exports and module declarations for simulation submodules

pub mod diffusion;
pub mod simulation;
pub mod streams;
pub use simulation::*;
