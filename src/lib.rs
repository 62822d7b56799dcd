pub mod cell;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod init_config;
pub mod io;
pub mod lattice;
pub mod profiler;
pub mod renderer;
pub mod simulation;
pub mod units;

#[cfg(feature = "sweep")]
pub mod sweep;

pub mod app;

pub use cell::ChargeCell;
pub use error::{LatticeError, LatticeResult};
pub use lattice::Lattice;
pub use simulation::Simulation;

#[cfg(feature = "profiling")]
use once_cell::sync::Lazy;
#[cfg(feature = "profiling")]
use parking_lot::Mutex;

#[cfg(feature = "profiling")]
pub static PROFILER: Lazy<Mutex<profiler::Profiler>> =
    Lazy::new(|| Mutex::new(profiler::Profiler::new()));
