// error.rs
// Error type shared by the lattice, renderer, I/O and configuration layers

use thiserror::Error;

/// Result alias used across the crate.
pub type LatticeResult<T> = Result<T, LatticeError>;

#[derive(Debug, Error)]
pub enum LatticeError {
    /// Render mode other than `population` or `charge`.
    #[error("{0} is not a valid mode!")]
    InvalidMode(String),

    /// Occupancy grid is empty, ragged, mismatched or holds negative counts.
    #[error("invalid lattice dimensions: {0}")]
    InvalidDimensions(String),

    /// Out-of-range run parameter (temperature, upscale factor, ...).
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// A step created or destroyed charge.
    #[error(
        "charge conservation violated at frame {frame}: population {expected} -> {found}, \
         net charge {expected_charge} -> {found_charge}"
    )]
    ConservationViolated {
        frame: u64,
        expected: usize,
        found: usize,
        expected_charge: i64,
        found_charge: i64,
    },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("binary snapshot error: {0}")]
    Bincode(#[from] bincode::Error),

    /// The frame writer thread went away before the run finished.
    #[error("frame writer disconnected")]
    WriterDisconnected,
}

impl LatticeError {
    pub fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        LatticeError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
