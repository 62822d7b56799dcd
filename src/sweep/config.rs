/// Sweep configuration structures
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::{AcceptanceRule, WalkRule};
use crate::error::{LatticeError, LatticeResult};
use crate::init_config::RunConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Name of the study
    pub study_name: String,

    /// Run configuration every case starts from. Built-in defaults when omitted.
    #[serde(default)]
    pub base_config: Option<PathBuf>,

    /// Diffusion steps per case
    pub steps: u64,

    /// Record statistics every N steps (frame 0 and the last frame are always recorded)
    pub sample_interval: u64,

    /// List of cases to execute
    pub cases: Vec<SweepCase>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepCase {
    /// Unique case ID
    pub case_id: String,
    pub temperature: f64,
    pub seed: u64,
    /// Overrides the base configuration's walk rule
    #[serde(default)]
    pub walk: Option<WalkRule>,
    #[serde(default)]
    pub acceptance: Option<AcceptanceRule>,
}

impl SweepConfig {
    /// Full factorial study over temperatures and seeds
    pub fn generate_temperature_sweep(
        study_name: String,
        base_config: Option<PathBuf>,
        temperatures: &[f64],
        seeds: &[u64],
        steps: u64,
        sample_interval: u64,
    ) -> Self {
        let mut cases = Vec::with_capacity(temperatures.len() * seeds.len());
        for &temperature in temperatures {
            for &seed in seeds {
                cases.push(SweepCase {
                    case_id: format!("T{temperature:.2}_S{seed}"),
                    temperature,
                    seed,
                    walk: None,
                    acceptance: None,
                });
            }
        }

        SweepConfig {
            study_name,
            base_config,
            steps,
            sample_interval,
            cases,
        }
    }

    /// Load sweep configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> LatticeResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: SweepConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save sweep configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> LatticeResult<()> {
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> LatticeResult<()> {
        if self.sample_interval == 0 {
            return Err(LatticeError::invalid_parameter(
                "sample_interval",
                "must be at least 1",
            ));
        }
        for (i, case) in self.cases.iter().enumerate() {
            crate::config::validate_temperature(case.temperature)?;
            if self.cases[..i].iter().any(|c| c.case_id == case.case_id) {
                return Err(LatticeError::invalid_parameter(
                    "case_id",
                    format!("duplicate case '{}'", case.case_id),
                ));
            }
        }
        Ok(())
    }

    pub fn case(&self, case_id: &str) -> LatticeResult<&SweepCase> {
        self.cases
            .iter()
            .find(|c| c.case_id == case_id)
            .ok_or_else(|| {
                LatticeError::invalid_parameter("case_id", format!("case '{case_id}' not found"))
            })
    }

    /// Reads the base run configuration, resolving it next to `sweep_dir`
    /// when relative.
    pub fn load_base(&self, sweep_dir: &Path) -> LatticeResult<RunConfig> {
        match &self.base_config {
            Some(path) if path.is_absolute() => RunConfig::load_from_file(path),
            Some(path) => RunConfig::load_from_file(sweep_dir.join(path)),
            None => Ok(RunConfig::default()),
        }
    }
}

impl SweepCase {
    /// Applies this case to a copy of the base configuration.
    pub fn apply(&self, base: &RunConfig) -> RunConfig {
        let mut config = base.clone();
        let params = &mut config.simulation.params;
        params.temperature = self.temperature;
        params.seed = self.seed;
        if let Some(walk) = self.walk {
            params.walk = walk;
        }
        if let Some(acceptance) = self.acceptance {
            params.acceptance = acceptance;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factorial_sweep_covers_every_pair() {
        let config = SweepConfig::generate_temperature_sweep(
            "study".into(),
            None,
            &[0.5, 1.0, 2.0],
            &[1, 2],
            10,
            5,
        );
        assert_eq!(config.cases.len(), 6);
        assert_eq!(config.cases[0].case_id, "T0.50_S1");
        assert_eq!(config.cases[5].case_id, "T2.00_S2");
        config.validate().unwrap();
    }

    #[test]
    fn toml_file_round_trip_keeps_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sweep.toml");
        let mut config =
            SweepConfig::generate_temperature_sweep("study".into(), None, &[1.0], &[7], 20, 4);
        config.cases[0].walk = Some(WalkRule::HeatBath);
        config.to_file(&path).unwrap();

        let loaded = SweepConfig::from_file(&path).unwrap();
        assert_eq!(loaded.steps, 20);
        assert_eq!(loaded.cases[0].walk, Some(WalkRule::HeatBath));
        assert_eq!(loaded.cases[0].acceptance, None);
    }

    #[test]
    fn rejects_bad_cases() {
        let mut config =
            SweepConfig::generate_temperature_sweep("study".into(), None, &[1.0], &[1, 1], 5, 1);
        assert!(matches!(
            config.validate(),
            Err(LatticeError::InvalidParameter { name: "case_id", .. })
        ));
        config.cases.truncate(1);
        config.cases[0].temperature = 0.0;
        assert!(config.validate().is_err());
        assert!(config.case("missing").is_err());
    }

    #[test]
    fn case_overrides_base_parameters() {
        let case = SweepCase {
            case_id: "c".into(),
            temperature: 3.0,
            seed: 42,
            walk: None,
            acceptance: Some(AcceptanceRule::Metropolis),
        };
        let config = case.apply(&RunConfig::default());
        assert_eq!(config.simulation.params.temperature, 3.0);
        assert_eq!(config.simulation.params.seed, 42);
        assert_eq!(config.simulation.params.walk, WalkRule::Diagonal);
        assert_eq!(config.simulation.params.acceptance, AcceptanceRule::Metropolis);
    }
}
