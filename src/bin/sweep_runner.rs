/// CLI tool for running temperature/seed sweeps
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use lattice_diffusion::sweep::{SweepConfig, SweepRunner};
use lattice_diffusion::LatticeResult;

#[derive(Parser, Debug)]
#[command(name = "sweep_runner", version, about = "Lattice diffusion parameter sweeps")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a full factorial sweep configuration
    Generate {
        output: PathBuf,
        /// Temperatures to sweep
        #[arg(long, value_delimiter = ',', default_values_t = [0.25, 0.5, 1.0, 2.0, 4.0])]
        temperatures: Vec<f64>,
        /// Seeds to repeat each temperature with
        #[arg(long, value_delimiter = ',', default_values_t = [0u64, 1, 2])]
        seeds: Vec<u64>,
        #[arg(long, default_value_t = 200)]
        steps: u64,
        #[arg(long, default_value_t = 10)]
        sample_interval: u64,
        /// Run configuration the cases start from
        #[arg(long)]
        base_config: Option<PathBuf>,
    },
    /// List all cases in a sweep configuration
    List { config: PathBuf },
    /// Run a specific case
    Run {
        config: PathBuf,
        case_id: String,
        #[arg(long, default_value = "sweep_results")]
        output: PathBuf,
    },
    /// Run all cases sequentially
    RunAll {
        config: PathBuf,
        #[arg(long, default_value = "sweep_results")]
        output: PathBuf,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    match run(Cli::parse().command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn load_runner(config_path: &Path, output: PathBuf) -> LatticeResult<SweepRunner> {
    let config = SweepConfig::from_file(config_path)?;
    let base = config.load_base(config_path.parent().unwrap_or(Path::new(".")))?;
    Ok(SweepRunner::new(config, base, output))
}

fn run(command: Command) -> LatticeResult<()> {
    match command {
        Command::Generate {
            output,
            temperatures,
            seeds,
            steps,
            sample_interval,
            base_config,
        } => {
            let config = SweepConfig::generate_temperature_sweep(
                "Temperature sweep".to_string(),
                base_config,
                &temperatures,
                &seeds,
                steps,
                sample_interval,
            );
            config.validate()?;
            config.to_file(&output)?;
            println!(
                "Sweep configuration generated: {} ({} cases)",
                output.display(),
                config.cases.len()
            );
        }
        Command::List { config } => {
            load_runner(&config, PathBuf::new())?.list_cases();
        }
        Command::Run {
            config,
            case_id,
            output,
        } => {
            let result = load_runner(&config, output)?.run_case(&case_id)?;
            if let Some(last) = result.final_sample() {
                println!(
                    "{}: frame {}, {} occupied sites, neighbour correlation {:.4}",
                    case_id,
                    last.frame,
                    last.stats.occupied_cells,
                    last.stats.neighbour_correlation
                );
            }
        }
        Command::RunAll { config, output } => {
            let results = load_runner(&config, output.clone())?.run_all()?;
            println!(
                "Completed {} cases, results saved to {}",
                results.len(),
                output.display()
            );
        }
    }
    Ok(())
}
