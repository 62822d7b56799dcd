use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use lattice_diffusion::app::{self, RunOverrides};
use lattice_diffusion::init_config::RunConfig;
use lattice_diffusion::LatticeResult;

/// Lattice charge diffusion - thermal random walk of point charges
#[derive(Parser, Debug)]
#[command(name = "lattice_diffusion", version, about)]
struct Cli {
    /// Run configuration (TOML). Built-in defaults are used when omitted.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Number of diffusion steps
    #[arg(long)]
    steps: Option<u64>,

    /// Temperature in lattice units
    #[arg(long)]
    temperature: Option<f64>,

    /// Master seed for the random streams
    #[arg(long)]
    seed: Option<u64>,

    /// Step rows on the rayon thread pool
    #[arg(long)]
    parallel: bool,

    /// Output directory
    #[arg(long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Render mode (population or charge)
    #[arg(long)]
    mode: Option<String>,

    /// Continue from a saved snapshot
    #[arg(long, value_name = "FILE")]
    resume: Option<PathBuf>,

    /// Write the default configuration to FILE and exit
    #[arg(long, value_name = "FILE")]
    write_default_config: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> LatticeResult<()> {
    if let Some(path) = cli.write_default_config {
        std::fs::write(&path, RunConfig::default().to_toml_string()?)?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => RunConfig::load_from_file(path)?,
        None => RunConfig::default(),
    };
    let overrides = RunOverrides {
        steps: cli.steps,
        temperature: cli.temperature,
        seed: cli.seed,
        parallel: cli.parallel.then_some(true),
        output: cli.output,
        mode: cli.mode,
        resume: cli.resume,
    };

    let summary = app::run(config, &overrides)?;
    println!(
        "Finished at frame {}: {} charges (net {}), {} occupied sites, {} frames written",
        summary.frames,
        summary.final_stats.total_population,
        summary.final_stats.total_charge,
        summary.final_stats.occupied_cells,
        summary.frames_written
    );
    if let Some(gif) = summary.gif {
        println!("Animation: {}", gif.display());
    }
    if let Some(snapshot) = summary.snapshot {
        println!("Snapshot: {}", snapshot.display());
    }
    Ok(())
}
