// app/mod.rs
// Headless driver: builds a simulation from a run configuration (or a saved
// snapshot), steps it, and streams frames, statistics and the final state to
// the output directory.

use std::path::PathBuf;
use std::time::Instant;

use crate::diagnostics::{ConservationMonitor, LatticeStats, StatsCsv};
use crate::error::LatticeResult;
use crate::init_config::RunConfig;
use crate::io::{self, Snapshot};
use crate::renderer::{self, RenderMode, RenderOptions};
use crate::simulation::Simulation;

pub mod frame_writer;

use frame_writer::{FrameMessage, FrameWriter};

/// Command-line values that take precedence over the run configuration.
#[derive(Clone, Debug, Default)]
pub struct RunOverrides {
    pub steps: Option<u64>,
    pub temperature: Option<f64>,
    pub seed: Option<u64>,
    pub parallel: Option<bool>,
    pub output: Option<PathBuf>,
    pub mode: Option<String>,
    /// Continue from a snapshot instead of building the initial lattice
    pub resume: Option<PathBuf>,
}

impl RunOverrides {
    pub fn apply(&self, config: &mut RunConfig) -> LatticeResult<()> {
        if let Some(steps) = self.steps {
            config.simulation.steps = Some(steps);
        }
        if let Some(temperature) = self.temperature {
            config.simulation.params.temperature = temperature;
        }
        if let Some(seed) = self.seed {
            config.simulation.params.seed = seed;
        }
        if let Some(parallel) = self.parallel {
            config.simulation.params.parallel = parallel;
        }
        if let Some(output) = &self.output {
            config.output.directory = output.clone();
        }
        if let Some(mode) = &self.mode {
            config.output.mode = mode.clone();
        }
        config.validate()
    }
}

#[derive(Debug)]
pub struct RunSummary {
    pub frames: u64,
    pub final_stats: LatticeStats,
    pub frames_written: usize,
    pub gif: Option<PathBuf>,
    pub snapshot: Option<PathBuf>,
}

/// Creates a global thread pool (using rayon) with threads = max(3, total cores) - 2
pub fn init_thread_pool() {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(crate::config::MIN_THREADS);
    let threads = cores.max(crate::config::MIN_THREADS) - crate::config::THREADS_LEAVE_FREE;
    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
    {
        log::warn!("rayon pool already initialised: {e}");
    }
}

pub fn run(mut config: RunConfig, overrides: &RunOverrides) -> LatticeResult<RunSummary> {
    overrides.apply(&mut config)?;

    let mut simulation = match &overrides.resume {
        Some(path) => {
            let snapshot = io::load_snapshot(path)?;
            log::info!("resuming {} at frame {}", path.display(), snapshot.frame);
            let mut params = snapshot.config.clone();
            // Only an explicit temperature or execution mode replaces the saved one
            if let Some(temperature) = overrides.temperature {
                params.temperature = temperature;
            }
            if let Some(parallel) = overrides.parallel {
                params.parallel = parallel;
            }
            Simulation::resume(snapshot.lattice, params, snapshot.frame)?
        }
        None => config.build_simulation()?,
    };
    if simulation.config.parallel {
        init_thread_pool();
    }

    let steps = config.simulation.steps();
    let output = &config.output;
    let mode: RenderMode = output.render_mode()?;
    let render_options: RenderOptions = output.render_options();
    let (width, height) = simulation.lattice().dimensions();
    log::info!(
        "{}x{} lattice, {} charges, T = {}, {:?} walk, {:?} acceptance, {} steps",
        width,
        height,
        simulation.lattice().total_population(),
        simulation.temperature(),
        simulation.config.walk,
        simulation.config.acceptance,
        steps
    );

    let writer = (output.frame_interval > 0).then(|| {
        let gif = output
            .gif
            .then(|| (output.directory.join("diffusion.gif"), output.gif_delay_ms));
        FrameWriter::spawn(output.directory.join("frames"), gif)
    });
    let mut stats_csv = if output.stats_csv {
        Some(StatsCsv::create(output.directory.join("stats.csv"))?)
    } else {
        None
    };

    let monitor = ConservationMonitor::new(simulation.lattice());
    let start_frame = simulation.frame();
    let started = Instant::now();

    let mut emit = |sim: &Simulation| -> LatticeResult<()> {
        let frame = sim.frame();
        if let Some(csv) = stats_csv.as_mut() {
            let stats = LatticeStats::compute(sim.lattice());
            log::debug!(
                "frame {frame}: occupied {} max pop {} correlation {:.4}",
                stats.occupied_cells,
                stats.max_population,
                stats.neighbour_correlation
            );
            csv.record(frame, sim.physical_time(), &stats)?;
        }
        if let Some(writer) = &writer {
            if (frame - start_frame) % output.frame_interval == 0 {
                let image = renderer::render(sim.lattice(), &render_options, mode)?;
                writer.send(FrameMessage::Gray { frame, image })?;
                if output.colour_charge {
                    let image = renderer::render_charge_rgb(sim.lattice(), render_options.upscale)?;
                    writer.send(FrameMessage::Colour { frame, image })?;
                }
            }
        }
        Ok(())
    };

    let mut result = emit(&simulation);
    for _ in 0..steps {
        if result.is_err() {
            break;
        }
        simulation.step();
        result = monitor
            .check(simulation.lattice(), simulation.frame())
            .and_then(|_| emit(&simulation));
        if simulation.frame() % 100 == 0 {
            log::info!("frame {} ({:.1?} elapsed)", simulation.frame(), started.elapsed());
        }
    }
    drop(emit);

    // A failed send usually means the writer hit an I/O error; report that one.
    let written = match writer {
        Some(writer) => match (writer.finish(), result) {
            (Err(e), _) => return Err(e),
            (Ok(_), Err(e)) => return Err(e),
            (Ok(written), Ok(())) => written,
        },
        None => {
            result?;
            Default::default()
        }
    };
    if let Some(csv) = stats_csv {
        csv.finish()?;
    }

    let snapshot = match &output.snapshot {
        Some(snapshot_config) => {
            let path = output.directory.join(&snapshot_config.file);
            io::save_snapshot(
                &path,
                &Snapshot::from_simulation(&simulation),
                snapshot_config.format,
                snapshot_config.compress,
            )?;
            Some(path)
        }
        None => None,
    };

    #[cfg(feature = "profiling")]
    crate::PROFILER.lock().log_and_clear();

    let final_stats = LatticeStats::compute(simulation.lattice());
    log::info!(
        "finished {} steps in {:.2?}: {} charges on {} occupied sites",
        simulation.frame() - start_frame,
        started.elapsed(),
        final_stats.total_population,
        final_stats.occupied_cells
    );
    Ok(RunSummary {
        frames: simulation.frame(),
        final_stats,
        frames_written: written.count,
        gif: written.gif,
        snapshot,
    })
}

#[cfg(test)]
mod tests;
