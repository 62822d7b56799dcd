// app/tests.rs
// End-to-end runs of the headless driver into a temporary output directory

use std::path::Path;

use super::frame_writer::{FrameMessage, FrameWriter};
use super::*;
use crate::config::SimConfig;
use crate::error::LatticeError;
use crate::init_config::{LatticeConfig, SnapshotConfig, SourceConfig};
use crate::io::SnapshotFormat;
use crate::lattice::filled_grid;
use image::GrayImage;
use tempfile::tempdir;

fn small_config(dir: &Path) -> RunConfig {
    let mut config = RunConfig::default();
    config.lattice = LatticeConfig {
        width: 6,
        height: 5,
        sources: vec![SourceConfig::Uniform { occupancy: 2 }],
    };
    config.simulation.steps = Some(4);
    config.simulation.params.seed = 11;
    config.output.directory = dir.to_path_buf();
    config.output.frame_interval = 2;
    config.output.gif_delay_ms = 10;
    config.output.snapshot = Some(SnapshotConfig {
        format: SnapshotFormat::Json,
        compress: false,
        file: "final_state.snap".to_string(),
    });
    config
}

fn count_files(dir: &Path, prefix: &str) -> usize {
    std::fs::read_dir(dir)
        .unwrap()
        .filter(|entry| {
            let name = entry.as_ref().unwrap().file_name();
            name.to_string_lossy().starts_with(prefix)
        })
        .count()
}

#[test]
fn run_writes_frames_gif_stats_and_snapshot() {
    let dir = tempdir().unwrap();
    let mut config = small_config(dir.path());
    config.output.colour_charge = true;

    let summary = run(config, &RunOverrides::default()).unwrap();

    assert_eq!(summary.frames, 4);
    assert_eq!(summary.final_stats.total_population, 60);
    // frames 0, 2 and 4, each as grayscale plus colour
    assert_eq!(summary.frames_written, 6);
    let frames = dir.path().join("frames");
    assert_eq!(count_files(&frames, "frame_"), 3);
    assert_eq!(count_files(&frames, "charge_"), 3);
    assert!(frames.join("frame_00002.png").exists());
    assert!(!frames.join("frame_00001.png").exists());

    assert_eq!(summary.gif.as_deref(), Some(dir.path().join("diffusion.gif").as_path()));
    assert!(dir.path().join("diffusion.gif").exists());

    let stats = std::fs::read_to_string(dir.path().join("stats.csv")).unwrap();
    assert_eq!(stats.lines().count(), 1 + 5);

    let snapshot = io::load_snapshot(summary.snapshot.unwrap()).unwrap();
    assert_eq!(snapshot.frame, 4);
    assert_eq!(snapshot.lattice.total_population(), 60);
}

#[test]
fn zero_frame_interval_writes_no_frames() {
    let dir = tempdir().unwrap();
    let mut config = small_config(dir.path());
    config.output.frame_interval = 0;

    let summary = run(config, &RunOverrides::default()).unwrap();
    assert_eq!(summary.frames_written, 0);
    assert!(summary.gif.is_none());
    assert!(!dir.path().join("frames").exists());
    assert!(dir.path().join("stats.csv").exists());
}

#[test]
fn run_matches_direct_simulation() {
    let dir = tempdir().unwrap();
    let config = small_config(dir.path());
    let mut direct = config.build_simulation().unwrap();
    direct.run(4);

    run(config, &RunOverrides::default()).unwrap();
    let snapshot = io::load_snapshot(dir.path().join("final_state.snap")).unwrap();
    assert_eq!(&snapshot.lattice, direct.lattice());
}

fn saved_snapshot(dir: &Path, temperature: f64) -> (std::path::PathBuf, Simulation) {
    let params = SimConfig {
        temperature,
        seed: 21,
        ..SimConfig::default()
    };
    let mut sim = Simulation::from_occupancy(&filled_grid(5, 5, 2), params).unwrap();
    sim.run(3);
    let path = dir.join("saved.snap");
    io::save_snapshot(&path, &Snapshot::from_simulation(&sim), SnapshotFormat::Binary, true).unwrap();
    (path, sim)
}

#[test]
fn resume_keeps_saved_temperature_and_continues_exactly() {
    let dir = tempdir().unwrap();
    let (path, mut reference) = saved_snapshot(dir.path(), 5.0);
    reference.run(2);

    let out = dir.path().join("resumed");
    let overrides = RunOverrides {
        resume: Some(path),
        steps: Some(2),
        output: Some(out.clone()),
        ..RunOverrides::default()
    };
    let mut config = RunConfig::default();
    config.output.snapshot = small_config(&out).output.snapshot;

    let summary = run(config, &overrides).unwrap();
    assert_eq!(summary.frames, 5);

    let resumed = io::load_snapshot(out.join("final_state.snap")).unwrap();
    assert_eq!(resumed.config.temperature, 5.0);
    assert_eq!(resumed.config.seed, 21);
    assert_eq!(resumed.frame, 5);
    assert_eq!(&resumed.lattice, reference.lattice());
    // frame numbering continues from the snapshot
    assert!(out.join("frames").join("frame_00003.png").exists());
}

#[test]
fn resume_applies_explicit_temperature() {
    let dir = tempdir().unwrap();
    let (path, _) = saved_snapshot(dir.path(), 5.0);
    let out = dir.path().join("hot");
    let overrides = RunOverrides {
        resume: Some(path),
        steps: Some(1),
        temperature: Some(7.5),
        output: Some(out.clone()),
        ..RunOverrides::default()
    };
    let mut config = RunConfig::default();
    config.output.frame_interval = 0;
    config.output.snapshot = small_config(&out).output.snapshot;

    run(config, &overrides).unwrap();
    let resumed = io::load_snapshot(out.join("final_state.snap")).unwrap();
    assert_eq!(resumed.config.temperature, 7.5);
}

#[test]
fn overrides_replace_config_values() {
    let mut config = RunConfig::default();
    let overrides = RunOverrides {
        steps: Some(9),
        temperature: Some(2.5),
        seed: Some(4),
        parallel: Some(true),
        mode: Some("charge".to_string()),
        ..RunOverrides::default()
    };
    overrides.apply(&mut config).unwrap();
    assert_eq!(config.simulation.steps(), 9);
    assert_eq!(config.simulation.params.temperature, 2.5);
    assert_eq!(config.simulation.params.seed, 4);
    assert!(config.simulation.params.parallel);
    assert_eq!(config.output.mode, "charge");
}

#[test]
fn overrides_are_validated() {
    let bad_mode = RunOverrides {
        mode: Some("velocity".to_string()),
        ..RunOverrides::default()
    };
    assert!(matches!(
        bad_mode.apply(&mut RunConfig::default()),
        Err(LatticeError::InvalidMode(_))
    ));

    let bad_temperature = RunOverrides {
        temperature: Some(-1.0),
        ..RunOverrides::default()
    };
    assert!(matches!(
        bad_temperature.apply(&mut RunConfig::default()),
        Err(LatticeError::InvalidParameter { name: "temperature", .. })
    ));
}

#[test]
fn parallel_run_matches_serial_run() {
    let serial_dir = tempdir().unwrap();
    let parallel_dir = tempdir().unwrap();
    run(small_config(serial_dir.path()), &RunOverrides::default()).unwrap();
    let parallel = RunOverrides {
        parallel: Some(true),
        ..RunOverrides::default()
    };
    run(small_config(parallel_dir.path()), &parallel).unwrap();

    let a = io::load_snapshot(serial_dir.path().join("final_state.snap")).unwrap();
    let b = io::load_snapshot(parallel_dir.path().join("final_state.snap")).unwrap();
    assert_eq!(a.lattice, b.lattice);
}

#[test]
fn thread_pool_can_be_requested_twice() {
    init_thread_pool();
    init_thread_pool();
    assert!(rayon::current_num_threads() >= 1);
}

#[test]
fn frame_writer_counts_frames() {
    let dir = tempdir().unwrap();
    let writer = FrameWriter::spawn(dir.path().join("frames"), Some((dir.path().join("a.gif"), 10)));
    for frame in 0..3 {
        writer
            .send(FrameMessage::Gray {
                frame,
                image: GrayImage::new(4, 4),
            })
            .unwrap();
    }
    let written = writer.finish().unwrap();
    assert_eq!(written.count, 3);
    assert_eq!(written.gif, Some(dir.path().join("a.gif")));
    assert!(dir.path().join("frames").join("frame_00002.png").exists());
}

#[test]
fn frame_writer_reports_io_errors_on_finish() {
    let dir = tempdir().unwrap();
    // A regular file where the frame directory should go
    let blocked = dir.path().join("frames");
    std::fs::write(&blocked, b"not a directory").unwrap();

    let writer = FrameWriter::spawn(blocked, None);
    let _ = writer.send(FrameMessage::Gray {
        frame: 0,
        image: GrayImage::new(2, 2),
    });
    assert!(writer.finish().is_err());
}
