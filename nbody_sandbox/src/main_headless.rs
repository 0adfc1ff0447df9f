//! Headless runner: steps a simulation without a window and reports on it.
//!
//! Useful for checking a sandbox setup or producing snapshots in bulk:
//!
//! ```text
//! nbody_headless --mode space --bodies 300 --ticks 2000 --export out.json
//! nbody_headless --sandbox saved.json --predict
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use glam::{DVec2, DVec3};
use nbody_sandbox::predictor::Fate;
use nbody_sandbox::{Scheduler, SimVector, SimulationConfig, Snapshot};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    /// 2D with the plane defaults
    Plane,
    /// 3D with the space defaults
    Space,
}

#[derive(Parser, Debug)]
#[command(name = "nbody_headless", about = "Run an N-body simulation without a window")]
struct Args {
    #[arg(long, value_enum, default_value_t = Mode::Plane)]
    mode: Mode,

    /// JSON configuration; overrides the mode's defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Exported snapshot to seed a sandbox run from
    #[arg(long)]
    sandbox: Option<PathBuf>,

    #[arg(long, default_value_t = 1000)]
    ticks: u64,

    #[arg(long)]
    bodies: Option<usize>,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    merge: bool,

    /// Log a progress line every this many ticks (0 disables)
    #[arg(long, default_value_t = 100)]
    report_every: u64,

    /// Run the predictor on the final state and list upcoming collisions
    #[arg(long)]
    predict: bool,

    /// Write the final state as a snapshot
    #[arg(long)]
    export: Option<PathBuf>,
}

impl Args {
    fn simulation_config(&self) -> Result<SimulationConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
            }
            None => match self.mode {
                Mode::Plane => SimulationConfig::plane(),
                Mode::Space => SimulationConfig::space(),
            },
        };
        if let Some(path) = &self.sandbox {
            let snapshot = Snapshot::load(path).with_context(|| format!("loading {}", path.display()))?;
            config = config.with_snapshot(snapshot);
        }
        if let Some(bodies) = self.bodies {
            config.initial_body_count = bodies;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config.merge_mode |= self.merge;
        Ok(config)
    }
}

fn run<V: SimVector>(args: &Args, config: SimulationConfig) -> Result<()> {
    let mut scheduler = Scheduler::<V>::new(config).context("invalid configuration")?;
    scheduler.start(true, None)?;
    log::info!(
        "{}D run: {} bodies, energy {:.4e}",
        V::DIMENSIONS,
        scheduler.stars().len(),
        scheduler.total_energy()
    );

    let mut skipped = 0u64;
    for _ in 0..args.ticks {
        match scheduler.tick() {
            Ok(report) => {
                if args.report_every > 0 && report.tick % args.report_every == 0 {
                    log::info!(
                        "tick {}: {} bodies, momentum {:?}, energy {:.4e}",
                        report.tick,
                        report.remaining,
                        scheduler.total_momentum(),
                        scheduler.total_energy()
                    );
                }
            }
            Err(err) => {
                skipped += 1;
                log::warn!("skipping tick: {err}");
            }
        }
    }
    let collisions = scheduler
        .drain_events()
        .iter()
        .filter(|e| matches!(e, nbody_sandbox::SimEvent::Removed { absorbed_by: Some(_), .. }))
        .count();

    println!(
        "{} ticks ({} skipped), {} collisions, {} bodies remain",
        scheduler.tick_count(),
        skipped,
        collisions,
        scheduler.stars().len()
    );
    println!("largest:");
    for star in scheduler.largest(13) {
        println!(
            "  {:>6}  size {:>9.4}  speed {:>9.4}",
            star.id.to_string(),
            star.size(),
            star.speed()
        );
    }

    if args.predict {
        let prediction = scheduler.predict(None)?;
        println!(
            "next {} ticks: {} collisions",
            prediction.ticks,
            prediction.destroyed.len()
        );
        for doomed in &prediction.destroyed {
            if let Some(Fate::Destroyed { tick, absorbed_by }) = prediction.fate(doomed.star.id) {
                println!("  {} absorbed by {} in {} ticks", doomed.star.id, absorbed_by, tick);
            }
        }
    }

    if let Some(path) = &args.export {
        scheduler
            .export_snapshot()
            .save(path)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("snapshot written to {}", path.display());
    }

    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = args.simulation_config()?;

    match args.mode {
        Mode::Plane => run::<DVec2>(&args, config),
        Mode::Space => run::<DVec3>(&args, config),
    }
}
