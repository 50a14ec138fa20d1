//! Headless scenario runner.
//!
//! Loads a scenario, builds the engine, and runs the engagement to
//! completion, logging a telemetry snapshot once per simulated second.
//!
//! Exit codes: 0 success, 1 scenario load failure, 2 atmosphere or engine
//! configuration failure.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use strike_core::enums::GpsFusion;
use strike_sim::engine::{Engine, EngineConfig};
use strike_sim::scenario::{self, Scenario};
use strike_sim::snapshot;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "strike-runner")]
#[command(about = "Run a StrikeEngine engagement scenario headless")]
struct Cli {
    /// Path to the scenario JSON file.
    scenario: PathBuf,

    /// Path to the precomputed atmosphere table.
    #[arg(long, default_value = "data/atmosphere_table.bin")]
    atmosphere: PathBuf,

    /// Directory of aerodynamic coefficient profiles.
    #[arg(long, default_value = "data/aero")]
    aero_dir: PathBuf,

    /// RNG seed; a fixed seed reproduces a run exactly.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Worker threads (0 = hardware parallelism).
    #[arg(long, default_value_t = 0)]
    workers: usize,

    /// GPS fusion policy.
    #[arg(long, value_enum, default_value_t = FusionArg::Kalman)]
    fusion: FusionArg,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FusionArg {
    Kalman,
    Replace,
}

impl From<FusionArg> for GpsFusion {
    fn from(arg: FusionArg) -> Self {
        match arg {
            FusionArg::Kalman => GpsFusion::Kalman,
            FusionArg::Replace => GpsFusion::Replace,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let scenario = match Scenario::load(&cli.scenario) {
        Ok(scenario) => scenario,
        Err(e) => {
            error!("failed to load scenario: {e}");
            return ExitCode::from(1);
        }
    };

    let config = EngineConfig {
        seed: cli.seed,
        workers: cli.workers,
        atmosphere_path: cli.atmosphere,
        fusion: cli.fusion.into(),
        aero_profile_dir: cli.aero_dir,
    };
    let mut engine = match Engine::new(config) {
        Ok(engine) => engine,
        Err(e) => {
            error!("failed to build engine: {e}");
            return ExitCode::from(2);
        }
    };

    let loaded = match scenario::instantiate(&engine, &scenario) {
        Ok(loaded) => loaded,
        Err(e) => {
            error!("failed to instantiate scenario: {e}");
            return ExitCode::from(1);
        }
    };

    let dt = scenario.dt();
    let duration = scenario.simulation.duration_s;
    let ticks_per_second = (1.0 / dt).round().max(1.0) as u64;

    // A scenario that never had guided entities runs its full duration;
    // only an engagement that was in progress ends the run early.
    let had_guided = engine.guided_remaining() > 0;

    info!(duration_s = duration, dt, "starting engagement");
    while engine.time().elapsed_s < duration {
        if had_guided && engine.guided_remaining() == 0 {
            info!(
                elapsed_s = engine.time().elapsed_s,
                "engagement complete: no guided entities remain"
            );
            break;
        }
        engine.update(dt);

        if engine.time().tick % ticks_per_second == 0 {
            if let Some(snap) =
                snapshot::capture(engine.registry(), engine.time(), loaded.shooter, loaded.target)
            {
                match serde_json::to_string(&snap) {
                    Ok(json) => info!(target: "telemetry", "{json}"),
                    Err(e) => error!("snapshot serialization failed: {e}"),
                }
            }
        }
    }

    info!(
        elapsed_s = engine.time().elapsed_s,
        ticks = engine.time().tick,
        "run finished"
    );
    ExitCode::SUCCESS
}
