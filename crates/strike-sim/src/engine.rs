//! The engine: registry + job pool + system graph, driven at fixed dt.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use strike_core::components::{
    AerodynamicProfile, Antenna, AutopilotCommand, AutopilotState, ControlSurface,
    CountermeasureDispenser, ForceAccumulator, Fuze, Gps, Guidance, Imu, Inertia, InfraredSeeker,
    IrSignature, Jammer, Mass, NavigationState, Propulsion, RcsProfile, Seeker, Target, Transform,
    Velocity, Warhead,
};
use strike_core::enums::GpsFusion;
use strike_core::SimTime;
use strike_ecs::{Entity, Registry};

use crate::atmosphere::AtmosphereTable;
use crate::error::SimError;
use crate::factory;
use crate::graph::{SystemGraph, SystemId};
use crate::jobs::JobPool;
use crate::systems::ew::DecoyQueue;
use crate::systems::{
    AerodynamicsSystem, ControlSystem, ElectronicWarfareSystem, EndgameSystem, GravitySystem,
    GuidanceSystem, IntegrationSystem, NavigationSystem, PropulsionSystem, SensorSystem,
};

/// Engine construction parameters.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Seed for every stochastic system. Same seed, same run.
    pub seed: u64,
    /// Worker threads; 0 means hardware parallelism.
    pub workers: usize,
    pub atmosphere_path: PathBuf,
    pub fusion: GpsFusion,
    /// Directory holding `<profile_id>.json` aerodynamic tables.
    pub aero_profile_dir: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            workers: 0,
            atmosphere_path: PathBuf::from("data/atmosphere_table.bin"),
            fusion: GpsFusion::Kalman,
            aero_profile_dir: PathBuf::from("data/aero"),
        }
    }
}

/// Registers every component kind the simulation knows about. Pools must
/// exist before the registry is shared with the worker threads.
pub fn register_components(registry: &mut Registry) {
    registry.register::<Transform>();
    registry.register::<Velocity>();
    registry.register::<Mass>();
    registry.register::<Inertia>();
    registry.register::<ForceAccumulator>();
    registry.register::<AerodynamicProfile>();
    registry.register::<Propulsion>();
    registry.register::<ControlSurface>();
    registry.register::<AutopilotCommand>();
    registry.register::<AutopilotState>();
    registry.register::<NavigationState>();
    registry.register::<Imu>();
    registry.register::<Gps>();
    registry.register::<Guidance>();
    registry.register::<Seeker>();
    registry.register::<Antenna>();
    registry.register::<InfraredSeeker>();
    registry.register::<RcsProfile>();
    registry.register::<IrSignature>();
    registry.register::<Target>();
    registry.register::<Fuze>();
    registry.register::<Warhead>();
    registry.register::<Jammer>();
    registry.register::<CountermeasureDispenser>();
}

/// Fixed-timestep parallel simulation engine.
///
/// Each tick walks the staged execution plan: every system of a stage is
/// submitted to the job pool, the pool barrier enforces the stage boundary,
/// and deferred structural changes (decoy spawns) are applied once the last
/// stage has drained.
pub struct Engine {
    registry: Arc<Registry>,
    jobs: JobPool,
    graph: SystemGraph,
    stages: Vec<Vec<SystemId>>,
    decoys: Arc<DecoyQueue>,
    time: SimTime,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self, SimError> {
        let atmosphere = Arc::new(AtmosphereTable::load(&config.atmosphere_path)?);
        Self::with_atmosphere(config, atmosphere)
    }

    /// Builds the engine around an already-loaded atmosphere table.
    pub fn with_atmosphere(
        config: EngineConfig,
        atmosphere: Arc<AtmosphereTable>,
    ) -> Result<Self, SimError> {
        let mut registry = Registry::new();
        register_components(&mut registry);
        let registry = Arc::new(registry);

        let decoys = Arc::new(DecoyQueue::new());
        let mut graph = SystemGraph::new();

        let ew = graph.add_system(Arc::new(ElectronicWarfareSystem::new(Arc::clone(&decoys))));
        let gravity = graph.add_system(Arc::new(GravitySystem));
        let navigation = graph.add_system(Arc::new(NavigationSystem::new(
            config.fusion,
            config.seed,
        )));
        let sensor = graph.add_system(Arc::new(SensorSystem::new()));
        let propulsion = graph.add_system(Arc::new(PropulsionSystem::new(Arc::clone(
            &atmosphere,
        ))));
        let guidance = graph.add_system(Arc::new(GuidanceSystem));
        let control = graph.add_system(Arc::new(ControlSystem::new(Arc::clone(&atmosphere))));
        let aerodynamics = graph.add_system(Arc::new(AerodynamicsSystem::with_profile_dir(
            atmosphere,
            config.aero_profile_dir,
        )));
        let integration = graph.add_system(Arc::new(IntegrationSystem));
        let endgame = graph.add_system(Arc::new(EndgameSystem));

        // Jamming raises noise floors before any radar looks through them.
        graph.add_dependency(sensor, ew)?;
        // The GNC chain: estimate and detect, decide, actuate.
        graph.add_dependency(guidance, navigation)?;
        graph.add_dependency(guidance, sensor)?;
        graph.add_dependency(control, guidance)?;
        graph.add_dependency(aerodynamics, control)?;
        // Propulsion rewrites Mass; gravity reads the pre-burn value.
        graph.add_dependency(propulsion, gravity)?;
        // The integrator consumes every force produced this tick.
        graph.add_dependency(integration, gravity)?;
        graph.add_dependency(integration, propulsion)?;
        graph.add_dependency(integration, aerodynamics)?;
        graph.add_dependency(endgame, integration)?;

        let stages = graph.execution_order()?;
        for (index, stage) in stages.iter().enumerate() {
            let names: Vec<_> = stage.iter().map(|&id| graph.system(id).name()).collect();
            tracing::debug!(stage = index, systems = ?names, "execution stage");
        }

        Ok(Self {
            registry,
            jobs: JobPool::new(config.workers),
            graph,
            stages,
            decoys,
            time: SimTime::default(),
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn time(&self) -> SimTime {
        self.time
    }

    /// System names per execution stage, in run order.
    pub fn stage_names(&self) -> Vec<Vec<&'static str>> {
        self.stages
            .iter()
            .map(|stage| {
                stage
                    .iter()
                    .map(|&id| self.graph.system(id).name())
                    .collect()
            })
            .collect()
    }

    /// Live entities still flying under guidance.
    pub fn guided_remaining(&self) -> usize {
        self.registry.read::<Guidance>().len()
    }

    /// Creates an entity from a JSON profile file.
    pub fn spawn_profile(&self, path: impl AsRef<Path>) -> Result<Entity, SimError> {
        factory::spawn_from_profile(&self.registry, path)
    }

    /// Advances the simulation by one fixed step.
    pub fn update(&mut self, dt: f64) {
        for stage in &self.stages {
            for &id in stage {
                let system = Arc::clone(self.graph.system(id));
                let registry = Arc::clone(&self.registry);
                self.jobs.submit(move || system.update(&registry, dt));
            }
            self.jobs.wait();
        }
        // Structural synchronization point: decoys spawned by EW become
        // real entities here, observable from the next tick on.
        self.decoys.apply(&self.registry);
        self.time.advance(dt);
    }

    /// Runs until `duration_s` of simulated time elapses, or until an
    /// engagement that was in progress has no guided entity left.
    pub fn run(&mut self, duration_s: f64, dt: f64) {
        let had_guided = self.guided_remaining() > 0;
        tracing::info!(duration_s, dt, "simulation run starting");

        while self.time.elapsed_s < duration_s {
            if had_guided && self.guided_remaining() == 0 {
                tracing::info!(
                    elapsed_s = self.time.elapsed_s,
                    "all engagement entities destroyed"
                );
                break;
            }
            self.update(dt);
        }
        tracing::info!(
            elapsed_s = self.time.elapsed_s,
            ticks = self.time.tick,
            "simulation run complete"
        );
    }
}
