//! Scenario files: simulation settings, entity roster, engagement wiring.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use strike_core::components::Guidance;
use strike_core::constants::DEFAULT_TIME_STEP_HZ;
use strike_ecs::Entity;

use crate::engine::Engine;
use crate::error::SimError;

#[derive(Debug, Deserialize)]
pub struct Scenario {
    pub simulation: SimulationSettings,
    pub entities: Vec<EntityDef>,
    pub engagement: Engagement,
}

#[derive(Debug, Deserialize)]
pub struct SimulationSettings {
    pub duration_s: f64,
    pub time_step_hz: f64,
}

#[derive(Debug, Deserialize)]
pub struct EntityDef {
    pub name: String,
    pub profile: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct Engagement {
    pub shooter: String,
    pub target: String,
}

impl Scenario {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| SimError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Fixed timestep derived from the configured rate.
    pub fn dt(&self) -> f64 {
        if self.simulation.time_step_hz > 0.0 {
            1.0 / self.simulation.time_step_hz
        } else {
            1.0 / DEFAULT_TIME_STEP_HZ
        }
    }
}

/// Entities created for one scenario, by name, plus the engagement pair.
pub struct LoadedScenario {
    pub entities: HashMap<String, Entity>,
    pub shooter: Entity,
    pub target: Entity,
}

/// Spawns every entity the scenario lists and points the shooter's
/// guidance at the designated target.
pub fn instantiate(engine: &Engine, scenario: &Scenario) -> Result<LoadedScenario, SimError> {
    let mut entities = HashMap::new();
    for def in &scenario.entities {
        let entity = engine.spawn_profile(&def.profile)?;
        entities.insert(def.name.clone(), entity);
    }

    let shooter = *entities
        .get(&scenario.engagement.shooter)
        .ok_or_else(|| SimError::UnknownScenarioEntity(scenario.engagement.shooter.clone()))?;
    let target = *entities
        .get(&scenario.engagement.target)
        .ok_or_else(|| SimError::UnknownScenarioEntity(scenario.engagement.target.clone()))?;

    {
        let mut guidances = engine.registry().write::<Guidance>();
        if let Some(guidance) = guidances.get_mut(shooter) {
            guidance.target = target;
        }
    }
    tracing::info!(
        shooter = %scenario.engagement.shooter,
        target = %scenario.engagement.target,
        "engagement set"
    );

    Ok(LoadedScenario {
        entities,
        shooter,
        target,
    })
}
