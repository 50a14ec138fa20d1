//! Multi-stage propulsion: thrust curves, staging, and fuel burn.

use std::sync::Arc;

use strike_core::components::{ForceAccumulator, Mass, Propulsion, Transform};
use strike_core::constants::{G0, SEA_LEVEL_PRESSURE_PA};
use strike_ecs::Registry;

use crate::atmosphere::AtmosphereTable;
use crate::graph::System;

pub struct PropulsionSystem {
    atmosphere: Arc<AtmosphereTable>,
}

impl PropulsionSystem {
    pub fn new(atmosphere: Arc<AtmosphereTable>) -> Self {
        Self { atmosphere }
    }
}

impl System for PropulsionSystem {
    fn name(&self) -> &'static str {
        "propulsion"
    }

    fn update(&self, registry: &Registry, dt: f64) {
        let transforms = registry.read::<Transform>();
        let mut masses = registry.write::<Mass>();
        let mut accumulators = registry.write::<ForceAccumulator>();
        let mut propulsions = registry.write::<Propulsion>();

        for (entity, propulsion) in propulsions.iter_mut() {
            if !propulsion.active || propulsion.current_stage >= propulsion.stages.len() {
                continue;
            }
            let Some(transform) = transforms.get(entity) else {
                continue;
            };
            let Some(mass) = masses.get_mut(entity) else {
                continue;
            };
            let Some(accumulator) = accumulators.get_mut(entity) else {
                continue;
            };

            let stage = &propulsion.stages[propulsion.current_stage];

            // Burnout: drop the stage, advance, and spend no thrust this tick.
            if propulsion.time_in_stage_s >= stage.burn_time_s {
                mass.current_kg -= stage.stage_mass_kg;
                mass.refresh_inverse();
                tracing::info!(
                    entity = ?entity,
                    stage = %stage.name,
                    dropped_kg = stage.stage_mass_kg,
                    "stage separation"
                );
                propulsion.current_stage += 1;
                propulsion.time_in_stage_s = 0.0;
                if propulsion.current_stage >= propulsion.stages.len() {
                    propulsion.active = false;
                }
                continue;
            }

            let thrust = stage.thrust_at(propulsion.time_in_stage_s);
            if thrust > 0.0 {
                accumulator.add_force(transform.body_forward() * thrust);

                // Isp varies with ambient pressure between its sea-level and
                // vacuum ratings. Geocentric altitude; the table clamps.
                let altitude = transform.position.norm();
                let ambient = self.atmosphere.properties(altitude).pressure;
                let fraction = (ambient / SEA_LEVEL_PRESSURE_PA).clamp(0.0, 1.0);
                let isp =
                    stage.isp_vacuum_s + (stage.isp_sea_level_s - stage.isp_vacuum_s) * fraction;

                if isp > 0.0 {
                    let mdot = thrust / (isp * G0);
                    mass.current_kg -= mdot * dt;
                    mass.refresh_inverse();
                }
            }

            propulsion.time_in_stage_s += dt;
        }
    }
}
