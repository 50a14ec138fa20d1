//! Point-mass gravity toward the Earth's center at the world origin.

use strike_core::components::{ForceAccumulator, Mass, Transform};
use strike_core::constants::{EARTH_MASS_KG, GRAVITATIONAL_CONSTANT};
use strike_ecs::Registry;

use crate::graph::System;

pub struct GravitySystem;

impl System for GravitySystem {
    fn name(&self) -> &'static str {
        "gravity"
    }

    fn update(&self, registry: &Registry, _dt: f64) {
        // Read-only guards on the shared pools keep this system fully
        // concurrent with the other stage-one systems.
        let transforms = registry.read::<Transform>();
        let masses = registry.read::<Mass>();
        let mut accumulators = registry.write::<ForceAccumulator>();

        for (entity, accumulator) in accumulators.iter_mut() {
            let Some(transform) = transforms.get(entity) else {
                continue;
            };
            let Some(mass) = masses.get(entity) else {
                continue;
            };

            let distance = transform.position.norm();
            // An entity at the exact center has no defined direction.
            if distance < 1.0 {
                continue;
            }

            let magnitude = GRAVITATIONAL_CONSTANT * EARTH_MASS_KG * mass.current_kg
                / (distance * distance);
            let direction = -transform.position / distance;
            accumulator.add_force(direction * magnitude);
        }
    }
}
