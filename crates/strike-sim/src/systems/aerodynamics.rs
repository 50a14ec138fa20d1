//! Aerodynamic lift and drag from per-vehicle coefficient tables.

use std::path::PathBuf;
use std::sync::Arc;

use strike_core::components::{AerodynamicProfile, ForceAccumulator, Transform, Velocity};
use strike_ecs::Registry;

use crate::atmosphere::AtmosphereTable;
use crate::flight::{AeroDatabase, ProfileCache};
use crate::graph::System;

pub struct AerodynamicsSystem {
    atmosphere: Arc<AtmosphereTable>,
    databases: ProfileCache<AeroDatabase>,
    profile_dir: PathBuf,
}

impl AerodynamicsSystem {
    pub fn new(atmosphere: Arc<AtmosphereTable>) -> Self {
        Self::with_profile_dir(atmosphere, "data/aero")
    }

    pub fn with_profile_dir(atmosphere: Arc<AtmosphereTable>, dir: impl Into<PathBuf>) -> Self {
        Self {
            atmosphere,
            databases: ProfileCache::new(),
            profile_dir: dir.into(),
        }
    }

    #[cfg(test)]
    fn with_database(atmosphere: Arc<AtmosphereTable>, id: &str, db: AeroDatabase) -> Self {
        let system = Self::new(atmosphere);
        system.databases.insert(id, db);
        system
    }
}

impl System for AerodynamicsSystem {
    fn name(&self) -> &'static str {
        "aerodynamics"
    }

    fn update(&self, registry: &Registry, _dt: f64) {
        let transforms = registry.read::<Transform>();
        let velocities = registry.read::<Velocity>();
        let mut accumulators = registry.write::<ForceAccumulator>();
        let mut profiles = registry.write::<AerodynamicProfile>();

        for (entity, aero) in profiles.iter_mut() {
            let Some(transform) = transforms.get(entity) else {
                continue;
            };
            let Some(velocity) = velocities.get(entity) else {
                continue;
            };
            let Some(accumulator) = accumulators.get_mut(entity) else {
                continue;
            };

            let Some(db) = self.databases.fetch(&aero.profile_id, |id| {
                AeroDatabase::load(self.profile_dir.join(format!("{id}.json")))
            }) else {
                // Missing profile: skip this entity for the tick.
                continue;
            };

            let speed_squared = velocity.linear.norm_squared();
            if speed_squared < 1e-6 {
                aero.angle_of_attack_rad = 0.0;
                aero.sideslip_rad = 0.0;
                aero.mach = 0.0;
                continue;
            }

            let altitude = transform.position.norm();
            let atmosphere = self.atmosphere.properties(altitude);
            let speed = speed_squared.sqrt();
            aero.mach = speed / atmosphere.speed_of_sound;

            let velocity_dir = velocity.linear / speed;
            let body_forward = transform.body_forward();
            aero.angle_of_attack_rad =
                velocity_dir.dot(&body_forward).clamp(-1.0, 1.0).acos();
            let velocity_body = transform.orientation.inverse() * velocity_dir;
            aero.sideslip_rad = velocity_body.z.clamp(-1.0, 1.0).asin();

            let coefficients = db.coefficients(aero.mach, aero.angle_of_attack_rad);
            let mut cl = coefficients.cl;
            let mut cd = coefficients.cd;

            // Ground effect: flat-ground AGL from the world Y coordinate.
            let agl = transform.position.y;
            if aero.wingspan_m > 0.0 && agl > 0.0 && agl < 2.0 * aero.wingspan_m {
                let h_b = agl / aero.wingspan_m;
                let k = 33.0 * h_b.powf(1.5) / (1.0 + 33.0 * h_b.powf(1.5));
                cd *= k;
                cl *= 1.0 + 0.5 * (1.0 - k);
            }

            let dynamic_pressure = 0.5 * atmosphere.density * speed_squared;
            let lift = cl * dynamic_pressure * aero.reference_area_m2;
            let drag = cd * dynamic_pressure * aero.reference_area_m2;

            accumulator.add_force(-velocity_dir * drag);

            // Lift acts in the plane of velocity and body-up, normal to the
            // velocity.
            let body_up = transform.body_up();
            if let Some(lift_dir) = velocity_dir
                .cross(&body_up)
                .cross(&velocity_dir)
                .try_normalize(1e-9)
            {
                accumulator.add_force(lift_dir * lift);
            }
        }
    }
}
