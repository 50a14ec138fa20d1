//! Electronic warfare: noise jamming and expendable countermeasures.
//!
//! Jamming runs before the sensor stage (a declared graph edge): every
//! antenna's effective noise floor is recomputed as thermal noise plus the
//! summed contribution of all active jammers, so the radar range equation
//! downstream sees the degraded SNR.
//!
//! Countermeasure dispensing decrements inventory and queues decoy spawns;
//! the engine applies the queue at the tick boundary, so fresh chaff and
//! flares become observable to seekers on the next tick.

use std::sync::{Arc, Mutex, PoisonError};

use strike_core::components::{
    Antenna, CountermeasureDispenser, IrSignature, Jammer, RcsProfile, Transform,
};
use strike_core::constants::{CHAFF_RCS_PROFILE, FLARE_IR_PROFILE};
use strike_ecs::Registry;

use crate::graph::System;

/// What a dispenser ejected and where.
pub enum Decoy {
    Chaff(Transform),
    Flare(Transform),
}

/// Deferred decoy spawns, drained by the engine after the last stage.
#[derive(Default)]
pub struct DecoyQueue {
    pending: Mutex<Vec<Decoy>>,
}

impl DecoyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, decoy: Decoy) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(decoy);
    }

    pub fn drain(&self) -> Vec<Decoy> {
        std::mem::take(&mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Creates the queued decoys as registry entities.
    pub fn apply(&self, registry: &Registry) {
        for decoy in self.drain() {
            match decoy {
                Decoy::Chaff(transform) => {
                    let cloud = registry.create();
                    tracing::info!(entity = ?cloud, "chaff cloud bloomed");
                    registry.add(cloud, transform);
                    registry.add(
                        cloud,
                        RcsProfile {
                            profile_path: CHAFF_RCS_PROFILE.to_owned(),
                        },
                    );
                }
                Decoy::Flare(transform) => {
                    let flare = registry.create();
                    tracing::info!(entity = ?flare, "flare ejected");
                    registry.add(flare, transform);
                    registry.add(
                        flare,
                        IrSignature {
                            profile_path: FLARE_IR_PROFILE.to_owned(),
                        },
                    );
                }
            }
        }
    }
}

pub struct ElectronicWarfareSystem {
    decoys: Arc<DecoyQueue>,
}

impl ElectronicWarfareSystem {
    pub fn new(decoys: Arc<DecoyQueue>) -> Self {
        Self { decoys }
    }
}

impl System for ElectronicWarfareSystem {
    fn name(&self) -> &'static str {
        "electronic-warfare"
    }

    fn update(&self, registry: &Registry, _dt: f64) {
        let transforms = registry.read::<Transform>();
        let mut antennas = registry.write::<Antenna>();
        let jammers = registry.read::<Jammer>();
        let mut dispensers = registry.write::<CountermeasureDispenser>();

        // --- Noise jamming into every receiver ---
        for (receiver, antenna) in antennas.iter_mut() {
            let Some(receiver_transform) = transforms.get(receiver) else {
                continue;
            };

            let mut jamming_w = 0.0;
            for (jammer_entity, jammer) in jammers.iter() {
                if !jammer.active || jammer_entity == receiver {
                    continue;
                }
                let Some(jammer_transform) = transforms.get(jammer_entity) else {
                    continue;
                };

                let range_squared = (receiver_transform.position - jammer_transform.position)
                    .norm_squared();
                if range_squared < 1.0 {
                    continue;
                }

                // One-way Friis: power density at the receiver times the
                // antenna's effective aperture.
                let power_density = jammer.effective_radiated_power_w
                    / (4.0 * std::f64::consts::PI * range_squared);
                let gain_linear = 10f64.powf(antenna.gain_db / 10.0);
                let effective_aperture = gain_linear * antenna.wavelength_m * antenna.wavelength_m
                    / (4.0 * std::f64::consts::PI);

                jamming_w += power_density * effective_aperture;
            }

            // Recomputed from the thermal floor each tick: jamming stops
            // the moment the jammer dies.
            antenna.noise_floor_w = antenna.thermal_noise_floor_w + jamming_w;
        }

        // --- Countermeasure dispensing ---
        for (entity, dispenser) in dispensers.iter_mut() {
            let Some(transform) = transforms.get(entity) else {
                continue;
            };

            if dispenser.deploy_chaff && dispenser.chaff_count > 0 {
                dispenser.chaff_count -= 1;
                dispenser.deploy_chaff = false;
                self.decoys.push(Decoy::Chaff(transform.clone()));
            }
            if dispenser.deploy_flare && dispenser.flare_count > 0 {
                dispenser.flare_count -= 1;
                dispenser.deploy_flare = false;
                self.decoys.push(Decoy::Flare(transform.clone()));
            }
        }
    }
}
