//! Seeker detection and lock maintenance.
//!
//! Dispatches on seeker kind. RF seekers run the two-way radar range
//! equation against aspect-interpolated RCS tables; IR and imaging-IR
//! seekers compare band-attenuated irradiance against detector sensitivity;
//! laser seekers gate geometrically against designated targets. Every path
//! applies the geometric gate first: range within `max_range_m` and the
//! line of sight within half the field of view of the body +X boresight.
//!
//! The first target satisfying detection wins the lock; if none does, the
//! lock drops and `locked_target` returns to the null sentinel.

use strike_core::components::{
    Antenna, InfraredSeeker, IrSignature, RcsProfile, Seeker, Target, Transform,
};
use strike_core::enums::SeekerKind;
use strike_core::Vec3;
use strike_ecs::{Entity, Registry, SparseSet};

use crate::atmosphere::AtmosphereTable;
use crate::flight::{IrSignatureDatabase, ProfileCache, RcsDatabase};
use crate::graph::System;

pub struct SensorSystem {
    rcs_databases: ProfileCache<RcsDatabase>,
    ir_databases: ProfileCache<IrSignatureDatabase>,
}

impl Default for SensorSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorSystem {
    pub fn new() -> Self {
        Self {
            rcs_databases: ProfileCache::new(),
            ir_databases: ProfileCache::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_rcs_database(path: &str, db: RcsDatabase) -> Self {
        let system = Self::new();
        system.rcs_databases.insert(path, db);
        system
    }

    #[cfg(test)]
    pub(crate) fn with_ir_database(path: &str, db: IrSignatureDatabase) -> Self {
        let system = Self::new();
        system.ir_databases.insert(path, db);
        system
    }
}

fn db_to_ratio(db: f64) -> f64 {
    10f64.powf(db / 10.0)
}

/// Range gate plus off-boresight gate: within `max_range_m` and no more
/// than half the field of view off the boresight. Returns the range on a
/// pass.
fn geometric_gate(seeker: &Seeker, own: &Transform, target_position: Vec3) -> Option<f64> {
    let range_vec = target_position - own.position;
    let range = range_vec.norm();
    if range < 1e-6 || range > seeker.max_range_m {
        return None;
    }
    let off_boresight = (range_vec / range)
        .dot(&own.body_forward())
        .clamp(-1.0, 1.0)
        .acos();
    (off_boresight.to_degrees() <= seeker.fov_deg / 2.0).then_some(range)
}

/// Sensor-to-target line of sight expressed in the target's body frame, as
/// (azimuth, elevation) aspect angles into the signature tables.
fn aspect_angles(own_position: Vec3, target: &Transform) -> (f64, f64) {
    let los = (target.position - own_position).normalize();
    let in_target_frame = target.orientation.inverse() * los;
    let azimuth = in_target_frame.y.atan2(in_target_frame.x);
    let elevation = (-in_target_frame.z).clamp(-1.0, 1.0).asin();
    (azimuth, elevation)
}

impl System for SensorSystem {
    fn name(&self) -> &'static str {
        "sensor"
    }

    fn update(&self, registry: &Registry, _dt: f64) {
        let transforms = registry.read::<Transform>();
        let mut seekers = registry.write::<Seeker>();
        let antennas = registry.read::<Antenna>();
        let ir_seekers = registry.read::<InfraredSeeker>();
        let rcs_profiles = registry.read::<RcsProfile>();
        let ir_signatures = registry.read::<IrSignature>();
        let targets = registry.read::<Target>();

        for i in 0..seekers.len() {
            let entity = seekers.entity_at(i);
            let seeker = seekers.value_at_mut(i);
            if !seeker.is_active {
                continue;
            }
            let Some(own_transform) = transforms.get(entity) else {
                continue;
            };

            let locked = match seeker.kind {
                SeekerKind::Rf => self.scan_radar(
                    entity,
                    seeker,
                    own_transform,
                    antennas.get(entity),
                    &transforms,
                    &rcs_profiles,
                ),
                SeekerKind::Ir | SeekerKind::ImagingIr => self.scan_infrared(
                    entity,
                    seeker,
                    own_transform,
                    ir_seekers.get(entity),
                    &transforms,
                    &ir_signatures,
                ),
                SeekerKind::Laser => {
                    scan_designated(entity, seeker, own_transform, &transforms, &targets)
                }
            };

            match locked {
                Some(target) => {
                    if !seeker.has_lock || seeker.locked_target != target {
                        tracing::info!(seeker = ?entity, target = ?target, "seeker lock acquired");
                    }
                    seeker.has_lock = true;
                    seeker.locked_target = target;
                }
                None => {
                    if seeker.has_lock {
                        tracing::info!(seeker = ?entity, "seeker lock dropped");
                    }
                    seeker.has_lock = false;
                    seeker.locked_target = Entity::NULL;
                }
            }
        }
    }
}

impl SensorSystem {
    /// Two-way radar range equation against every RCS-bearing target.
    #[allow(clippy::too_many_arguments)]
    fn scan_radar(
        &self,
        own: Entity,
        seeker: &Seeker,
        own_transform: &Transform,
        antenna: Option<&Antenna>,
        transforms: &SparseSet<Transform>,
        rcs_profiles: &SparseSet<RcsProfile>,
    ) -> Option<Entity> {
        let antenna = antenna?;
        for (target_entity, profile) in rcs_profiles.iter() {
            if target_entity == own {
                continue;
            }
            let Some(target_transform) = transforms.get(target_entity) else {
                continue;
            };
            let Some(range) = geometric_gate(seeker, own_transform, target_transform.position)
            else {
                continue;
            };
            let Some(db) = self
                .rcs_databases
                .fetch(&profile.profile_path, |p| RcsDatabase::load(p))
            else {
                continue;
            };

            let (azimuth, elevation) = aspect_angles(own_transform.position, target_transform);
            let rcs_m2 = db.rcs_m2(azimuth, elevation);

            let gain = db_to_ratio(antenna.gain_db);
            let lambda = antenna.wavelength_m;
            let received_power = antenna.transmit_power_w * gain * gain * lambda * lambda * rcs_m2
                / ((4.0 * std::f64::consts::PI).powi(3) * range.powi(4));
            let snr_db = 10.0 * (received_power / antenna.noise_floor_w).log10();

            if snr_db > antenna.snr_threshold_db {
                return Some(target_entity);
            }
        }
        None
    }

    /// Irradiance-vs-sensitivity detection for IR bands.
    fn scan_infrared(
        &self,
        own: Entity,
        seeker: &Seeker,
        own_transform: &Transform,
        detector: Option<&InfraredSeeker>,
        transforms: &SparseSet<Transform>,
        ir_signatures: &SparseSet<IrSignature>,
    ) -> Option<Entity> {
        let detector = detector?;
        for (target_entity, signature) in ir_signatures.iter() {
            if target_entity == own {
                continue;
            }
            let Some(target_transform) = transforms.get(target_entity) else {
                continue;
            };
            let Some(range) = geometric_gate(seeker, own_transform, target_transform.position)
            else {
                continue;
            };
            let Some(db) = self
                .ir_databases
                .fetch(&signature.profile_path, |p| IrSignatureDatabase::load(p))
            else {
                continue;
            };

            let (azimuth, elevation) = aspect_angles(own_transform.position, target_transform);
            let radiant_intensity = db.radiant_intensity(azimuth, elevation);
            let irradiance = radiant_intensity / (range * range);

            // Flat-ground AGL of the sensor sets how much atmosphere the
            // path crosses.
            let transmissivity =
                AtmosphereTable::transmissivity(range, own_transform.position.y, detector.band);

            if irradiance * transmissivity > detector.sensitivity_w {
                return Some(target_entity);
            }
        }
        None
    }
}

/// Geometric-only lock against designated (`Target`-bearing) entities.
fn scan_designated(
    own: Entity,
    seeker: &Seeker,
    own_transform: &Transform,
    transforms: &SparseSet<Transform>,
    targets: &SparseSet<Target>,
) -> Option<Entity> {
    for (target_entity, _) in targets.iter() {
        if target_entity == own {
            continue;
        }
        let Some(target_transform) = transforms.get(target_entity) else {
            continue;
        };
        if geometric_gate(seeker, own_transform, target_transform.position).is_some() {
            return Some(target_entity);
        }
    }
    None
}
