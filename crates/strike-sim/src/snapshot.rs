//! Periodic engagement telemetry for the headless runner.

use serde::Serialize;
use strike_core::components::{AerodynamicProfile, Seeker, Transform};
use strike_core::{SimTime, Vec3};
use strike_ecs::{Entity, Registry};

/// One observation of the shooter/target pair, serializable for logs.
#[derive(Debug, Clone, Serialize)]
pub struct EngagementSnapshot {
    pub tick: u64,
    pub elapsed_s: f64,
    pub missile_position: [f64; 3],
    pub target_position: [f64; 3],
    pub range_m: f64,
    pub missile_mach: Option<f64>,
    pub has_lock: bool,
}

fn array(v: Vec3) -> [f64; 3] {
    [v.x, v.y, v.z]
}

/// Captures the engagement state, or `None` once either side is gone.
pub fn capture(
    registry: &Registry,
    time: SimTime,
    missile: Entity,
    target: Entity,
) -> Option<EngagementSnapshot> {
    let transforms = registry.read::<Transform>();
    let missile_transform = transforms.get(missile)?;
    let target_transform = transforms.get(target)?;

    let mach = registry
        .read::<AerodynamicProfile>()
        .get(missile)
        .map(|aero| aero.mach);
    let has_lock = registry
        .read::<Seeker>()
        .get(missile)
        .is_some_and(|seeker| seeker.has_lock);

    Some(EngagementSnapshot {
        tick: time.tick,
        elapsed_s: time.elapsed_s,
        missile_position: array(missile_transform.position),
        target_position: array(target_transform.position),
        range_m: (missile_transform.position - target_transform.position).norm(),
        missile_mach: mach,
        has_lock,
    })
}
