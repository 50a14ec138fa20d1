//! Fuze, warhead, and lethality assessment.
//!
//! When a missile with a live warhead closes within its fuze trigger
//! distance of the locked target, the warhead detonates: the target dies if
//! the miss distance is inside the lethal radius, and the missile dies
//! either way. Destruction is collected while pool guards are held and
//! applied afterwards.

use strike_core::components::{Fuze, Seeker, Transform, Warhead};
use strike_ecs::{Entity, Registry};

use crate::graph::System;

pub struct EndgameSystem;

impl System for EndgameSystem {
    fn name(&self) -> &'static str {
        "endgame"
    }

    fn update(&self, registry: &Registry, _dt: f64) {
        let mut destroyed: Vec<Entity> = Vec::new();

        {
            let transforms = registry.read::<Transform>();
            let seekers = registry.read::<Seeker>();
            let fuzes = registry.read::<Fuze>();
            let mut warheads = registry.write::<Warhead>();

            for (missile, warhead) in warheads.iter_mut() {
                if warhead.has_detonated {
                    continue;
                }
                let Some(fuze) = fuzes.get(missile) else {
                    continue;
                };
                let Some(seeker) = seekers.get(missile) else {
                    continue;
                };
                if !seeker.has_lock || seeker.locked_target.is_null() {
                    continue;
                }
                let Some(missile_transform) = transforms.get(missile) else {
                    continue;
                };
                let Some(target_transform) = transforms.get(seeker.locked_target) else {
                    continue;
                };

                let miss_distance =
                    (missile_transform.position - target_transform.position).norm();
                if miss_distance > fuze.trigger_distance_m {
                    continue;
                }

                warhead.has_detonated = true;
                let lethal = miss_distance <= warhead.lethal_radius_m;
                tracing::info!(
                    missile = ?missile,
                    target = ?seeker.locked_target,
                    miss_m = miss_distance,
                    lethal,
                    "warhead detonation"
                );

                if lethal {
                    destroyed.push(seeker.locked_target);
                }
                // The missile is expended by its own detonation.
                destroyed.push(missile);
            }
        }

        for entity in destroyed {
            registry.destroy(entity);
        }
    }
}
