//! Guidance laws: proportional navigation, augmented PN, pure pursuit.
//!
//! The missile flies on its *estimated* state from the navigation system;
//! the target is read from ground truth (targets are not self-aware).
//! Without a seeker lock — or with a dead or component-less target — the
//! command is zero. Output is written into [`AutopilotCommand`] in g.

use strike_core::components::{
    AutopilotCommand, ForceAccumulator, Guidance, NavigationState, Seeker, Transform, Velocity,
};
use strike_core::constants::G0;
use strike_core::enums::GuidanceLaw;
use strike_core::Vec3;
use strike_ecs::Registry;

use crate::graph::System;

pub struct GuidanceSystem;

impl System for GuidanceSystem {
    fn name(&self) -> &'static str {
        "guidance"
    }

    fn update(&self, registry: &Registry, _dt: f64) {
        let transforms = registry.read::<Transform>();
        let velocities = registry.read::<Velocity>();
        let accumulators = registry.read::<ForceAccumulator>();
        let mut commands = registry.write::<AutopilotCommand>();
        let nav_states = registry.read::<NavigationState>();
        let guidances = registry.read::<Guidance>();
        let seekers = registry.read::<Seeker>();

        for (entity, guidance) in guidances.iter() {
            let Some(command) = commands.get_mut(entity) else {
                continue;
            };

            let mut acceleration = Vec3::zeros();
            'compute: {
                if !guidance.enabled {
                    break 'compute;
                }
                let Some(seeker) = seekers.get(entity) else {
                    break 'compute;
                };
                let Some(nav) = nav_states.get(entity) else {
                    break 'compute;
                };
                if !seeker.has_lock || seeker.locked_target.is_null() {
                    break 'compute;
                }
                let target = seeker.locked_target;
                // Any dead or component-less target reads as "no lock".
                let Some(target_transform) = transforms.get(target) else {
                    break 'compute;
                };
                let Some(target_velocity) = velocities.get(target) else {
                    break 'compute;
                };

                let relative_position = target_transform.position - nav.position;
                let range_squared = relative_position.norm_squared();
                if range_squared < 1e-12 {
                    break 'compute;
                }
                let relative_velocity = target_velocity.linear - nav.velocity;
                let los = relative_position / range_squared.sqrt();
                let closing_velocity = -relative_velocity.dot(&los);

                // LOS rotation rate: ω = (r × ṙ) / |r|².
                let los_rate = relative_position.cross(&relative_velocity) / range_squared;

                acceleration = match guidance.law {
                    GuidanceLaw::ProportionalNavigation => {
                        if closing_velocity < 0.0 {
                            break 'compute;
                        }
                        guidance.navigation_constant * closing_velocity * los_rate.cross(&los)
                    }
                    GuidanceLaw::AugmentedProportionalNavigation => {
                        if closing_velocity < 0.0 {
                            break 'compute;
                        }
                        let target_acceleration = accumulators
                            .get(target)
                            .map_or(Vec3::zeros(), |a| a.last_linear_acceleration);
                        guidance.navigation_constant * closing_velocity * los_rate.cross(&los)
                            + (guidance.navigation_constant / 2.0) * target_acceleration
                    }
                    GuidanceLaw::PurePursuit => {
                        // Lateral command that rotates the velocity vector
                        // onto the line of sight.
                        let speed = nav.velocity.norm();
                        if speed < 1e-6 {
                            break 'compute;
                        }
                        let velocity_dir = nav.velocity / speed;
                        let lateral = los - velocity_dir * los.dot(&velocity_dir);
                        match lateral.try_normalize(1e-9) {
                            Some(lateral_dir) => {
                                guidance.navigation_constant
                                    * speed
                                    * los_rate.norm()
                                    * lateral_dir
                            }
                            // Velocity already on the LOS.
                            None => Vec3::zeros(),
                        }
                    }
                };
            }

            command.acceleration_g = acceleration / G0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strike_ecs::Entity;

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry.register::<Transform>();
        registry.register::<Velocity>();
        registry.register::<ForceAccumulator>();
        registry.register::<AutopilotCommand>();
        registry.register::<NavigationState>();
        registry.register::<Guidance>();
        registry.register::<Seeker>();
        registry
    }

    fn spawn_missile(
        registry: &Registry,
        position: Vec3,
        velocity: Vec3,
        law: GuidanceLaw,
    ) -> Entity {
        let missile = registry.create();
        registry.add(
            missile,
            Transform {
                position,
                ..Default::default()
            },
        );
        registry.add(
            missile,
            Velocity {
                linear: velocity,
                ..Default::default()
            },
        );
        registry.add(missile, AutopilotCommand::default());
        registry.add(
            missile,
            NavigationState {
                position,
                velocity,
                initialized: true,
                ..Default::default()
            },
        );
        registry.add(
            missile,
            Guidance {
                law,
                navigation_constant: 4.0,
                ..Default::default()
            },
        );
        registry.add(missile, Seeker::default());
        missile
    }

    fn spawn_target(registry: &Registry, position: Vec3, velocity: Vec3) -> Entity {
        let target = registry.create();
        registry.add(
            target,
            Transform {
                position,
                ..Default::default()
            },
        );
        registry.add(
            target,
            Velocity {
                linear: velocity,
                ..Default::default()
            },
        );
        target
    }

    fn lock(registry: &Registry, missile: Entity, target: Entity) {
        let mut seekers = registry.write::<Seeker>();
        let seeker = seekers.get_mut(missile).unwrap();
        seeker.has_lock = true;
        seeker.locked_target = target;
    }

    #[test]
    fn pn_first_tick_matches_closed_form() {
        let registry = registry();
        // Head-on closing geometry with an initial lateral offset.
        let missile = spawn_missile(
            &registry,
            Vec3::zeros(),
            Vec3::new(500.0, 0.0, 0.0),
            GuidanceLaw::ProportionalNavigation,
        );
        let target = spawn_target(
            &registry,
            Vec3::new(5_000.0, 500.0, 0.0),
            Vec3::new(-200.0, 0.0, 0.0),
        );
        lock(&registry, missile, target);

        GuidanceSystem.update(&registry, 0.01);

        // Closed form: |a| = N · Vc · |ω|, in g.
        let r = Vec3::new(5_000.0, 500.0, 0.0);
        let v_rel = Vec3::new(-700.0, 0.0, 0.0);
        let los = r / r.norm();
        let closing = -v_rel.dot(&los);
        let omega = r.cross(&v_rel) / r.norm_squared();
        let expected_g = 4.0 * closing * omega.norm() / G0;

        let commands = registry.read::<AutopilotCommand>();
        let magnitude = commands.get(missile).unwrap().acceleration_g.norm();
        assert!(
            (magnitude - expected_g).abs() < 1e-6,
            "PN magnitude {magnitude} g, expected {expected_g} g"
        );
    }

    #[test]
    fn no_lock_means_zero_command() {
        let registry = registry();
        let missile = spawn_missile(
            &registry,
            Vec3::zeros(),
            Vec3::new(500.0, 0.0, 0.0),
            GuidanceLaw::ProportionalNavigation,
        );
        spawn_target(&registry, Vec3::new(5_000.0, 0.0, 0.0), Vec3::zeros());
        // Seeker left without a lock.
        GuidanceSystem.update(&registry, 0.01);
        let commands = registry.read::<AutopilotCommand>();
        assert_eq!(commands.get(missile).unwrap().acceleration_g, Vec3::zeros());
    }

    #[test]
    fn dead_target_reads_as_no_lock() {
        let registry = registry();
        let missile = spawn_missile(
            &registry,
            Vec3::zeros(),
            Vec3::new(500.0, 0.0, 0.0),
            GuidanceLaw::ProportionalNavigation,
        );
        let target = spawn_target(&registry, Vec3::new(5_000.0, 0.0, 0.0), Vec3::zeros());
        lock(&registry, missile, target);
        registry.destroy(target);

        GuidanceSystem.update(&registry, 0.01);

        let commands = registry.read::<AutopilotCommand>();
        assert_eq!(commands.get(missile).unwrap().acceleration_g, Vec3::zeros());
    }

    #[test]
    fn opening_geometry_commands_nothing() {
        let registry = registry();
        // Target running away faster than the missile flies.
        let missile = spawn_missile(
            &registry,
            Vec3::zeros(),
            Vec3::new(100.0, 0.0, 0.0),
            GuidanceLaw::ProportionalNavigation,
        );
        let target = spawn_target(
            &registry,
            Vec3::new(5_000.0, 0.0, 0.0),
            Vec3::new(500.0, 0.0, 0.0),
        );
        lock(&registry, missile, target);

        GuidanceSystem.update(&registry, 0.01);

        let commands = registry.read::<AutopilotCommand>();
        assert_eq!(commands.get(missile).unwrap().acceleration_g, Vec3::zeros());
    }

    #[test]
    fn apn_adds_half_n_times_target_acceleration() {
        let registry = registry();
        let missile = spawn_missile(
            &registry,
            Vec3::zeros(),
            Vec3::new(500.0, 0.0, 0.0),
            GuidanceLaw::AugmentedProportionalNavigation,
        );
        let target = spawn_target(
            &registry,
            Vec3::new(5_000.0, 0.0, 0.0),
            Vec3::new(-200.0, 0.0, 0.0),
        );
        // A maneuvering target pulls 30 m/s² laterally.
        registry.add(
            target,
            ForceAccumulator {
                last_linear_acceleration: Vec3::new(0.0, 30.0, 0.0),
                ..Default::default()
            },
        );
        lock(&registry, missile, target);

        GuidanceSystem.update(&registry, 0.01);

        // Dead-ahead geometry: ω = 0, so the whole command is the
        // augmentation term N/2 · a_t.
        let commands = registry.read::<AutopilotCommand>();
        let command = commands.get(missile).unwrap().acceleration_g * G0;
        assert!((command - Vec3::new(0.0, 60.0, 0.0)).norm() < 1e-9);
    }

    #[test]
    fn pure_pursuit_steers_toward_the_los() {
        let registry = registry();
        let missile = spawn_missile(
            &registry,
            Vec3::zeros(),
            Vec3::new(500.0, 0.0, 0.0),
            GuidanceLaw::PurePursuit,
        );
        // Target off to the side, crossing.
        let target = spawn_target(
            &registry,
            Vec3::new(5_000.0, 2_000.0, 0.0),
            Vec3::new(0.0, -100.0, 0.0),
        );
        lock(&registry, missile, target);

        GuidanceSystem.update(&registry, 0.01);

        let commands = registry.read::<AutopilotCommand>();
        let command = commands.get(missile).unwrap().acceleration_g;
        // The command must pull the velocity vector toward +Y (where the
        // LOS points) and carry no component along the velocity.
        assert!(command.y > 0.0, "expected +Y steering, got {command:?}");
        assert!(command.x.abs() < 1e-9);
    }
}
