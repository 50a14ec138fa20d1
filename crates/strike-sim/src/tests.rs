//! Integration tests: full-engine scenarios and cross-system properties.

use std::sync::Arc;

use strike_core::components::{
    AutopilotCommand, ForceAccumulator, Fuze, Gps, Guidance, Imu, Inertia, Mass, NavigationState,
    Propulsion, PropulsionStage, Seeker, Transform, Velocity, Warhead,
};
use strike_core::constants::{EARTH_RADIUS_M, G0};
use strike_core::enums::GpsFusion;
use strike_core::Vec3;
use strike_ecs::{Entity, Registry};

use crate::atmosphere::testing::synthetic_table;
use crate::engine::{register_components, Engine, EngineConfig};
use crate::graph::System;
use crate::systems::{GuidanceSystem, IntegrationSystem, NavigationSystem};

fn test_engine(seed: u64) -> Engine {
    let config = EngineConfig {
        seed,
        workers: 2,
        ..Default::default()
    };
    Engine::with_atmosphere(config, Arc::new(synthetic_table())).expect("engine builds")
}

fn add_rigid_body(
    registry: &Registry,
    position: Vec3,
    velocity: Vec3,
    mass_kg: f64,
) -> Entity {
    let body = registry.create();
    registry.add(
        body,
        Transform {
            position,
            ..Default::default()
        },
    );
    registry.add(
        body,
        Velocity {
            linear: velocity,
            ..Default::default()
        },
    );
    registry.add(body, Mass::new(mass_kg, mass_kg));
    registry.add(body, Inertia::default());
    registry.add(body, ForceAccumulator::default());
    body
}

// ---- Scenario: ballistic fall ----

#[test]
fn ballistic_fall_reaches_local_g_in_one_second() {
    let mut engine = test_engine(1);
    let body = add_rigid_body(
        engine.registry(),
        Vec3::new(EARTH_RADIUS_M + 100.0, 0.0, 0.0),
        Vec3::zeros(),
        10.0,
    );

    engine.run(1.0, 0.01);

    let velocities = engine.registry().read::<Velocity>();
    let velocity = velocities.get(body).unwrap().linear;
    // Falling radially inward: velocity along -X.
    let radial_speed = -velocity.x;
    assert!(
        (radial_speed - 9.82).abs() < 0.05,
        "radial speed after 1 s was {radial_speed} m/s"
    );
    assert!(velocity.y.abs() < 1e-9);
}

// ---- Scenario: boost phase ----

#[test]
fn boost_phase_burns_the_expected_propellant() {
    let mut engine = test_engine(1);
    // Launch radially outward from the surface so point-mass gravity stays
    // at its familiar magnitude.
    let missile = add_rigid_body(
        engine.registry(),
        Vec3::new(EARTH_RADIUS_M, 0.0, 0.0),
        Vec3::zeros(),
        100.0,
    );
    engine.registry().add(
        missile,
        Propulsion {
            stages: vec![PropulsionStage {
                name: "boost".into(),
                stage_mass_kg: 0.0,
                thrust_curve: vec![(0.0, 10_000.0), (5.0, 10_000.0)],
                isp_sea_level_s: 250.0,
                isp_vacuum_s: 250.0,
                burn_time_s: 5.0,
            }],
            current_stage: 0,
            time_in_stage_s: 0.0,
            active: true,
        },
    );
    {
        let mut masses = engine.registry().write::<Mass>();
        let mass = masses.get_mut(missile).unwrap();
        mass.dry_kg = 50.0;
    }

    engine.run(5.1, 0.01);

    let expected = 100.0 - 10_000.0 / (250.0 * G0) * 5.0; // ≈ 79.6 kg
    let mass = engine.registry().read::<Mass>().get(missile).unwrap().current_kg;
    assert!(
        (mass - expected).abs() < 0.15,
        "post-burn mass {mass} kg, expected ≈ {expected}"
    );
    // Thrust actually moved the missile off the pad.
    let position = engine.registry().read::<Transform>().get(missile).unwrap().position;
    assert!(position.x - EARTH_RADIUS_M > 500.0);
}

// ---- Scenario: PN intercept ----

#[test]
fn pn_intercept_closes_below_five_meters() {
    let mut registry = Registry::new();
    register_components(&mut registry);

    let missile = add_rigid_body(&registry, Vec3::zeros(), Vec3::new(500.0, 0.0, 0.0), 10.0);
    registry.add(missile, AutopilotCommand::default());
    registry.add(missile, NavigationState::default());
    registry.add(
        missile,
        Guidance {
            navigation_constant: 4.0,
            ..Default::default()
        },
    );
    let target = add_rigid_body(
        &registry,
        Vec3::new(5_000.0, 500.0, 0.0),
        Vec3::new(200.0, 0.0, 0.0),
        500.0,
    );
    registry.add(
        missile,
        Seeker {
            has_lock: true,
            locked_target: target,
            is_active: true,
            max_range_m: 1e9,
            ..Default::default()
        },
    );

    let dt = 0.01;
    let mut min_range = f64::MAX;

    for _ in 0..3_000 {
        // Perfect INS for this closed-loop check: the estimate mirrors
        // ground truth every tick.
        {
            let transforms = registry.read::<Transform>();
            let velocities = registry.read::<Velocity>();
            let mut navs = registry.write::<NavigationState>();
            let nav = navs.get_mut(missile).unwrap();
            nav.position = transforms.get(missile).unwrap().position;
            nav.velocity = velocities.get(missile).unwrap().linear;
            nav.initialized = true;
        }

        GuidanceSystem.update(&registry, dt);

        // The airframe answers the command exactly: commanded acceleration
        // becomes force on the accumulator.
        {
            let commands = registry.read::<AutopilotCommand>();
            let command_g = commands.get(missile).unwrap().acceleration_g;
            let mass = registry.read::<Mass>().get(missile).unwrap().current_kg;
            registry
                .write::<ForceAccumulator>()
                .get_mut(missile)
                .unwrap()
                .add_force(command_g * G0 * mass);
        }

        IntegrationSystem.update(&registry, dt);

        let transforms = registry.read::<Transform>();
        let range = (transforms.get(missile).unwrap().position
            - transforms.get(target).unwrap().position)
            .norm();
        min_range = min_range.min(range);
        if range < 1.0 {
            break;
        }
    }

    assert!(
        min_range < 5.0,
        "PN failed to intercept: minimum range {min_range} m"
    );
}

// ---- Scenario: GPS fusion bounds INS drift ----

#[test]
fn gps_fusion_bounds_the_biased_ins_drift() {
    let drift_after_100_s = |gps: bool| {
        let mut registry = Registry::new();
        register_components(&mut registry);

        let vehicle = registry.create();
        registry.add(vehicle, Transform::default());
        registry.add(
            vehicle,
            Velocity {
                linear: Vec3::new(100.0, 0.0, 0.0),
                ..Default::default()
            },
        );
        registry.add(vehicle, ForceAccumulator::default());
        registry.add(vehicle, NavigationState::default());
        registry.add(
            vehicle,
            Imu {
                gyro_bias_deg_per_hr: 0.0,
                gyro_noise_deg_per_sqrt_hr: 0.0,
                accel_bias_milli_g: 0.1 / G0 * 1000.0, // 0.1 m/s²
                accel_noise_g_per_sqrt_hz: 0.0,
            },
        );
        if gps {
            registry.add(
                vehicle,
                Gps {
                    update_rate_hz: 1.0,
                    position_error_m: 3.0,
                    time_since_fix_s: 0.0,
                },
            );
        }

        let navigation = NavigationSystem::new(GpsFusion::Kalman, 9);
        let dt = 0.1;
        navigation.update(&registry, dt); // initialization tick
        for _ in 0..1_000 {
            // Truth coasts at constant velocity.
            {
                let mut transforms = registry.write::<Transform>();
                let transform = transforms.get_mut(vehicle).unwrap();
                transform.position += Vec3::new(100.0, 0.0, 0.0) * dt;
            }
            navigation.update(&registry, dt);
        }

        let truth = registry.read::<Transform>().get(vehicle).unwrap().position;
        let estimate = registry
            .read::<NavigationState>()
            .get(vehicle)
            .unwrap()
            .position;
        (estimate - truth).norm()
    };

    let free_inertial = drift_after_100_s(false);
    let aided = drift_after_100_s(true);

    // 0.1 m/s² of bias integrates to ≈ 500 m over 100 s unaided.
    assert!(
        (free_inertial - 500.0).abs() / 500.0 < 0.05,
        "free-inertial drift was {free_inertial} m"
    );
    // Kalman-aided drift stays within a handful of GPS sigmas.
    assert!(
        aided < 50.0,
        "aided drift {aided} m is not O(σ) for σ = 3 m"
    );
}

// ---- Engine-level behavior ----

#[test]
fn stage_layout_orders_producers_before_consumers() {
    let engine = test_engine(1);
    let stages = engine.stage_names();

    let position = |name: &str| {
        stages
            .iter()
            .position(|stage| stage.contains(&name))
            .unwrap_or_else(|| panic!("system {name} missing from plan"))
    };

    // Jamming precedes sensing; the GNC chain is ordered; every force
    // producer precedes integration; endgame is last and alone.
    assert!(position("electronic-warfare") < position("sensor"));
    assert!(position("navigation") < position("guidance"));
    assert!(position("sensor") < position("guidance"));
    assert!(position("guidance") < position("control"));
    assert!(position("control") < position("aerodynamics"));
    assert!(position("gravity") < position("propulsion"));
    assert!(position("gravity") < position("integration"));
    assert!(position("propulsion") < position("integration"));
    assert!(position("aerodynamics") < position("integration"));
    assert!(position("integration") < position("endgame"));
    assert_eq!(stages.last().unwrap(), &vec!["endgame"]);
}

#[test]
fn same_seed_reproduces_noisy_runs_exactly() {
    let run = |seed: u64| {
        let mut engine = test_engine(seed);
        let missile = add_rigid_body(
            engine.registry(),
            Vec3::new(EARTH_RADIUS_M, 1_000.0, 0.0),
            Vec3::new(0.0, 300.0, 0.0),
            50.0,
        );
        engine.registry().add(missile, NavigationState::default());
        engine.registry().add(missile, Imu::default());
        engine.registry().add(missile, Gps::default());

        for _ in 0..200 {
            engine.update(0.01);
        }

        let states = engine.registry().read::<NavigationState>();
        let nav = states.get(missile).unwrap();
        (nav.position, nav.velocity)
    };

    assert_eq!(run(1234), run(1234), "same seed must replay identically");
    assert_ne!(run(1234), run(5678), "different seeds must diverge");
}

#[test]
fn endgame_destroys_through_the_full_tick() {
    let mut engine = test_engine(1);
    let registry = engine.registry();

    let target = add_rigid_body(
        registry,
        Vec3::new(EARTH_RADIUS_M + 3.0, 0.0, 0.0),
        Vec3::zeros(),
        100.0,
    );
    let missile = add_rigid_body(
        registry,
        Vec3::new(EARTH_RADIUS_M, 0.0, 0.0),
        Vec3::zeros(),
        10.0,
    );
    registry.add(
        missile,
        Seeker {
            has_lock: true,
            locked_target: target,
            is_active: false, // keep the sensor from rescanning
            ..Default::default()
        },
    );
    registry.add(
        missile,
        Fuze {
            trigger_distance_m: 5.0,
            ..Default::default()
        },
    );
    registry.add(
        missile,
        Warhead {
            lethal_radius_m: 10.0,
            ..Default::default()
        },
    );

    engine.update(0.01);

    assert!(!engine.registry().is_alive(target));
    assert!(!engine.registry().is_alive(missile));
}

#[test]
fn run_terminates_when_the_engagement_ends() {
    let mut engine = test_engine(1);
    let registry = engine.registry();

    let target = add_rigid_body(
        registry,
        Vec3::new(EARTH_RADIUS_M + 3.0, 0.0, 0.0),
        Vec3::zeros(),
        100.0,
    );
    let missile = add_rigid_body(
        registry,
        Vec3::new(EARTH_RADIUS_M, 0.0, 0.0),
        Vec3::zeros(),
        10.0,
    );
    registry.add(missile, Guidance::default());
    registry.add(
        missile,
        Seeker {
            has_lock: true,
            locked_target: target,
            is_active: false,
            ..Default::default()
        },
    );
    registry.add(missile, Fuze::default());
    registry.add(missile, Warhead::default());
    registry.add(missile, AutopilotCommand::default());
    registry.add(missile, NavigationState::default());

    // A nominal hour of simulated time; the endgame fires on tick one and
    // the loop must stop immediately after.
    engine.run(3_600.0, 0.01);

    assert!(engine.time().elapsed_s < 1.0, "run failed to stop early");
    assert_eq!(engine.guided_remaining(), 0);
}

// ---- Scenario and profile loading ----

#[test]
fn scenario_round_trip_spawns_and_wires_the_engagement() {
    use std::fs;

    let dir = tempfile::tempdir().unwrap();
    let missile_profile = dir.path().join("missile.json");
    fs::write(
        &missile_profile,
        r#"{
            "name": "Test Interceptor",
            "simulation": {
                "components_to_add": [
                    "transform", "velocity", "mass", "inertia",
                    "force_accumulator", "navigation_state", "imu", "gps",
                    "guidance", "seeker", "antenna", "autopilot_command",
                    "autopilot_state", "control_surfaces", "fuze", "warhead"
                ]
            },
            "initial_state": {
                "transform": { "position": [0.0, 100.0, 0.0] },
                "velocity": { "linear": [450.0, 0.0, 0.0] }
            },
            "mass_properties": { "initial_kg": 150.0, "dry_kg": 90.0 },
            "guidance": { "law": "ProportionalNavigation", "navigation_constant": 4.0 },
            "seeker": {
                "type": "RF",
                "field_of_view_deg": 20.0,
                "gimbal_limit_deg": 60.0,
                "max_range_m": 40000.0
            },
            "autopilot": { "kp": 0.8, "ki": 0.2, "kd": 0.1, "max_deflection_deg": 25.0 },
            "fuze": { "trigger_distance_m": 8.0 },
            "warhead": { "lethal_radius_m": 12.0 }
        }"#,
    )
    .unwrap();

    let target_profile = dir.path().join("target.json");
    fs::write(
        &target_profile,
        r#"{
            "name": "Test Target",
            "simulation": {
                "components_to_add": [
                    "transform", "velocity", "mass", "inertia",
                    "force_accumulator", "target_signature", "rcs_profile"
                ]
            },
            "initial_state": {
                "transform": { "position": [20000.0, 4000.0, 0.0] },
                "velocity": { "linear": [-250.0, 0.0, 0.0] }
            },
            "mass_properties": { "initial_kg": 9000.0, "dry_kg": 9000.0 },
            "target_signature": { "rcs_m2": 5.0 },
            "rcs_profile": { "profile_path": "data/rcs/fighter_generic.json" }
        }"#,
    )
    .unwrap();

    let scenario_path = dir.path().join("scenario.json");
    fs::write(
        &scenario_path,
        format!(
            r#"{{
                "simulation": {{ "duration_s": 30.0, "time_step_hz": 100.0 }},
                "entities": [
                    {{ "name": "interceptor", "profile": {missile:?} }},
                    {{ "name": "bandit", "profile": {target:?} }}
                ],
                "engagement": {{ "shooter": "interceptor", "target": "bandit" }}
            }}"#,
            missile = missile_profile,
            target = target_profile,
        ),
    )
    .unwrap();

    let scenario = crate::scenario::Scenario::load(&scenario_path).unwrap();
    assert_eq!(scenario.simulation.duration_s, 30.0);
    assert!((scenario.dt() - 0.01).abs() < 1e-12);

    let engine = test_engine(1);
    let loaded = crate::scenario::instantiate(&engine, &scenario).unwrap();
    assert_eq!(loaded.entities.len(), 2);

    let registry = engine.registry();
    // The shooter's guidance now designates the target entity.
    let guidances = registry.read::<Guidance>();
    assert_eq!(guidances.get(loaded.shooter).unwrap().target, loaded.target);
    // Profile values landed in the components.
    let masses = registry.read::<Mass>();
    assert_eq!(masses.get(loaded.shooter).unwrap().current_kg, 150.0);
    let seekers = registry.read::<Seeker>();
    assert!(seekers.get(loaded.shooter).unwrap().is_active);
    assert_eq!(seekers.get(loaded.shooter).unwrap().max_range_m, 40_000.0);
    // Scalar autopilot gains became uniform schedules.
    let states = registry.read::<strike_core::components::AutopilotState>();
    assert_eq!(states.get(loaded.shooter).unwrap().kp.lookup(2.0, 5e4), 0.8);
    let fins = registry.read::<strike_core::components::ControlSurface>();
    assert!(
        (fins.get(loaded.shooter).unwrap().max_deflection_rad - 25f64.to_radians()).abs() < 1e-12
    );
}

#[test]
fn missing_profile_section_is_a_load_error() {
    use std::fs;

    let dir = tempfile::tempdir().unwrap();
    let profile = dir.path().join("broken.json");
    fs::write(
        &profile,
        r#"{
            "name": "Broken",
            "simulation": { "components_to_add": ["mass"] }
        }"#,
    )
    .unwrap();

    let engine = test_engine(1);
    let result = engine.spawn_profile(&profile);
    assert!(matches!(
        result,
        Err(crate::error::SimError::MissingProfileSection { .. })
    ));
}

#[test]
fn countermeasure_decoys_appear_at_the_tick_boundary() {
    use strike_core::components::{CountermeasureDispenser, RcsProfile};

    let mut engine = test_engine(1);
    let aircraft = add_rigid_body(
        engine.registry(),
        Vec3::new(EARTH_RADIUS_M, 5_000.0, 0.0),
        Vec3::new(0.0, 200.0, 0.0),
        8_000.0,
    );
    engine.registry().add(
        aircraft,
        CountermeasureDispenser {
            chaff_count: 4,
            flare_count: 4,
            deploy_chaff: true,
            deploy_flare: false,
        },
    );

    assert_eq!(engine.registry().read::<RcsProfile>().len(), 0);
    engine.update(0.01);

    // The chaff cloud exists as a real entity after the tick, carrying the
    // generic decoy signature at the dispenser's position.
    let registry = engine.registry();
    let rcs = registry.read::<RcsProfile>();
    assert_eq!(rcs.len(), 1);
    let (cloud, profile) = rcs.iter().next().unwrap();
    assert_eq!(profile.profile_path, strike_core::constants::CHAFF_RCS_PROFILE);
    assert!(registry.is_alive(cloud));
    let dispensers = registry.read::<CountermeasureDispenser>();
    assert_eq!(dispensers.get(aircraft).unwrap().chaff_count, 3);
}
