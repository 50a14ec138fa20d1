//! Inertial navigation with GPS fusion.
//!
//! Each tick the system synthesizes noisy IMU measurements from ground
//! truth, propagates the entity's estimated state, and — when a GPS fix
//! arrives — folds the measured position back in, either by naive
//! replacement or through a 6-state [position, velocity] Kalman filter.
//!
//! The accelerometer reads the acceleration the integrator applied on the
//! previous tick (`ForceAccumulator::last_linear_acceleration`), which keeps
//! this system runnable in the same stage as the force producers.
//!
//! All randomness comes from one seeded generator owned by the system, so a
//! fixed seed reproduces a run exactly.

use std::sync::Mutex;

use nalgebra::{Matrix3, Matrix3x6, Matrix6, Matrix6x3, Unit, Vector6};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use strike_core::components::{
    ForceAccumulator, Gps, Imu, NavigationState, Transform, Velocity,
};
use strike_core::constants::G0;
use strike_core::enums::GpsFusion;
use strike_core::{Quat, Vec3};
use strike_ecs::Registry;

use crate::graph::System;

/// Process-noise variance of the constant-acceleration model.
const PROCESS_NOISE_VARIANCE: f64 = 0.1;

/// Mixed into the engine seed so this system draws an independent stream.
pub const SEED_SALT: u64 = 0x4e41_5649_4741_5445;

pub struct NavigationSystem {
    fusion: GpsFusion,
    rng: Mutex<ChaCha8Rng>,
}

impl NavigationSystem {
    pub fn new(fusion: GpsFusion, seed: u64) -> Self {
        Self {
            fusion,
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed ^ SEED_SALT)),
        }
    }
}

fn gaussian_vec(rng: &mut ChaCha8Rng, sigma: f64) -> Vec3 {
    if sigma <= 0.0 {
        return Vec3::zeros();
    }
    match Normal::new(0.0, sigma) {
        Ok(normal) => Vec3::new(
            normal.sample(rng),
            normal.sample(rng),
            normal.sample(rng),
        ),
        Err(_) => Vec3::zeros(),
    }
}

impl System for NavigationSystem {
    fn name(&self) -> &'static str {
        "navigation"
    }

    fn update(&self, registry: &Registry, dt: f64) {
        if dt <= f64::EPSILON {
            return;
        }

        let transforms = registry.read::<Transform>();
        let velocities = registry.read::<Velocity>();
        let accumulators = registry.read::<ForceAccumulator>();
        let mut states = registry.write::<NavigationState>();
        let imus = registry.read::<Imu>();
        let mut gps_pool = registry.write::<Gps>();

        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());

        for (entity, nav) in states.iter_mut() {
            let Some(imu) = imus.get(entity) else {
                continue;
            };
            let Some(transform) = transforms.get(entity) else {
                continue;
            };
            let Some(velocity) = velocities.get(entity) else {
                continue;
            };
            let Some(accumulator) = accumulators.get(entity) else {
                continue;
            };

            // First tick: align the estimate with ground truth.
            if !nav.initialized {
                nav.position = transform.position;
                nav.velocity = velocity.linear;
                nav.orientation = transform.orientation;
                nav.acceleration = Vec3::zeros();
                nav.covariance = Matrix6::identity();
                nav.initialized = true;
                continue;
            }

            // --- Accelerometer: truth in body frame + bias + noise ---
            let truth_body =
                transform.orientation.inverse() * accumulator.last_linear_acceleration;
            let accel_sigma = imu.accel_noise_g_per_sqrt_hz * G0 / dt.sqrt();
            let accel_bias = Vec3::repeat(imu.accel_bias_milli_g / 1000.0 * G0);
            let measured_body = truth_body + accel_bias + gaussian_vec(&mut rng, accel_sigma);

            // The estimate only has its own attitude to resolve the body
            // measurement into the world frame.
            let accel_world = nav.orientation * measured_body;

            // --- Gyro: body rate + bias + noise, attitude propagation ---
            let gyro_sigma = imu.gyro_noise_deg_per_sqrt_hr.to_radians() / 60.0 / dt.sqrt();
            let gyro_bias = Vec3::repeat(imu.gyro_bias_deg_per_hr.to_radians() / 3600.0);
            let measured_rate = velocity.angular + gyro_bias + gaussian_vec(&mut rng, gyro_sigma);

            let angle = measured_rate.norm() * dt;
            if angle > 1e-12 {
                let axis = Unit::new_normalize(measured_rate);
                let delta = Quat::from_axis_angle(&axis, angle);
                nav.orientation =
                    Quat::new_normalize(delta.into_inner() * nav.orientation.into_inner());
            }

            predict(nav, dt, accel_world);

            // --- GPS fix, when the receiver's cadence allows one ---
            if let Some(gps) = gps_pool.get_mut(entity) {
                gps.time_since_fix_s += dt;
                if gps.update_rate_hz > 0.0 && gps.time_since_fix_s >= 1.0 / gps.update_rate_hz {
                    gps.time_since_fix_s = 0.0;
                    let measured_position =
                        transform.position + gaussian_vec(&mut rng, gps.position_error_m);
                    match self.fusion {
                        GpsFusion::Replace => nav.position = measured_position,
                        GpsFusion::Kalman => {
                            fuse(nav, measured_position, gps.position_error_m);
                        }
                    }
                }
            }

            nav.acceleration = accel_world;
        }
    }
}

fn state_vector(nav: &NavigationState) -> Vector6<f64> {
    Vector6::new(
        nav.position.x,
        nav.position.y,
        nav.position.z,
        nav.velocity.x,
        nav.velocity.y,
        nav.velocity.z,
    )
}

fn store_state(nav: &mut NavigationState, x: Vector6<f64>) {
    nav.position = Vec3::new(x[0], x[1], x[2]);
    nav.velocity = Vec3::new(x[3], x[4], x[5]);
}

/// Kalman predict: x' = F x + u, P' = F P Fᵀ + Q, with the measured
/// acceleration as control input.
fn predict(nav: &mut NavigationState, dt: f64, acceleration: Vec3) {
    let mut f = Matrix6::<f64>::identity();
    f[(0, 3)] = dt;
    f[(1, 4)] = dt;
    f[(2, 5)] = dt;

    let half_dt2 = 0.5 * dt * dt;
    let u = Vector6::new(
        half_dt2 * acceleration.x,
        half_dt2 * acceleration.y,
        half_dt2 * acceleration.z,
        dt * acceleration.x,
        dt * acceleration.y,
        dt * acceleration.z,
    );

    let x = f * state_vector(nav) + u;
    store_state(nav, x);

    let dt2 = dt * dt;
    let dt3 = dt2 * dt;
    let dt4 = dt3 * dt;
    let mut q = Matrix6::<f64>::zeros();
    for axis in 0..3 {
        q[(axis, axis)] = dt4 / 4.0 * PROCESS_NOISE_VARIANCE;
        q[(axis, axis + 3)] = dt3 / 2.0 * PROCESS_NOISE_VARIANCE;
        q[(axis + 3, axis)] = dt3 / 2.0 * PROCESS_NOISE_VARIANCE;
        q[(axis + 3, axis + 3)] = dt2 * PROCESS_NOISE_VARIANCE;
    }

    nav.covariance = f * nav.covariance * f.transpose() + q;
}

/// Kalman measurement update against a GPS position fix.
fn fuse(nav: &mut NavigationState, measured_position: Vec3, sigma_m: f64) {
    let mut h = Matrix3x6::<f64>::zeros();
    h[(0, 0)] = 1.0;
    h[(1, 1)] = 1.0;
    h[(2, 2)] = 1.0;

    let r = Matrix3::<f64>::identity() * (sigma_m * sigma_m);

    let x = state_vector(nav);
    let innovation = measured_position - Vec3::new(x[0], x[1], x[2]);

    let s = h * nav.covariance * h.transpose() + r;
    // A singular innovation covariance is numerically degenerate; skip the
    // update for this fix rather than corrupt the state.
    let Some(s_inv) = s.try_inverse() else {
        tracing::warn!("singular innovation covariance; GPS fix dropped");
        return;
    };

    let k: Matrix6x3<f64> = nav.covariance * h.transpose() * s_inv;
    let correction = k * innovation;
    store_state(nav, x + correction);

    nav.covariance = (Matrix6::identity() - k * h) * nav.covariance;
}
