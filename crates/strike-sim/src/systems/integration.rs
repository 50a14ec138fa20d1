//! Rigid-body state integration.
//!
//! Linear state advances by classic RK4 over (position, velocity). Force
//! producers run once per tick, so the acceleration is held constant across
//! the sub-steps. Rotational state uses a body-frame Euler update with an
//! axis-angle quaternion increment, renormalized every tick.
//!
//! Runs in the final force stage: consumes the accumulator, records the
//! applied linear acceleration for the navigation and guidance systems, and
//! clears the sums for the next tick.

use nalgebra::Unit;
use strike_core::components::{ForceAccumulator, Inertia, Mass, Transform, Velocity};
use strike_core::{Quat, Vec3};
use strike_ecs::Registry;

use crate::graph::System;

/// Derivative of the linear state: dp/dt and dv/dt.
struct Deriv {
    dpos: Vec3,
    dvel: Vec3,
}

fn derive(velocity: Vec3, acceleration: Vec3) -> Deriv {
    Deriv {
        dpos: velocity,
        dvel: acceleration,
    }
}

pub struct IntegrationSystem;

impl System for IntegrationSystem {
    fn name(&self) -> &'static str {
        "integration"
    }

    fn update(&self, registry: &Registry, dt: f64) {
        registry.view5::<Transform, Velocity, Mass, Inertia, ForceAccumulator>(
            |_, transform, velocity, mass, inertia, accumulator| {
                // Static bodies never move, but their accumulator must not
                // carry forces into the next tick.
                if mass.inverse_kg <= 0.0 {
                    accumulator.last_linear_acceleration = Vec3::zeros();
                    accumulator.clear();
                    return;
                }

                let acceleration = accumulator.total_force * mass.inverse_kg;

                // --- Linear state: RK4 with tick-constant acceleration ---
                let v0 = velocity.linear;
                let k1 = derive(v0, acceleration);
                let k2 = derive(v0 + k1.dvel * (dt / 2.0), acceleration);
                let k3 = derive(v0 + k2.dvel * (dt / 2.0), acceleration);
                let k4 = derive(v0 + k3.dvel * dt, acceleration);

                transform.position +=
                    (k1.dpos + k2.dpos * 2.0 + k3.dpos * 2.0 + k4.dpos) * (dt / 6.0);
                velocity.linear +=
                    (k1.dvel + k2.dvel * 2.0 + k3.dvel * 2.0 + k4.dvel) * (dt / 6.0);

                // --- Rotational state: Euler with gyroscopic term ---
                let omega_world = transform.orientation * velocity.angular;
                let angular_acceleration_world = inertia.inverse_tensor
                    * (accumulator.total_torque
                        - omega_world.cross(&(inertia.tensor * omega_world)));
                velocity.angular +=
                    transform.orientation.inverse() * angular_acceleration_world * dt;

                let angle = velocity.angular.norm() * dt;
                if angle > 0.0 {
                    let axis = Unit::new_normalize(velocity.angular);
                    let delta = Quat::from_axis_angle(&axis, angle);
                    transform.orientation = Quat::new_normalize(
                        delta.into_inner() * transform.orientation.into_inner(),
                    );
                }

                accumulator.last_linear_acceleration = acceleration;
                accumulator.clear();
            },
        );
    }
}
