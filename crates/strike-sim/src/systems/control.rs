//! Gain-scheduled PID autopilot driving the control surfaces.
//!
//! Gains are looked up over the (Mach, dynamic pressure) envelope, the
//! commanded and measured accelerations are rotated into the body frame,
//! and per-axis PID outputs become fin deflections limited in two stages:
//! position clamp, then slew rate against the previous tick's deflection.

use std::sync::Arc;

use strike_core::components::{
    AutopilotCommand, AutopilotState, ControlSurface, NavigationState, Transform, Velocity,
};
use strike_core::constants::G0;
use strike_ecs::Registry;

use crate::atmosphere::AtmosphereTable;
use crate::graph::System;

pub struct ControlSystem {
    atmosphere: Arc<AtmosphereTable>,
}

impl ControlSystem {
    pub fn new(atmosphere: Arc<AtmosphereTable>) -> Self {
        Self { atmosphere }
    }
}

impl System for ControlSystem {
    fn name(&self) -> &'static str {
        "control"
    }

    fn update(&self, registry: &Registry, dt: f64) {
        if dt <= f64::EPSILON {
            return;
        }

        let transforms = registry.read::<Transform>();
        let velocities = registry.read::<Velocity>();
        let mut fins_pool = registry.write::<ControlSurface>();
        let commands = registry.read::<AutopilotCommand>();
        let mut states = registry.write::<AutopilotState>();
        let nav_states = registry.read::<NavigationState>();

        for (entity, state) in states.iter_mut() {
            let Some(command) = commands.get(entity) else {
                continue;
            };
            let Some(fins) = fins_pool.get_mut(entity) else {
                continue;
            };
            let Some(nav) = nav_states.get(entity) else {
                continue;
            };
            let Some(transform) = transforms.get(entity) else {
                continue;
            };
            let Some(velocity) = velocities.get(entity) else {
                continue;
            };

            // Flight condition for the gain schedules.
            let altitude = transform.position.norm();
            let atmosphere = self.atmosphere.properties(altitude);
            let speed = velocity.linear.norm();
            let dynamic_pressure = 0.5 * atmosphere.density * speed * speed;
            let mach = if atmosphere.speed_of_sound > 0.0 {
                speed / atmosphere.speed_of_sound
            } else {
                0.0
            };

            let kp = state.kp.lookup(mach, dynamic_pressure);
            let ki = state.ki.lookup(mach, dynamic_pressure);
            let kd = state.kd.lookup(mach, dynamic_pressure);

            // The guidance command is world-frame; the autopilot works in
            // the missile's pitch/yaw axes.
            let inverse_attitude = transform.orientation.inverse();
            let commanded_body = inverse_attitude * (command.acceleration_g * G0);
            let measured_body = inverse_attitude * nav.acceleration;

            // Pitch: vertical acceleration error, body Y.
            let pitch_error = commanded_body.y - measured_body.y;
            state.pitch.integral += pitch_error * dt;
            let pitch_derivative = (pitch_error - state.pitch.previous_error) / dt;
            let pitch_output =
                kp * pitch_error + ki * state.pitch.integral + kd * pitch_derivative;
            state.pitch.previous_error = pitch_error;

            // Yaw: lateral acceleration error, body Z.
            let yaw_error = commanded_body.z - measured_body.z;
            state.yaw.integral += yaw_error * dt;
            let yaw_derivative = (yaw_error - state.yaw.previous_error) / dt;
            let yaw_output = kp * yaw_error + ki * state.yaw.integral + kd * yaw_derivative;
            state.yaw.previous_error = yaw_error;

            // Actuator limits: position clamp first, then slew rate.
            let clamp = fins.max_deflection_rad;
            let desired_pitch = pitch_output.clamp(-clamp, clamp);
            let desired_yaw = yaw_output.clamp(-clamp, clamp);

            let max_step = fins.max_rate_rad_s * dt;
            fins.pitch_rad =
                desired_pitch.clamp(fins.pitch_rad - max_step, fins.pitch_rad + max_step);
            fins.yaw_rad = desired_yaw.clamp(fins.yaw_rad - max_step, fins.yaw_rad + max_step);
        }
    }
}
