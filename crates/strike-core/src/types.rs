//! Fundamental geometric and simulation types.

/// 3-D double-precision vector, world or body frame by context (meters,
/// m/s, m/s², N, or N·m).
pub type Vec3 = nalgebra::Vector3<f64>;

/// Unit quaternion carrying a body-to-world rotation.
pub type Quat = nalgebra::UnitQuaternion<f64>;

/// 3×3 matrix (inertia tensors and their inverses, body frame).
pub type Mat3 = nalgebra::Matrix3<f64>;

/// Simulation time tracking.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimTime {
    /// Current tick number (increments by 1 each tick).
    pub tick: u64,
    /// Elapsed simulation time in seconds.
    pub elapsed_s: f64,
}

impl SimTime {
    /// Advance by one fixed step.
    pub fn advance(&mut self, dt: f64) {
        self.tick += 1;
        self.elapsed_s += dt;
    }
}
