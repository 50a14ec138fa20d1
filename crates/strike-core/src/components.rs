//! ECS components.
//!
//! Components are plain data structs; the only methods are small invariant
//! helpers (cached inverses, accumulator clearing). Behavior lives in the
//! systems of `strike-sim`.

use nalgebra::Matrix6;
use serde::{Deserialize, Serialize};
use strike_ecs::Entity;

use crate::enums::{FuzeKind, GuidanceLaw, IrBand, SeekerKind, WarheadKind};
use crate::interp;
use crate::types::{Mat3, Quat, Vec3};

/// World-space pose. Written only by the integrator.
#[derive(Debug, Clone)]
pub struct Transform {
    /// Position in world frame (m), origin at the Earth's center for
    /// geocentric scenarios or at the ground for flat-earth ones.
    pub position: Vec3,
    /// Body-to-world rotation.
    pub orientation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            orientation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Body +X in world frame. Body-forward: thrust axis, seeker boresight,
    /// and the aerodynamic reference direction all use this.
    pub fn body_forward(&self) -> Vec3 {
        self.orientation * Vec3::x()
    }

    /// Body +Y in world frame (the lift-plane "up" reference).
    pub fn body_up(&self) -> Vec3 {
        self.orientation * Vec3::y()
    }
}

/// Linear velocity in world frame, angular velocity in body frame.
#[derive(Debug, Clone, Default)]
pub struct Velocity {
    /// m/s, world frame.
    pub linear: Vec3,
    /// rad/s, body frame.
    pub angular: Vec3,
}

/// Mass bookkeeping, including fuel burn-down.
#[derive(Debug, Clone)]
pub struct Mass {
    /// Launch (wet) mass in kg.
    pub initial_kg: f64,
    /// Mass with all propellant expended, kg.
    pub dry_kg: f64,
    /// Mass at the current tick, kg.
    pub current_kg: f64,
    /// Cached 1 / current_kg; 0.0 encodes an immovable body.
    pub inverse_kg: f64,
}

impl Mass {
    pub fn new(initial_kg: f64, dry_kg: f64) -> Self {
        let mut mass = Self {
            initial_kg,
            dry_kg,
            current_kg: initial_kg,
            inverse_kg: 0.0,
        };
        mass.refresh_inverse();
        mass
    }

    /// Recompute the cached inverse after `current_kg` changes.
    pub fn refresh_inverse(&mut self) {
        self.inverse_kg = if self.current_kg > 1e-9 {
            1.0 / self.current_kg
        } else {
            0.0
        };
    }
}

/// Rotational inertia in body frame (kg·m²).
#[derive(Debug, Clone)]
pub struct Inertia {
    pub tensor: Mat3,
    pub inverse_tensor: Mat3,
}

impl Default for Inertia {
    fn default() -> Self {
        Self {
            tensor: Mat3::identity(),
            inverse_tensor: Mat3::identity(),
        }
    }
}

impl Inertia {
    /// Builds the component from a tensor, caching its inverse. Singular
    /// tensors fall back to identity rather than poisoning the physics.
    pub fn from_tensor(tensor: Mat3) -> Self {
        let inverse_tensor = tensor.try_inverse().unwrap_or_else(Mat3::identity);
        Self {
            tensor,
            inverse_tensor,
        }
    }
}

/// Per-tick force and torque sums, cleared by the integrator after use.
///
/// `last_linear_acceleration` holds the linear acceleration the integrator
/// actually applied on the previous tick; it is the value an accelerometer
/// measures and the target-acceleration source for augmented PN.
#[derive(Debug, Clone, Default)]
pub struct ForceAccumulator {
    /// Vector sum of all forces this tick (N, world frame).
    pub total_force: Vec3,
    /// Vector sum of all torques this tick (N·m, world frame).
    pub total_torque: Vec3,
    /// F/m applied last tick (m/s², world frame).
    pub last_linear_acceleration: Vec3,
}

impl ForceAccumulator {
    pub fn add_force(&mut self, force: Vec3) {
        self.total_force += force;
    }

    pub fn add_torque(&mut self, torque: Vec3) {
        self.total_torque += torque;
    }

    /// Zero the per-tick sums. Leaves `last_linear_acceleration` alone.
    pub fn clear(&mut self) {
        self.total_force = Vec3::zeros();
        self.total_torque = Vec3::zeros();
    }
}

/// Link to an external aerodynamic coefficient database, plus the flight
/// condition the aerodynamics system computed this tick.
#[derive(Debug, Clone, Default)]
pub struct AerodynamicProfile {
    /// Key into the coefficient database (`data/aero/<id>.json`).
    pub profile_id: String,
    /// Reference area for force coefficients (m²).
    pub reference_area_m2: f64,
    /// Wingspan for the ground-effect model (m).
    pub wingspan_m: f64,
    /// Angle of attack, rad. State, written each tick.
    pub angle_of_attack_rad: f64,
    /// Sideslip angle, rad.
    pub sideslip_rad: f64,
    /// Mach number.
    pub mach: f64,
}

/// One burn stage of a propulsion stack.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PropulsionStage {
    pub name: String,
    /// Casing plus propellant mass dropped at separation (kg).
    pub stage_mass_kg: f64,
    /// `(time since ignition s, thrust N)` samples, piecewise-linear.
    pub thrust_curve: Vec<(f64, f64)>,
    pub isp_sea_level_s: f64,
    pub isp_vacuum_s: f64,
    pub burn_time_s: f64,
}

impl PropulsionStage {
    /// Instantaneous thrust at `t` seconds into the burn.
    pub fn thrust_at(&self, t: f64) -> f64 {
        interp::piecewise_linear(&self.thrust_curve, t)
    }
}

/// Multi-stage propulsion state.
#[derive(Debug, Clone, Default)]
pub struct Propulsion {
    pub stages: Vec<PropulsionStage>,
    pub current_stage: usize,
    pub time_in_stage_s: f64,
    pub active: bool,
}

/// Aerodynamic control surfaces (fins), actuated by the autopilot.
#[derive(Debug, Clone)]
pub struct ControlSurface {
    /// Hard deflection stop (rad).
    pub max_deflection_rad: f64,
    /// Actuator slew limit (rad/s).
    pub max_rate_rad_s: f64,
    pub pitch_rad: f64,
    pub yaw_rad: f64,
}

impl Default for ControlSurface {
    fn default() -> Self {
        Self {
            max_deflection_rad: 0.349,
            max_rate_rad_s: 5.236,
            pitch_rad: 0.0,
            yaw_rad: 0.0,
        }
    }
}

/// Guidance output: commanded acceleration in world frame, g units.
#[derive(Debug, Clone, Default)]
pub struct AutopilotCommand {
    pub acceleration_g: Vec3,
}

/// PID gain looked up over the (Mach, dynamic pressure) envelope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GainSchedule {
    pub mach_breakpoints: Vec<f64>,
    pub q_breakpoints: Vec<f64>,
    /// `table[mach][q]`.
    pub table: Vec<Vec<f64>>,
}

impl GainSchedule {
    /// A schedule that returns `gain` everywhere (scalar-gain profiles).
    pub fn uniform(gain: f64) -> Self {
        Self {
            mach_breakpoints: vec![0.0],
            q_breakpoints: vec![0.0],
            table: vec![vec![gain]],
        }
    }

    /// Bilinear gain lookup, clamped to the table edges.
    pub fn lookup(&self, mach: f64, dynamic_pressure: f64) -> f64 {
        if self.table.is_empty() || self.table[0].is_empty() {
            return 0.0;
        }
        let row = interp::bracket(&self.mach_breakpoints, mach);
        let col = interp::bracket(&self.q_breakpoints, dynamic_pressure);
        interp::bilinear(&self.table, row, col)
    }
}

/// Per-axis PID memory.
#[derive(Debug, Clone, Copy, Default)]
pub struct AxisState {
    pub integral: f64,
    pub previous_error: f64,
}

/// Autopilot gains and controller memory.
#[derive(Debug, Clone, Default)]
pub struct AutopilotState {
    pub kp: GainSchedule,
    pub ki: GainSchedule,
    pub kd: GainSchedule,
    pub pitch: AxisState,
    pub yaw: AxisState,
}

/// The entity's own estimate of its state, maintained by the navigation
/// system from noisy IMU and GPS measurements. The 6×6 covariance belongs
/// to the [position, velocity] Kalman filter.
#[derive(Debug, Clone)]
pub struct NavigationState {
    pub position: Vec3,
    pub velocity: Vec3,
    pub orientation: Quat,
    /// Latest IMU-measured acceleration, world frame (m/s²).
    pub acceleration: Vec3,
    pub covariance: Matrix6<f64>,
    pub initialized: bool,
}

impl Default for NavigationState {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            velocity: Vec3::zeros(),
            orientation: Quat::identity(),
            acceleration: Vec3::zeros(),
            covariance: Matrix6::identity(),
            initialized: false,
        }
    }
}

/// Error model of an inertial measurement unit. These parameters drive the
/// navigational drift that GPS fusion has to fight.
#[derive(Debug, Clone)]
pub struct Imu {
    pub gyro_bias_deg_per_hr: f64,
    pub gyro_noise_deg_per_sqrt_hr: f64,
    pub accel_bias_milli_g: f64,
    pub accel_noise_g_per_sqrt_hz: f64,
}

impl Default for Imu {
    fn default() -> Self {
        Self {
            gyro_bias_deg_per_hr: 0.1,
            gyro_noise_deg_per_sqrt_hr: 0.01,
            accel_bias_milli_g: 1.0,
            accel_noise_g_per_sqrt_hz: 0.001,
        }
    }
}

/// GPS receiver characteristics and fix cadence state.
#[derive(Debug, Clone)]
pub struct Gps {
    pub update_rate_hz: f64,
    /// 1σ per-axis position error (m).
    pub position_error_m: f64,
    pub time_since_fix_s: f64,
}

impl Default for Gps {
    fn default() -> Self {
        Self {
            update_rate_hz: 1.0,
            position_error_m: 3.0,
            time_since_fix_s: 0.0,
        }
    }
}

/// Guidance configuration for a shooter.
#[derive(Debug, Clone)]
pub struct Guidance {
    /// Entity this missile is assigned to intercept.
    pub target: Entity,
    pub law: GuidanceLaw,
    /// Navigation constant N.
    pub navigation_constant: f64,
    pub enabled: bool,
}

impl Default for Guidance {
    fn default() -> Self {
        Self {
            target: Entity::NULL,
            law: GuidanceLaw::ProportionalNavigation,
            navigation_constant: 4.0,
            enabled: true,
        }
    }
}

/// Seeker head: geometry limits and lock state.
#[derive(Debug, Clone)]
pub struct Seeker {
    pub kind: SeekerKind,
    pub fov_deg: f64,
    pub gimbal_limit_deg: f64,
    pub max_range_m: f64,
    pub is_active: bool,
    pub has_lock: bool,
    /// Weak reference: validated against liveness at every use.
    pub locked_target: Entity,
}

impl Default for Seeker {
    fn default() -> Self {
        Self {
            kind: SeekerKind::Rf,
            fov_deg: 10.0,
            gimbal_limit_deg: 60.0,
            max_range_m: 25_000.0,
            is_active: false,
            has_lock: false,
            locked_target: Entity::NULL,
        }
    }
}

/// Radar antenna and receiver hardware parameters.
#[derive(Debug, Clone)]
pub struct Antenna {
    /// Transmitter power (W).
    pub transmit_power_w: f64,
    /// Antenna gain (dB).
    pub gain_db: f64,
    /// Operating wavelength (m); 0.03 m is a 10 GHz X-band set.
    pub wavelength_m: f64,
    /// Receiver thermal noise floor (W), fixed hardware property.
    pub thermal_noise_floor_w: f64,
    /// Effective noise floor seen by the signal processor: thermal plus
    /// whatever jamming power the EW system summed in this tick.
    pub noise_floor_w: f64,
    /// Minimum SNR (dB) for a declared detection.
    pub snr_threshold_db: f64,
}

impl Default for Antenna {
    fn default() -> Self {
        Self {
            transmit_power_w: 10_000.0,
            gain_db: 30.0,
            wavelength_m: 0.03,
            thermal_noise_floor_w: 1e-12,
            noise_floor_w: 1e-12,
            snr_threshold_db: 13.0,
        }
    }
}

/// Infrared detector hardware parameters.
#[derive(Debug, Clone)]
pub struct InfraredSeeker {
    /// Minimum in-band irradiance for a lock (W).
    pub sensitivity_w: f64,
    pub fov_deg: f64,
    pub band: IrBand,
}

impl Default for InfraredSeeker {
    fn default() -> Self {
        Self {
            sensitivity_w: 1e-9,
            fov_deg: 30.0,
            band: IrBand::MidWave,
        }
    }
}

/// Aspect-dependent radar signature, resolved through an external table.
#[derive(Debug, Clone, Default)]
pub struct RcsProfile {
    pub profile_path: String,
}

/// Aspect-dependent infrared signature, resolved through an external table.
#[derive(Debug, Clone, Default)]
pub struct IrSignature {
    pub profile_path: String,
}

/// Marks an entity as engageable and carries its nominal signature.
#[derive(Debug, Clone, Default)]
pub struct Target {
    pub rcs_m2: f64,
}

/// Warhead trigger logic.
#[derive(Debug, Clone)]
pub struct Fuze {
    pub kind: FuzeKind,
    pub trigger_distance_m: f64,
}

impl Default for Fuze {
    fn default() -> Self {
        Self {
            kind: FuzeKind::ProximityRadar,
            trigger_distance_m: 5.0,
        }
    }
}

/// Lethal payload.
#[derive(Debug, Clone)]
pub struct Warhead {
    pub kind: WarheadKind,
    pub lethal_radius_m: f64,
    pub has_detonated: bool,
}

impl Default for Warhead {
    fn default() -> Self {
        Self {
            kind: WarheadKind::BlastFragmentation,
            lethal_radius_m: 10.0,
            has_detonated: false,
        }
    }
}

/// Noise jammer. ERP folds transmitter power and jammer antenna gain.
#[derive(Debug, Clone)]
pub struct Jammer {
    pub effective_radiated_power_w: f64,
    pub active: bool,
}

impl Default for Jammer {
    fn default() -> Self {
        Self {
            effective_radiated_power_w: 1000.0,
            active: false,
        }
    }
}

/// Expendable decoy inventory and deploy commands.
#[derive(Debug, Clone)]
pub struct CountermeasureDispenser {
    pub chaff_count: u32,
    pub flare_count: u32,
    /// Set by tactics logic; consumed (and cleared) by the EW system.
    pub deploy_chaff: bool,
    pub deploy_flare: bool,
}

impl Default for CountermeasureDispenser {
    fn default() -> Self {
        Self {
            chaff_count: 16,
            flare_count: 16,
            deploy_chaff: false,
            deploy_flare: false,
        }
    }
}
