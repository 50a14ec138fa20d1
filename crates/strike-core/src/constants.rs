//! Physical constants and simulation tuning parameters.

/// Standard gravity (m/s²). Converts between g-units and m/s² and anchors
/// specific-impulse fuel flow.
pub const G0: f64 = 9.80665;

/// Newtonian gravitational constant (m³ kg⁻¹ s⁻²).
pub const GRAVITATIONAL_CONSTANT: f64 = 6.67430e-11;

/// Earth mass (kg, WGS 84).
pub const EARTH_MASS_KG: f64 = 5.97219e24;

/// Mean Earth radius (m).
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Sea-level standard pressure (Pa). Normalizes ambient pressure for the
/// sea-level/vacuum Isp interpolation.
pub const SEA_LEVEL_PRESSURE_PA: f64 = 101_325.0;

/// Default simulation rate when a scenario does not specify one (Hz).
pub const DEFAULT_TIME_STEP_HZ: f64 = 100.0;

// --- Infrared propagation ---

/// Exponential scale height of atmospheric absorption (m).
pub const ATMOSPHERE_SCALE_HEIGHT_M: f64 = 8_000.0;

/// Sea-level extinction coefficient for the mid-wave IR band (per meter).
pub const MWIR_EXTINCTION_PER_M: f64 = 1.0e-4;

/// Sea-level extinction coefficient for the long-wave IR band (per meter).
pub const LWIR_EXTINCTION_PER_M: f64 = 2.0e-4;

// --- Countermeasures ---

/// Signature profile attached to a freshly deployed chaff cloud.
pub const CHAFF_RCS_PROFILE: &str = "data/rcs/chaff_cloud_generic.json";

/// Signature profile attached to a freshly deployed flare.
pub const FLARE_IR_PROFILE: &str = "data/ir/flare_generic.json";
