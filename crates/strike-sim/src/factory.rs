//! Entity creation from JSON profile descriptors.
//!
//! A profile names its components in `simulation.components_to_add`; each
//! recognized tag pulls its parameters from the matching section. A tag
//! whose section is missing is a profile error; an unrecognized tag is
//! ignored with a warning so profiles can carry annotations for outside
//! tooling (the designer app writes extra sections this loader never
//! reads).

use std::path::Path;

use nalgebra::Quaternion;
use serde::Deserialize;
use strike_core::components::{
    AerodynamicProfile, Antenna, AutopilotCommand, AutopilotState, ControlSurface,
    CountermeasureDispenser, ForceAccumulator, Fuze, GainSchedule, Gps, Guidance, Imu, Inertia,
    InfraredSeeker, IrSignature, Jammer, Mass, NavigationState, Propulsion, PropulsionStage,
    RcsProfile, Seeker, Target, Transform, Velocity, Warhead,
};
use strike_core::enums::{FuzeKind, GuidanceLaw, IrBand, SeekerKind, WarheadKind};
use strike_core::{Mat3, Quat, Vec3};
use strike_ecs::{Entity, Registry};

use crate::error::SimError;

#[derive(Debug, Deserialize)]
struct Profile {
    name: String,
    simulation: SimulationSection,
    #[serde(default)]
    initial_state: Option<InitialState>,
    #[serde(default)]
    mass_properties: Option<MassProperties>,
    #[serde(default)]
    propulsion: Option<PropulsionSection>,
    #[serde(default)]
    aerodynamics: Option<AeroSection>,
    #[serde(default)]
    guidance: Option<GuidanceSection>,
    #[serde(default)]
    seeker: Option<SeekerSection>,
    #[serde(default)]
    antenna: Option<AntennaSection>,
    #[serde(default)]
    infrared_seeker: Option<InfraredSeekerSection>,
    #[serde(default)]
    target_signature: Option<TargetSignatureSection>,
    #[serde(default)]
    rcs_profile: Option<SignaturePathSection>,
    #[serde(default)]
    ir_signature: Option<SignaturePathSection>,
    #[serde(default)]
    imu: Option<ImuSection>,
    #[serde(default)]
    gps: Option<GpsSection>,
    #[serde(default)]
    autopilot: Option<AutopilotSection>,
    #[serde(default)]
    fuze: Option<FuzeSection>,
    #[serde(default)]
    warhead: Option<WarheadSection>,
    #[serde(default)]
    jammer: Option<JammerSection>,
    #[serde(default)]
    countermeasures: Option<CountermeasureSection>,
}

#[derive(Debug, Deserialize)]
struct SimulationSection {
    components_to_add: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
struct InitialState {
    #[serde(default)]
    transform: Option<TransformState>,
    #[serde(default)]
    velocity: Option<VelocityState>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct TransformState {
    position: [f64; 3],
    /// `[w, x, y, z]`, normalized on load.
    orientation: [f64; 4],
    scale: [f64; 3],
}

impl Default for TransformState {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            orientation: [1.0, 0.0, 0.0, 0.0],
            scale: [1.0; 3],
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct VelocityState {
    linear: [f64; 3],
    angular: [f64; 3],
}

#[derive(Debug, Deserialize)]
struct MassProperties {
    initial_kg: f64,
    dry_kg: f64,
    #[serde(default)]
    inertia_tensor: Option<[[f64; 3]; 3]>,
}

#[derive(Debug, Deserialize)]
struct PropulsionSection {
    stages: Vec<PropulsionStage>,
    #[serde(default)]
    active: bool,
}

#[derive(Debug, Deserialize)]
struct AeroSection {
    profile_id: String,
    reference_area_m2: f64,
    #[serde(default = "default_wingspan")]
    wingspan_m: f64,
}

fn default_wingspan() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
struct GuidanceSection {
    law: GuidanceLaw,
    #[serde(default = "default_navigation_constant")]
    navigation_constant: f64,
}

fn default_navigation_constant() -> f64 {
    4.0
}

#[derive(Debug, Deserialize)]
struct SeekerSection {
    #[serde(rename = "type")]
    kind: SeekerKind,
    field_of_view_deg: f64,
    gimbal_limit_deg: f64,
    max_range_m: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct AntennaSection {
    transmitter_power_w: f64,
    gain_db: f64,
    wavelength_m: f64,
    noise_floor_w: f64,
    snr_threshold_db: f64,
}

impl Default for AntennaSection {
    fn default() -> Self {
        let antenna = Antenna::default();
        Self {
            transmitter_power_w: antenna.transmit_power_w,
            gain_db: antenna.gain_db,
            wavelength_m: antenna.wavelength_m,
            noise_floor_w: antenna.thermal_noise_floor_w,
            snr_threshold_db: antenna.snr_threshold_db,
        }
    }
}

#[derive(Debug, Deserialize)]
struct InfraredSeekerSection {
    sensitivity_w: f64,
    field_of_view_deg: f64,
    band: IrBand,
}

#[derive(Debug, Deserialize)]
struct TargetSignatureSection {
    rcs_m2: f64,
}

#[derive(Debug, Deserialize)]
struct SignaturePathSection {
    profile_path: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct ImuSection {
    gyro_bias_deg_per_hr: f64,
    gyro_noise_deg_per_sqrt_hr: f64,
    accel_bias_milli_g: f64,
    accel_noise_g_per_sqrt_hz: f64,
}

impl Default for ImuSection {
    fn default() -> Self {
        let imu = Imu::default();
        Self {
            gyro_bias_deg_per_hr: imu.gyro_bias_deg_per_hr,
            gyro_noise_deg_per_sqrt_hr: imu.gyro_noise_deg_per_sqrt_hr,
            accel_bias_milli_g: imu.accel_bias_milli_g,
            accel_noise_g_per_sqrt_hz: imu.accel_noise_g_per_sqrt_hz,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct GpsSection {
    update_rate_hz: f64,
    position_error_m: f64,
}

impl Default for GpsSection {
    fn default() -> Self {
        let gps = Gps::default();
        Self {
            update_rate_hz: gps.update_rate_hz,
            position_error_m: gps.position_error_m,
        }
    }
}

/// A gain is either a scalar (held over the whole envelope) or a full
/// (Mach, q) schedule.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GainValue {
    Scalar(f64),
    Schedule(GainSchedule),
}

impl GainValue {
    fn to_schedule(&self) -> GainSchedule {
        match self {
            GainValue::Scalar(gain) => GainSchedule::uniform(*gain),
            GainValue::Schedule(schedule) => schedule.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct AutopilotSection {
    kp: Option<GainValue>,
    ki: Option<GainValue>,
    kd: Option<GainValue>,
    max_deflection_deg: Option<f64>,
    max_rate_deg_per_sec: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct FuzeSection {
    #[serde(rename = "type", default)]
    kind: FuzeKind,
    trigger_distance_m: f64,
}

#[derive(Debug, Deserialize)]
struct WarheadSection {
    #[serde(rename = "type", default)]
    kind: WarheadKind,
    lethal_radius_m: f64,
}

#[derive(Debug, Deserialize)]
struct JammerSection {
    effective_radiated_power_w: f64,
    #[serde(default)]
    active: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct CountermeasureSection {
    chaff_count: u32,
    flare_count: u32,
}

impl Default for CountermeasureSection {
    fn default() -> Self {
        let dispenser = CountermeasureDispenser::default();
        Self {
            chaff_count: dispenser.chaff_count,
            flare_count: dispenser.flare_count,
        }
    }
}

fn vec3(array: [f64; 3]) -> Vec3 {
    Vec3::new(array[0], array[1], array[2])
}

fn quat(array: [f64; 4]) -> Quat {
    Quat::from_quaternion(Quaternion::new(array[0], array[1], array[2], array[3]))
}

fn require<'a, T>(
    section: &'a Option<T>,
    path: &Path,
    name: &str,
) -> Result<&'a T, SimError> {
    section.as_ref().ok_or_else(|| SimError::MissingProfileSection {
        path: path.to_path_buf(),
        section: name.to_owned(),
    })
}

/// Creates an entity in `registry` from the profile at `path`, attaching
/// every component the profile requests.
pub fn spawn_from_profile(registry: &Registry, path: impl AsRef<Path>) -> Result<Entity, SimError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| SimError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let profile: Profile = serde_json::from_slice(&bytes).map_err(|source| SimError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let entity = registry.create();
    tracing::info!(name = %profile.name, entity = ?entity, "creating entity from profile");

    for tag in &profile.simulation.components_to_add {
        match tag.as_str() {
            "transform" => {
                let state = profile
                    .initial_state
                    .as_ref()
                    .and_then(|s| s.transform.clone())
                    .unwrap_or_default();
                registry.add(
                    entity,
                    Transform {
                        position: vec3(state.position),
                        orientation: quat(state.orientation),
                        scale: vec3(state.scale),
                    },
                );
            }
            "velocity" => {
                let state = profile
                    .initial_state
                    .as_ref()
                    .and_then(|s| s.velocity.clone())
                    .unwrap_or_default();
                registry.add(
                    entity,
                    Velocity {
                        linear: vec3(state.linear),
                        angular: vec3(state.angular),
                    },
                );
            }
            "mass" => {
                let section = require(&profile.mass_properties, path, "mass_properties")?;
                registry.add(entity, Mass::new(section.initial_kg, section.dry_kg));
            }
            "inertia" => {
                let section = require(&profile.mass_properties, path, "mass_properties")?;
                let inertia = match section.inertia_tensor {
                    Some(rows) => Inertia::from_tensor(Mat3::new(
                        rows[0][0], rows[0][1], rows[0][2], rows[1][0], rows[1][1], rows[1][2],
                        rows[2][0], rows[2][1], rows[2][2],
                    )),
                    None => Inertia::default(),
                };
                registry.add(entity, inertia);
            }
            "force_accumulator" => registry.add(entity, ForceAccumulator::default()),
            "propulsion" => {
                let section = require(&profile.propulsion, path, "propulsion")?;
                registry.add(
                    entity,
                    Propulsion {
                        stages: section.stages.clone(),
                        current_stage: 0,
                        time_in_stage_s: 0.0,
                        active: section.active && !section.stages.is_empty(),
                    },
                );
            }
            "aerodynamics" => {
                let section = require(&profile.aerodynamics, path, "aerodynamics")?;
                registry.add(
                    entity,
                    AerodynamicProfile {
                        profile_id: section.profile_id.clone(),
                        reference_area_m2: section.reference_area_m2,
                        wingspan_m: section.wingspan_m,
                        ..Default::default()
                    },
                );
            }
            "control_surfaces" => registry.add(entity, ControlSurface::default()),
            "autopilot_command" => registry.add(entity, AutopilotCommand::default()),
            "autopilot_state" => registry.add(entity, AutopilotState::default()),
            "navigation_state" => registry.add(entity, NavigationState::default()),
            "guidance" => {
                let section = require(&profile.guidance, path, "guidance")?;
                registry.add(
                    entity,
                    Guidance {
                        target: Entity::NULL,
                        law: section.law,
                        navigation_constant: section.navigation_constant,
                        enabled: true,
                    },
                );
            }
            "seeker" => {
                let section = require(&profile.seeker, path, "seeker")?;
                registry.add(
                    entity,
                    Seeker {
                        kind: section.kind,
                        fov_deg: section.field_of_view_deg,
                        gimbal_limit_deg: section.gimbal_limit_deg,
                        max_range_m: section.max_range_m,
                        is_active: true,
                        has_lock: false,
                        locked_target: Entity::NULL,
                    },
                );
            }
            "antenna" => {
                let section = profile.antenna.clone().unwrap_or_default();
                registry.add(
                    entity,
                    Antenna {
                        transmit_power_w: section.transmitter_power_w,
                        gain_db: section.gain_db,
                        wavelength_m: section.wavelength_m,
                        thermal_noise_floor_w: section.noise_floor_w,
                        noise_floor_w: section.noise_floor_w,
                        snr_threshold_db: section.snr_threshold_db,
                    },
                );
            }
            "infrared_seeker" => {
                let section = require(&profile.infrared_seeker, path, "infrared_seeker")?;
                registry.add(
                    entity,
                    InfraredSeeker {
                        sensitivity_w: section.sensitivity_w,
                        fov_deg: section.field_of_view_deg,
                        band: section.band,
                    },
                );
            }
            "target_signature" => {
                let section = require(&profile.target_signature, path, "target_signature")?;
                registry.add(
                    entity,
                    Target {
                        rcs_m2: section.rcs_m2,
                    },
                );
            }
            "rcs_profile" => {
                let section = require(&profile.rcs_profile, path, "rcs_profile")?;
                registry.add(
                    entity,
                    RcsProfile {
                        profile_path: section.profile_path.clone(),
                    },
                );
            }
            "ir_signature" => {
                let section = require(&profile.ir_signature, path, "ir_signature")?;
                registry.add(
                    entity,
                    IrSignature {
                        profile_path: section.profile_path.clone(),
                    },
                );
            }
            "imu" => {
                let section = profile.imu.clone().unwrap_or_default();
                registry.add(
                    entity,
                    Imu {
                        gyro_bias_deg_per_hr: section.gyro_bias_deg_per_hr,
                        gyro_noise_deg_per_sqrt_hr: section.gyro_noise_deg_per_sqrt_hr,
                        accel_bias_milli_g: section.accel_bias_milli_g,
                        accel_noise_g_per_sqrt_hz: section.accel_noise_g_per_sqrt_hz,
                    },
                );
            }
            "gps" => {
                let section = profile.gps.clone().unwrap_or_default();
                registry.add(
                    entity,
                    Gps {
                        update_rate_hz: section.update_rate_hz,
                        position_error_m: section.position_error_m,
                        time_since_fix_s: 0.0,
                    },
                );
            }
            "fuze" => {
                let section = require(&profile.fuze, path, "fuze")?;
                registry.add(
                    entity,
                    Fuze {
                        kind: section.kind,
                        trigger_distance_m: section.trigger_distance_m,
                    },
                );
            }
            "warhead" => {
                let section = require(&profile.warhead, path, "warhead")?;
                registry.add(
                    entity,
                    Warhead {
                        kind: section.kind,
                        lethal_radius_m: section.lethal_radius_m,
                        has_detonated: false,
                    },
                );
            }
            "jammer" => {
                let section = require(&profile.jammer, path, "jammer")?;
                registry.add(
                    entity,
                    Jammer {
                        effective_radiated_power_w: section.effective_radiated_power_w,
                        active: section.active,
                    },
                );
            }
            "countermeasure_dispenser" => {
                let section = profile.countermeasures.clone().unwrap_or_default();
                registry.add(
                    entity,
                    CountermeasureDispenser {
                        chaff_count: section.chaff_count,
                        flare_count: section.flare_count,
                        deploy_chaff: false,
                        deploy_flare: false,
                    },
                );
            }
            unknown => {
                tracing::warn!(tag = unknown, profile = %profile.name, "unrecognized component tag");
            }
        }
    }

    apply_autopilot_tuning(registry, entity, &profile);

    Ok(entity)
}

/// The `autopilot` section tunes components that the tag loop already
/// attached: gains into the autopilot state, actuator limits into the
/// control surfaces.
fn apply_autopilot_tuning(registry: &Registry, entity: Entity, profile: &Profile) {
    let Some(section) = &profile.autopilot else {
        return;
    };

    {
        let mut states = registry.write::<AutopilotState>();
        if let Some(state) = states.get_mut(entity) {
            if let Some(kp) = &section.kp {
                state.kp = kp.to_schedule();
            }
            if let Some(ki) = &section.ki {
                state.ki = ki.to_schedule();
            }
            if let Some(kd) = &section.kd {
                state.kd = kd.to_schedule();
            }
        }
    }

    let mut fins_pool = registry.write::<ControlSurface>();
    if let Some(fins) = fins_pool.get_mut(entity) {
        if let Some(deflection) = section.max_deflection_deg {
            fins.max_deflection_rad = deflection.to_radians();
        }
        if let Some(rate) = section.max_rate_deg_per_sec {
            fins.max_rate_rad_s = rate.to_radians();
        }
    }
}

