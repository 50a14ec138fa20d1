//! Enumeration types used throughout the simulation.
//!
//! Profile files carry these as strings; the serde renames pin the exact
//! spellings the profile schema uses.

use serde::{Deserialize, Serialize};

/// Guidance law flown by a missile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuidanceLaw {
    /// Classic PN: command proportional to closing velocity and LOS rate.
    #[default]
    ProportionalNavigation,
    /// PN augmented with a target-acceleration feed-forward term.
    AugmentedProportionalNavigation,
    /// Steer the velocity vector directly onto the line of sight.
    PurePursuit,
}

/// Seeker head technology.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeekerKind {
    /// Active radar seeker; detection via the two-way range equation.
    #[default]
    #[serde(rename = "RF")]
    Rf,
    /// Infrared hot-spot seeker.
    #[serde(rename = "IR")]
    Ir,
    /// Imaging infrared; shares the IR propagation model.
    #[serde(rename = "IIR")]
    ImagingIr,
    /// Semi-active laser; geometric gating only.
    #[serde(rename = "LASER")]
    Laser,
}

/// Infrared wavelength bands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IrBand {
    /// MWIR, 3–5 µm: hot engine plumes.
    #[default]
    #[serde(rename = "MWIR")]
    MidWave,
    /// LWIR, 8–12 µm: cooler airframes.
    #[serde(rename = "LWIR")]
    LongWave,
}

/// Fuze trigger mechanism.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuzeKind {
    #[default]
    ProximityRadar,
    ProximityLaser,
    Impact,
}

/// Warhead payload type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarheadKind {
    #[default]
    BlastFragmentation,
    ContinuousRod,
    ShapedCharge,
}

/// How GPS fixes are folded into the inertial estimate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GpsFusion {
    /// Overwrite the estimated position with the measurement.
    Replace,
    /// 6-state linear Kalman update on [position, velocity].
    #[default]
    Kalman,
}
