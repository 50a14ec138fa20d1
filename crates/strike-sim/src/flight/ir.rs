//! Aspect-dependent infrared radiant-intensity tables.

use std::path::Path;

use serde::Deserialize;
use strike_core::interp;

use crate::error::SimError;

#[derive(Debug, Deserialize)]
struct RawProfile {
    azimuth_breakpoints_deg: Vec<f64>,
    elevation_breakpoints_deg: Vec<f64>,
    /// `radiant_intensity_table_W_per_sr[elevation][azimuth]`.
    #[serde(rename = "radiant_intensity_table_W_per_sr")]
    radiant_intensity_table_w_per_sr: Vec<Vec<f64>>,
}

/// Radiant intensity versus aspect angle (W/sr).
#[derive(Debug)]
pub struct IrSignatureDatabase {
    azimuth_rad: Vec<f64>,
    elevation_rad: Vec<f64>,
    table_w_per_sr: Vec<Vec<f64>>,
}

impl IrSignatureDatabase {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: RawProfile = serde_json::from_slice(&bytes).map_err(|source| SimError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            azimuth_rad: raw
                .azimuth_breakpoints_deg
                .iter()
                .map(|deg| deg.to_radians())
                .collect(),
            elevation_rad: raw
                .elevation_breakpoints_deg
                .iter()
                .map(|deg| deg.to_radians())
                .collect(),
            table_w_per_sr: raw.radiant_intensity_table_w_per_sr,
        })
    }

    /// Radiant intensity (W/sr) toward an observer at the given target-body
    /// aspect.
    pub fn radiant_intensity(&self, azimuth_rad: f64, elevation_rad: f64) -> f64 {
        if self.azimuth_rad.is_empty() || self.elevation_rad.is_empty() {
            return 0.0;
        }
        let row = interp::bracket(&self.elevation_rad, elevation_rad);
        let col = interp::bracket(&self.azimuth_rad, azimuth_rad);
        interp::bilinear(&self.table_w_per_sr, row, col)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Uniform emitter of `w_per_sr` in every direction.
    pub fn uniform(w_per_sr: f64) -> IrSignatureDatabase {
        IrSignatureDatabase {
            azimuth_rad: vec![-std::f64::consts::PI, std::f64::consts::PI],
            elevation_rad: vec![-std::f64::consts::FRAC_PI_2, std::f64::consts::FRAC_PI_2],
            table_w_per_sr: vec![vec![w_per_sr, w_per_sr], vec![w_per_sr, w_per_sr]],
        }
    }
}
