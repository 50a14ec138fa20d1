//! Aspect-dependent radar cross-section tables.

use std::path::Path;

use serde::Deserialize;
use strike_core::interp;

use crate::error::SimError;

#[derive(Debug, Deserialize)]
struct RawProfile {
    azimuth_breakpoints_deg: Vec<f64>,
    elevation_breakpoints_deg: Vec<f64>,
    /// `rcs_table_dbsm[elevation][azimuth]`.
    rcs_table_dbsm: Vec<Vec<f64>>,
}

/// RCS versus aspect angle, stored in dBsm and queried in m².
#[derive(Debug)]
pub struct RcsDatabase {
    azimuth_rad: Vec<f64>,
    elevation_rad: Vec<f64>,
    table_dbsm: Vec<Vec<f64>>,
}

impl RcsDatabase {
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
            table_dbsm: raw.rcs_table_dbsm,
        })
    }

    /// RCS in m² for an aspect given in target-body azimuth/elevation.
    /// Interpolation happens in dBsm; the result is converted to linear.
    pub fn rcs_m2(&self, azimuth_rad: f64, elevation_rad: f64) -> f64 {
        if self.azimuth_rad.is_empty() || self.elevation_rad.is_empty() {
            return 1.0;
        }
        let row = interp::bracket(&self.elevation_rad, elevation_rad);
        let col = interp::bracket(&self.azimuth_rad, azimuth_rad);
        let dbsm = interp::bilinear(&self.table_dbsm, row, col);
        10f64.powf(dbsm / 10.0)
    }
}
