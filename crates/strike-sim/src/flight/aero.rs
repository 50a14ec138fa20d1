//! Aerodynamic coefficient tables.

use std::path::Path;

use serde::Deserialize;
use strike_core::interp;

use crate::error::SimError;

/// Lift and drag coefficients at one flight condition.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AeroCoefficients {
    pub cl: f64,
    pub cd: f64,
}

/// Per-vehicle Cl/Cd tables keyed on (Mach, angle of attack).
#[derive(Debug, Deserialize)]
pub struct AeroDatabase {
    mach_breakpoints: Vec<f64>,
    aoa_breakpoints_rad: Vec<f64>,
    /// `cl_table[mach][aoa]`.
    cl_table: Vec<Vec<f64>>,
    /// `cd_table[mach][aoa]`.
    cd_table: Vec<Vec<f64>>,
}

impl AeroDatabase {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| SimError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Bilinear interpolation of both coefficients, clamped to the table
    /// edges outside the envelope.
    pub fn coefficients(&self, mach: f64, aoa_rad: f64) -> AeroCoefficients {
        if self.mach_breakpoints.is_empty() || self.aoa_breakpoints_rad.is_empty() {
            return AeroCoefficients::default();
        }
        let row = interp::bracket(&self.mach_breakpoints, mach);
        let col = interp::bracket(&self.aoa_breakpoints_rad, aoa_rad);
        AeroCoefficients {
            cl: interp::bilinear(&self.cl_table, row, col),
            cd: interp::bilinear(&self.cd_table, row, col),
        }
    }
}
