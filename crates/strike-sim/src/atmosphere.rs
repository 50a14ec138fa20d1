//! Precomputed atmosphere table lookup.
//!
//! The table is generated offline as a flat binary array of packed records
//! `{altitude, temperature, pressure, density, speed_of_sound}` (native
//! f64), one per integer meter from 0 to 86 km. The loader reads records
//! until EOF; an empty file is a configuration failure.
//!
//! Systems receive the table as an injected `Arc<AtmosphereTable>` at
//! construction. There is no process-wide atmosphere state.

use std::path::Path;

use strike_core::constants::{
    ATMOSPHERE_SCALE_HEIGHT_M, LWIR_EXTINCTION_PER_M, MWIR_EXTINCTION_PER_M,
};
use strike_core::enums::IrBand;

use crate::error::SimError;

/// Atmospheric state at one altitude.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AtmosphereProperties {
    /// Geometric altitude (m).
    pub altitude: f64,
    /// Kelvin.
    pub temperature: f64,
    /// Pascal.
    pub pressure: f64,
    /// kg/m³.
    pub density: f64,
    /// m/s.
    pub speed_of_sound: f64,
}

const RECORD_FIELDS: usize = 5;
const RECORD_BYTES: usize = RECORD_FIELDS * 8;

/// Interpolating lookup over the precomputed table.
pub struct AtmosphereTable {
    table: Vec<AtmosphereProperties>,
}

impl AtmosphereTable {
    /// Loads the binary table, reading packed records until EOF.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut table = Vec::with_capacity(bytes.len() / RECORD_BYTES);
        for record in bytes.chunks_exact(RECORD_BYTES) {
            let mut fields = [0.0f64; RECORD_FIELDS];
            for (field, chunk) in fields.iter_mut().zip(record.chunks_exact(8)) {
                *field = f64::from_ne_bytes(chunk.try_into().expect("chunk is 8 bytes"));
            }
            table.push(AtmosphereProperties {
                altitude: fields[0],
                temperature: fields[1],
                pressure: fields[2],
                density: fields[3],
                speed_of_sound: fields[4],
            });
        }

        if table.is_empty() {
            return Err(SimError::EmptyAtmosphereTable {
                path: path.to_path_buf(),
            });
        }
        tracing::info!(records = table.len(), path = %path.display(), "atmosphere table loaded");
        Ok(Self { table })
    }

    /// Builds a table from in-memory records (tests, embedded tables).
    pub fn from_records(table: Vec<AtmosphereProperties>) -> Self {
        assert!(!table.is_empty(), "atmosphere table must not be empty");
        Self { table }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Properties at `altitude` meters, linearly interpolated between the
    /// integer-meter records and clamped to the table's ends.
    pub fn properties(&self, altitude: f64) -> AtmosphereProperties {
        let first = &self.table[0];
        let last = &self.table[self.table.len() - 1];
        if altitude <= first.altitude {
            return *first;
        }
        if altitude >= last.altitude {
            return *last;
        }

        let lower = altitude as usize;
        let upper = lower + 1;
        if upper >= self.table.len() {
            return *last;
        }
        let fraction = altitude - lower as f64;

        let low = &self.table[lower];
        let high = &self.table[upper];
        AtmosphereProperties {
            altitude,
            temperature: low.temperature + fraction * (high.temperature - low.temperature),
            pressure: low.pressure + fraction * (high.pressure - low.pressure),
            density: low.density + fraction * (high.density - low.density),
            speed_of_sound: low.speed_of_sound
                + fraction * (high.speed_of_sound - low.speed_of_sound),
        }
    }

    /// In-band transmissivity over a slant path: Beer–Lambert with the
    /// band's sea-level extinction coefficient thinned exponentially with
    /// sensor altitude.
    pub fn transmissivity(range_m: f64, altitude_m: f64, band: IrBand) -> f64 {
        let extinction = match band {
            IrBand::MidWave => MWIR_EXTINCTION_PER_M,
            IrBand::LongWave => LWIR_EXTINCTION_PER_M,
        };
        let thinning = (-altitude_m.max(0.0) / ATMOSPHERE_SCALE_HEIGHT_M).exp();
        (-extinction * range_m * thinning).exp()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn record(altitude: f64, pressure: f64) -> AtmosphereProperties {
        AtmosphereProperties {
            altitude,
            temperature: 288.15,
            pressure,
            density: 1.225,
            speed_of_sound: 340.29,
        }
    }

    #[test]
    fn lookup_clamps_to_table_ends() {
        let table =
            AtmosphereTable::from_records(vec![record(0.0, 101_325.0), record(1.0, 101_312.0)]);
        assert_eq!(table.properties(-5.0).pressure, 101_325.0);
        assert_eq!(table.properties(100.0).pressure, 101_312.0);
    }

    #[test]
    fn lookup_interpolates_between_integer_meters() {
        let table = AtmosphereTable::from_records(vec![
            record(0.0, 100.0),
            record(1.0, 200.0),
            record(2.0, 400.0),
        ]);
        let mid = table.properties(0.5);
        assert!((mid.pressure - 150.0).abs() < 1e-9);
        let upper = table.properties(1.25);
        assert!((upper.pressure - 250.0).abs() < 1e-9);
    }

    #[test]
    fn binary_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("atmosphere_table.bin");

        let mut bytes = Vec::new();
        for km in 0..3 {
            let fields = [
                km as f64,
                288.15 - km as f64,
                101_325.0,
                1.225,
                340.29,
            ];
            for field in fields {
                bytes.extend_from_slice(&field.to_ne_bytes());
            }
        }
        std::fs::write(&path, &bytes).unwrap();

        let table = AtmosphereTable::load(&path).unwrap();
        assert_eq!(table.len(), 3);
        assert!((table.properties(1.0).temperature - 287.15).abs() < 1e-12);
    }

    #[test]
    fn empty_file_is_a_load_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.bin");
        std::fs::write(&path, b"").unwrap();
        assert!(matches!(
            AtmosphereTable::load(&path),
            Err(SimError::EmptyAtmosphereTable { .. })
        ));
    }

    #[test]
    fn transmissivity_decays_with_range_and_recovers_with_altitude() {
        let sea = AtmosphereTable::transmissivity(10_000.0, 0.0, IrBand::MidWave);
        let high = AtmosphereTable::transmissivity(10_000.0, 16_000.0, IrBand::MidWave);
        let lwir = AtmosphereTable::transmissivity(10_000.0, 0.0, IrBand::LongWave);
        assert!(sea < 1.0 && sea > 0.0);
        assert!(high > sea, "thinner air passes more energy");
        assert!(lwir < sea, "long-wave band absorbs harder");
    }
}
