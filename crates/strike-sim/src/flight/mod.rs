//! Flight databases: aerodynamic coefficients and target signatures.
//!
//! All three are JSON tables loaded lazily on first touch and cached per
//! owning system. Load failures are deliberately **not** memoized: the
//! affected entity is skipped for that tick and the load retried on the
//! next, so a data file that appears mid-run starts working without a
//! restart.

pub mod aero;
pub mod ir;
pub mod rcs;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::SimError;

pub use aero::{AeroCoefficients, AeroDatabase};
pub use ir::IrSignatureDatabase;
pub use rcs::RcsDatabase;

/// Lazy keyed cache for profile databases.
///
/// Owned by a single system and touched only from that system's job, so the
/// mutex is uncontended; it exists to keep the owning system `Sync`.
pub struct ProfileCache<T> {
    entries: Mutex<HashMap<String, Arc<T>>>,
}

impl<T> Default for ProfileCache<T> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<T> ProfileCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates the cache, e.g. to warm profiles before the first tick.
    pub fn insert(&self, key: impl Into<String>, value: T) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), Arc::new(value));
    }

    /// Returns the cached database for `key`, loading it on a miss.
    /// A failed load yields `None` and is retried on the next call.
    pub fn fetch(
        &self,
        key: &str,
        load: impl FnOnce(&str) -> Result<T, SimError>,
    ) -> Option<Arc<T>> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(db) = entries.get(key) {
            return Some(Arc::clone(db));
        }
        match load(key) {
            Ok(db) => {
                let db = Arc::new(db);
                entries.insert(key.to_owned(), Arc::clone(&db));
                Some(db)
            }
            Err(error) => {
                tracing::warn!(key, %error, "profile load failed; entity skipped this tick");
                None
            }
        }
    }
}
