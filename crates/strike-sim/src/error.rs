//! Simulation errors.

use std::path::PathBuf;

use thiserror::Error;

use crate::graph::GraphError;

/// Top-level error for engine construction and scenario loading.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("atmosphere table {path} is empty or truncated")]
    EmptyAtmosphereTable { path: PathBuf },

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("scenario references unknown entity '{0}'")]
    UnknownScenarioEntity(String),

    #[error("profile '{path}' is missing section '{section}'")]
    MissingProfileSection { path: PathBuf, section: String },
}
