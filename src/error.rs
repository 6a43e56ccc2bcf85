//! Error types for kubekit

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or synthesizing manifests
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A file backing a secret or config could not be read
    #[error("Failed to read file {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML (de)serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A queued JSON patch did not apply to its object
    #[error("JSON patch failed on {object}: {source}")]
    JsonPatch {
        object: String,
        #[source]
        source: json_patch::PatchError,
    },

    // =========================================================================
    // Construct Tree Errors
    // =========================================================================
    /// Two children of the same scope share an id
    #[error("Duplicate id '{id}' in scope '{scope}'")]
    DuplicateId { scope: String, id: String },

    /// Lookup of an api object by id failed
    #[error("No api object with id '{id}' in chart '{chart}'")]
    ObjectNotFound { chart: String, id: String },

    /// A synthesized or loaded manifest is malformed
    #[error("Invalid manifest {source_name}: {reason}")]
    InvalidManifest { source_name: String, reason: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
