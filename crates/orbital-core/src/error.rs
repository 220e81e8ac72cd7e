//! Error types for Orbital Eye

use std::time::Duration;
use thiserror::Error;

use crate::models::LocalImageSet;

#[derive(Debug, Error)]
pub enum OrbitalError {
    // Catalog errors
    #[error("Catalog unavailable at {endpoint}: {reason}")]
    CatalogUnavailable { endpoint: String, reason: String },

    #[error("Catalog rejected the query (HTTP {status}): {body}")]
    CatalogQuery { status: u16, body: String },

    #[error("Malformed catalog response: {reason}")]
    CatalogResponse { reason: String },

    #[error("No imagery found for {query}")]
    NoImageryFound { query: String },

    // Asset errors
    #[error("Failed to sign asset {href}: {reason}")]
    Signing { href: String, reason: String },

    #[error("{0}")]
    PartialDownload(Box<PartialDownload>),

    // Detection service errors
    #[error("Detection service unavailable at {address}: {reason}")]
    DetectorUnavailable { address: String, reason: String },

    #[error("Detection failed: {reason}")]
    Detection { reason: String },

    #[error("{operation} did not finish within {limit:?}")]
    Timeout { operation: String, limit: Duration },

    // Configuration errors
    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for OrbitalError {
    fn from(err: serde_json::Error) -> Self {
        OrbitalError::Serialization(err.to_string())
    }
}

/// A band that could not be materialized on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandFailure {
    pub band: String,
    pub reason: String,
}

/// Outcome of a download where at least one requested band failed.
///
/// `image_set` still lists every band that is present on disk.
#[derive(Debug, Clone)]
pub struct PartialDownload {
    pub scene_id: String,
    pub succeeded: Vec<String>,
    pub failed: Vec<BandFailure>,
    pub image_set: LocalImageSet,
}

impl std::fmt::Display for PartialDownload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let failed: Vec<String> =
            self.failed.iter().map(|f| format!("{} ({})", f.band, f.reason)).collect();
        write!(
            f,
            "Partial download of scene {}: succeeded [{}], failed [{}]",
            self.scene_id,
            self.succeeded.join(", "),
            failed.join("; ")
        )
    }
}

pub type Result<T> = std::result::Result<T, OrbitalError>;
