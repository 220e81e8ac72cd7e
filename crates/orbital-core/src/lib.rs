//! Orbital Eye Core - Domain models, errors, configuration, and ports
//!
//! This crate contains the imagery domain model and the port definitions the
//! collector, detector, and pipeline crates are built against.

pub mod config;
pub mod error;
pub mod models;
pub mod ports;

pub use error::{OrbitalError, Result};
