//! Orbital Eye Pipeline - Best-scene acquisition
//!
//! This crate composes the catalog client, asset resolver, and cache-aware
//! downloader into the "best recent image for this location" use case.

pub mod models;
pub mod pipeline;

pub use models::{Acquisition, AcquisitionRequest, PipelineSettings, DEFAULT_LOOKBACK_MONTHS};
pub use pipeline::AcquisitionPipeline;
