//! Orbital Eye Detector - Clients for the remote detection service
//!
//! The service itself runs elsewhere; this crate only speaks its HTTP+JSON
//! contract through the [`Detector`](orbital_core::ports::Detector) port.

pub mod http;
pub mod memory;

pub use http::HttpDetector;
pub use memory::MemoryDetector;
