//! Port trait definitions
//!
//! These traits define the interfaces that adapters must implement.

pub mod detector;
pub mod transport;

pub use detector::Detector;
pub use transport::{HttpResponse, HttpTransport, TransportError};
