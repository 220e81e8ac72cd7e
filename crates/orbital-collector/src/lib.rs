//! Orbital Eye Collector - Catalog search, asset signing, and band download
//!
//! Everything here talks to the network through the
//! [`HttpTransport`](orbital_core::ports::HttpTransport) port. [`ReqwestTransport`]
//! is the production adapter and [`MemoryTransport`] serves canned responses
//! in tests.

pub mod catalog;
pub mod download;
pub mod http;
pub mod memory;
pub mod signing;
pub mod stac;

pub use catalog::{rank_by_cloud_cover, CatalogClient};
pub use download::CacheDownloader;
pub use http::ReqwestTransport;
pub use memory::{MemoryTransport, RecordedCall};
pub use signing::{AssetResolver, SigningPolicy};
