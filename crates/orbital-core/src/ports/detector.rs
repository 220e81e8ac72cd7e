//! Detection service port

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ChangeRequest, ChangeResponse, DetectRequest, DetectResponse, HealthStatus};

/// Port for the remote object and change detection service
#[async_trait]
pub trait Detector: Send + Sync {
    /// Detect objects in a single image
    async fn detect(&self, request: &DetectRequest) -> Result<DetectResponse>;

    /// Compare two acquisitions of the same area
    async fn detect_changes(&self, request: &ChangeRequest) -> Result<ChangeResponse>;

    /// Report readiness and loaded models
    async fn health(&self) -> Result<HealthStatus>;

    /// Address the adapter talks to, for diagnostics
    fn address(&self) -> &str;
}
