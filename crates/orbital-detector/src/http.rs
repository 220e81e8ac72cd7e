use async_trait::async_trait;
use orbital_core::error::{OrbitalError, Result};
use orbital_core::models::{ChangeRequest, ChangeResponse, DetectRequest, DetectResponse, HealthStatus};
use orbital_core::ports::Detector;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Detection service client over HTTP+JSON
pub struct HttpDetector {
    /// Address as configured (e.g., "localhost:50051")
    address: String,

    /// Normalized base URL (e.g., "http://localhost:50051")
    base_url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpDetector {
    /// Create a client for `address`, bounding every call by `timeout`
    pub fn new(address: impl Into<String>, timeout: Duration) -> Result<Self> {
        let address = address.into();
        let client = reqwest::Client::builder().timeout(timeout).build().map_err(|e| {
            OrbitalError::DetectorUnavailable {
                address: address.clone(),
                reason: format!("Failed to build HTTP client: {}", e),
            }
        })?;

        Ok(Self { base_url: base_url_for(&address), address, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "Calling detection service");
        let request = self.client.post(&url).json(body);
        self.exchange(request).await
    }

    async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "Calling detection service");
        self.exchange(self.client.get(&url)).await
    }

    async fn exchange<R: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<R> {
        let response = request.send().await.map_err(|e| OrbitalError::DetectorUnavailable {
            address: self.address.clone(),
            reason: e.to_string(),
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(OrbitalError::Detection {
                reason: format!("service returned {}: {}", status, error_text),
            });
        }

        response.json::<R>().await.map_err(|e| OrbitalError::Detection {
            reason: format!("Failed to parse detection service response: {}", e),
        })
    }
}

/// Prefix a bare `host:port` with `http://` and drop trailing slashes
fn base_url_for(address: &str) -> String {
    let trimmed = address.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

#[async_trait]
impl Detector for HttpDetector {
    async fn detect(&self, request: &DetectRequest) -> Result<DetectResponse> {
        self.post("/v1/detect", request).await
    }

    async fn detect_changes(&self, request: &ChangeRequest) -> Result<ChangeResponse> {
        self.post("/v1/changes", request).await
    }

    async fn health(&self) -> Result<HealthStatus> {
        self.get("/v1/health").await
    }

    fn address(&self) -> &str {
        &self.address
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbital_core::models::ImageSource;
    use std::path::PathBuf;

    #[test]
    fn test_base_url_normalization() {
        assert_eq!(base_url_for("localhost:50051"), "http://localhost:50051");
        assert_eq!(base_url_for("https://gpu-box:8443/"), "https://gpu-box:8443");
        assert_eq!(base_url_for(" 10.0.0.7:50051 "), "http://10.0.0.7:50051");
    }

    #[test]
    fn test_detector_keeps_configured_address() {
        let detector = HttpDetector::new("gpu-box:50051", Duration::from_secs(5)).unwrap();
        assert_eq!(detector.address(), "gpu-box:50051");
        assert_eq!(detector.base_url(), "http://gpu-box:50051");
    }

    #[tokio::test]
    async fn test_unreachable_service() {
        let detector = HttpDetector::new("127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let request = DetectRequest::new(ImageSource::Path(PathBuf::from("/tmp/x.tif")), 0.3, 10.0);

        let err = detector.detect(&request).await.unwrap_err();
        match err {
            OrbitalError::DetectorUnavailable { address, .. } => assert_eq!(address, "127.0.0.1:9"),
            other => panic!("unexpected error {:?}", other),
        }
    }
}
