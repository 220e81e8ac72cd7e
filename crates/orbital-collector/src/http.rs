use async_trait::async_trait;
use futures::StreamExt;
use orbital_core::error::{OrbitalError, Result};
use orbital_core::ports::{HttpResponse, HttpTransport, TransportError};
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// `HttpTransport` backed by a shared `reqwest::Client`
///
/// Every request, including a full download body, is bounded by the timeout
/// given at construction.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("orbital-eye/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| OrbitalError::ConfigInvalid {
                key: "request_timeout_secs".to_string(),
                reason: format!("Failed to build HTTP client: {}", e),
            })?;
        Ok(Self { client })
    }

    /// Wrap an already configured client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn buffer(response: reqwest::Response) -> std::result::Result<HttpResponse, TransportError> {
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        Ok(HttpResponse::new(status, body.to_vec()))
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else if err.is_connect() || err.is_request() || err.is_builder() {
        TransportError::Connect(err.to_string())
    } else {
        TransportError::Stream(err.to_string())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> std::result::Result<HttpResponse, TransportError> {
        let response =
            self.client.post(url).json(body).send().await.map_err(map_reqwest_error)?;
        Self::buffer(response).await
    }

    async fn get(&self, url: &str) -> std::result::Result<HttpResponse, TransportError> {
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;
        Self::buffer(response).await
    }

    async fn download(
        &self,
        url: &str,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> std::result::Result<u64, TransportError> {
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status { status: status.as_u16(), body });
        }

        let mut written = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout(e.to_string())
                } else {
                    TransportError::Stream(e.to_string())
                }
            })?;
            sink.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        sink.flush().await?;

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_creation() {
        assert!(ReqwestTransport::new(Duration::from_secs(5)).is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_host_maps_to_connect() {
        let transport = ReqwestTransport::new(Duration::from_secs(2)).unwrap();
        // port 9 (discard) on loopback is closed on any sane test host
        let err = transport.get("http://127.0.0.1:9/nothing").await.unwrap_err();
        assert!(err.is_unreachable(), "unexpected error {:?}", err);
    }
}
