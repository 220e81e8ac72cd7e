use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncWrite;

/// A fully buffered HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as text, lossy for non UTF-8 payloads
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Failure to complete an HTTP exchange
#[derive(Debug, Error)]
pub enum TransportError {
    /// The remote could not be reached (DNS, refused, TLS)
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    /// The remote answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The body stream broke after the response started
    #[error("body stream interrupted: {0}")]
    Stream(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// Whether the remote was never reached or stopped answering
    pub fn is_unreachable(&self) -> bool {
        matches!(self, TransportError::Connect(_) | TransportError::Timeout(_))
    }
}

/// Port for the HTTP exchanges of the acquisition pipeline
///
/// Per-request timeouts are a property of the adapter. No adapter retries.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// POST a JSON body and buffer the response, whatever its status
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<HttpResponse, TransportError>;

    /// GET a URL and buffer the response, whatever its status
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError>;

    /// GET a URL and stream a success body into `sink`
    ///
    /// # Returns
    /// Number of bytes written. A non-success status is `TransportError::Status`
    /// and nothing is written.
    async fn download(
        &self,
        url: &str,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<u64, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_range() {
        assert!(HttpResponse::new(200, "ok").is_success());
        assert!(HttpResponse::new(204, Vec::new()).is_success());
        assert!(!HttpResponse::new(302, Vec::new()).is_success());
        assert!(!HttpResponse::new(503, "busy").is_success());
    }

    #[test]
    fn test_unreachable_classification() {
        assert!(TransportError::Connect("refused".into()).is_unreachable());
        assert!(TransportError::Timeout("60s".into()).is_unreachable());
        assert!(!TransportError::Status { status: 500, body: String::new() }.is_unreachable());
    }
}
