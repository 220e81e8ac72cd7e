//! In-memory transport for development and testing.
//!
//! Routes are matched on the exact URL. Like the other in-memory adapters this
//! one uses `RwLock::unwrap()`: a poisoned lock means a test already panicked.

use async_trait::async_trait;
use orbital_core::ports::{HttpResponse, HttpTransport, TransportError};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// One exchange seen by the transport
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    PostJson { url: String, body: serde_json::Value },
    Get { url: String },
    Download { url: String },
}

impl RecordedCall {
    pub fn url(&self) -> &str {
        match self {
            RecordedCall::PostJson { url, .. }
            | RecordedCall::Get { url }
            | RecordedCall::Download { url } => url,
        }
    }
}

#[derive(Debug, Clone)]
enum Route {
    Respond(HttpResponse),
    BreakMidStream { partial: Vec<u8>, reason: String },
}

/// Canned-response implementation of `HttpTransport`
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    routes: Arc<RwLock<HashMap<String, Route>>>,
    calls: Arc<RwLock<Vec<RecordedCall>>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every request for `url` with `response`
    pub fn respond(&self, url: &str, response: HttpResponse) {
        self.routes.write().unwrap().insert(url.to_string(), Route::Respond(response));
    }

    pub fn respond_json(&self, url: &str, status: u16, body: &serde_json::Value) {
        self.respond(url, HttpResponse::new(status, body.to_string()));
    }

    /// Downloads of `url` write `partial` then fail with a stream error
    pub fn break_mid_stream(&self, url: &str, partial: impl Into<Vec<u8>>, reason: &str) {
        self.routes.write().unwrap().insert(
            url.to_string(),
            Route::BreakMidStream { partial: partial.into(), reason: reason.to_string() },
        );
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.read().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }

    pub fn clear_calls(&self) {
        self.calls.write().unwrap().clear();
    }

    fn record(&self, call: RecordedCall) {
        self.calls.write().unwrap().push(call);
    }

    fn route(&self, url: &str) -> Result<Route, TransportError> {
        self.routes
            .read()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| TransportError::Connect(format!("no route for {}", url)))
    }

    fn buffered(&self, url: &str) -> Result<HttpResponse, TransportError> {
        match self.route(url)? {
            Route::Respond(response) => Ok(response),
            Route::BreakMidStream { reason, .. } => Err(TransportError::Stream(reason)),
        }
    }
}

#[async_trait]
impl HttpTransport for MemoryTransport {
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<HttpResponse, TransportError> {
        self.record(RecordedCall::PostJson { url: url.to_string(), body: body.clone() });
        self.buffered(url)
    }

    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        self.record(RecordedCall::Get { url: url.to_string() });
        self.buffered(url)
    }

    async fn download(
        &self,
        url: &str,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<u64, TransportError> {
        self.record(RecordedCall::Download { url: url.to_string() });

        match self.route(url)? {
            Route::Respond(response) if !response.is_success() => {
                Err(TransportError::Status { status: response.status, body: response.text() })
            }
            Route::Respond(response) => {
                sink.write_all(&response.body).await?;
                Ok(response.body.len() as u64)
            }
            Route::BreakMidStream { partial, reason } => {
                sink.write_all(&partial).await?;
                Err(TransportError::Stream(reason))
            }
        }
    }
}
