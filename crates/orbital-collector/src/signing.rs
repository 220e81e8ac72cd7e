//! Asset URL signing.
//!
//! Planetary Computer blobs are not publicly readable; the `/sas/v1/sign`
//! endpoint appends a short-lived SAS token to an asset href. A signing
//! failure is not fatal by default: the raw href is handed back and the
//! download decides whether it works.

use chrono::{DateTime, Utc};
use orbital_core::error::{OrbitalError, Result};
use orbital_core::models::{ResolvedAsset, SigningOutcome};
use orbital_core::ports::HttpTransport;
use serde::Deserialize;
use tracing::{debug, warn};

/// How asset hrefs are turned into fetchable URLs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SigningPolicy {
    /// Signing endpoint; `None` passes hrefs through untouched
    pub endpoint: Option<String>,

    /// Fail instead of falling back to the raw href
    pub strict: bool,
}

impl SigningPolicy {
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn lenient(endpoint: impl Into<String>) -> Self {
        Self { endpoint: Some(endpoint.into()), strict: false }
    }

    pub fn strict(endpoint: impl Into<String>) -> Self {
        Self { endpoint: Some(endpoint.into()), strict: true }
    }
}

#[derive(Debug, Deserialize)]
struct SignResponse {
    #[serde(default)]
    href: Option<String>,
    #[serde(default, rename = "msft:expiry")]
    expiry: Option<String>,
}

/// Resolves catalog asset hrefs into directly fetchable URLs
pub struct AssetResolver<T: HttpTransport> {
    transport: T,
    policy: SigningPolicy,
}

impl<T: HttpTransport> AssetResolver<T> {
    pub fn new(transport: T, policy: SigningPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> &SigningPolicy {
        &self.policy
    }

    /// Resolve one band's href
    ///
    /// Only fails in strict mode, with `OrbitalError::Signing`.
    pub async fn resolve(&self, band: &str, href: &str) -> Result<ResolvedAsset> {
        let Some(endpoint) = self.policy.endpoint.as_deref() else {
            return Ok(ResolvedAsset {
                band: band.to_string(),
                url: href.to_string(),
                expires_at: None,
                outcome: SigningOutcome::Unsigned,
            });
        };

        match self.sign(endpoint, href).await {
            Ok((url, expires_at)) => {
                debug!(band, "Signed asset href");
                Ok(ResolvedAsset {
                    band: band.to_string(),
                    url,
                    expires_at,
                    outcome: SigningOutcome::Signed,
                })
            }
            Err(reason) if self.policy.strict => {
                Err(OrbitalError::Signing { href: href.to_string(), reason })
            }
            Err(reason) => {
                warn!(band, %reason, "Signing failed, using unsigned href");
                Ok(ResolvedAsset {
                    band: band.to_string(),
                    url: href.to_string(),
                    expires_at: None,
                    outcome: SigningOutcome::FellBackUnsigned { reason },
                })
            }
        }
    }

    async fn sign(
        &self,
        endpoint: &str,
        href: &str,
    ) -> std::result::Result<(String, Option<DateTime<Utc>>), String> {
        let url = reqwest::Url::parse_with_params(endpoint, &[("href", href)])
            .map_err(|e| format!("invalid signing endpoint {}: {}", endpoint, e))?;

        let response = self.transport.get(url.as_str()).await.map_err(|e| e.to_string())?;
        if !response.is_success() {
            return Err(format!("signing service returned HTTP {}", response.status));
        }

        let signed: SignResponse = serde_json::from_slice(&response.body)
            .map_err(|e| format!("undecodable signing response: {}", e))?;

        let signed_href = signed
            .href
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| "signing response has no href".to_string())?;

        let expires_at = signed
            .expiry
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Ok((signed_href, expires_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryTransport;
    use orbital_core::ports::HttpResponse;

    const SIGN: &str = "https://sign.example/api/sas/v1/sign";
    const RAW: &str = "https://blob.example/S2A/TCI.tif";

    fn sign_url() -> String {
        reqwest::Url::parse_with_params(SIGN, &[("href", RAW)]).unwrap().to_string()
    }

    #[tokio::test]
    async fn test_signed_href_and_expiry() {
        let transport = MemoryTransport::new();
        transport.respond(
            &sign_url(),
            HttpResponse::new(
                200,
                r#"{"href": "https://blob.example/S2A/TCI.tif?sig=abc", "msft:expiry": "2024-06-01T12:00:00Z"}"#,
            ),
        );

        let resolver = AssetResolver::new(transport.clone(), SigningPolicy::lenient(SIGN));
        let asset = resolver.resolve("visual", RAW).await.unwrap();

        assert_eq!(asset.outcome, SigningOutcome::Signed);
        assert!(asset.url.ends_with("?sig=abc"));
        assert_eq!(asset.expires_at.unwrap().to_rfc3339(), "2024-06-01T12:00:00+00:00");
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_disabled_signing_makes_no_call() {
        let transport = MemoryTransport::new();
        let resolver = AssetResolver::new(transport.clone(), SigningPolicy::disabled());

        let asset = resolver.resolve("visual", RAW).await.unwrap();

        assert_eq!(asset.outcome, SigningOutcome::Unsigned);
        assert_eq!(asset.url, RAW);
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_fallback_on_error_status() {
        let transport = MemoryTransport::new();
        transport.respond(&sign_url(), HttpResponse::new(503, "busy"));

        let resolver = AssetResolver::new(transport, SigningPolicy::lenient(SIGN));
        let asset = resolver.resolve("visual", RAW).await.unwrap();

        assert_eq!(asset.url, RAW);
        match asset.outcome {
            SigningOutcome::FellBackUnsigned { reason } => assert!(reason.contains("503")),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fallback_on_empty_href() {
        let transport = MemoryTransport::new();
        transport.respond(&sign_url(), HttpResponse::new(200, r#"{"href": ""}"#));

        let resolver = AssetResolver::new(transport, SigningPolicy::lenient(SIGN));
        let asset = resolver.resolve("visual", RAW).await.unwrap();

        assert_eq!(asset.url, RAW);
        assert!(matches!(asset.outcome, SigningOutcome::FellBackUnsigned { .. }));
    }

    #[tokio::test]
    async fn test_strict_policy_fails() {
        // no route registered: the memory transport reports a connect failure
        let transport = MemoryTransport::new();
        let resolver = AssetResolver::new(transport, SigningPolicy::strict(SIGN));

        let err = resolver.resolve("visual", RAW).await.unwrap_err();
        match err {
            OrbitalError::Signing { href, .. } => assert_eq!(href, RAW),
            other => panic!("unexpected error {:?}", other),
        }
    }
}
