use orbital_core::error::{OrbitalError, Result};
use orbital_core::models::{CatalogScene, SearchCriteria};
use orbital_core::ports::{HttpTransport, TransportError};
use tracing::{debug, info};

use crate::stac::{ItemCollection, SearchBody};

/// Client for a STAC `/search` endpoint
pub struct CatalogClient<T: HttpTransport> {
    transport: T,
    search_url: String,
}

impl<T: HttpTransport> CatalogClient<T> {
    pub fn new(transport: T, search_url: impl Into<String>) -> Self {
        Self { transport, search_url: search_url.into() }
    }

    pub fn search_url(&self) -> &str {
        &self.search_url
    }

    /// Search the catalog and return scenes ranked by cloud cover
    ///
    /// A single page of at most `criteria.limit()` features is requested.
    ///
    /// # Errors
    /// * `CatalogUnavailable` - the endpoint could not be reached
    /// * `CatalogQuery` - the endpoint answered with a non-success status
    /// * `CatalogResponse` - a success body that is not an item collection
    pub async fn search(&self, criteria: &SearchCriteria) -> Result<Vec<CatalogScene>> {
        let body = serde_json::to_value(SearchBody::from_criteria(criteria))?;
        debug!(url = %self.search_url, collection = %criteria.collection, "Searching catalog");

        let response = self
            .transport
            .post_json(&self.search_url, &body)
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.is_success() {
            return Err(OrbitalError::CatalogQuery { status: response.status, body: response.text() });
        }

        let collection: ItemCollection = serde_json::from_slice(&response.body)
            .map_err(|e| OrbitalError::CatalogResponse { reason: e.to_string() })?;

        let mut scenes: Vec<CatalogScene> = collection
            .features
            .into_iter()
            .map(|item| item.into_scene(&criteria.collection))
            .collect();
        rank_by_cloud_cover(&mut scenes);

        info!(count = scenes.len(), collection = %criteria.collection, "Catalog search complete");
        Ok(scenes)
    }

    fn transport_error(&self, err: TransportError) -> OrbitalError {
        match err {
            TransportError::Status { status, body } => OrbitalError::CatalogQuery { status, body },
            other => OrbitalError::CatalogUnavailable {
                endpoint: self.search_url.clone(),
                reason: other.to_string(),
            },
        }
    }
}

/// Order scenes by ascending cloud cover, keeping catalog order among ties
pub fn rank_by_cloud_cover(scenes: &mut [CatalogScene]) {
    scenes.sort_by(|a, b| a.cloud_cover.total_cmp(&b.cloud_cover));
}
