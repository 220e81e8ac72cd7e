use chrono::Utc;
use orbital_collector::{AssetResolver, CacheDownloader, CatalogClient};
use orbital_core::error::{OrbitalError, Result};
use orbital_core::models::{CatalogScene, DateWindow, SearchCriteria};
use orbital_core::ports::HttpTransport;
use orbital_geo::{bbox_from_center, footprint_contains};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use crate::models::{Acquisition, AcquisitionRequest, PipelineSettings, DEFAULT_LOOKBACK_MONTHS};

/// Acquisition pipeline composing catalog search, signing, and download
pub struct AcquisitionPipeline<T>
where
    T: HttpTransport,
{
    catalog: CatalogClient<T>,
    downloader: CacheDownloader<T>,
    cache_root: PathBuf,
    deadline: Duration,
}

impl<T> AcquisitionPipeline<T>
where
    T: HttpTransport + Clone,
{
    /// Create a new pipeline sharing one transport between all stages
    pub fn new(transport: T, settings: PipelineSettings) -> Self {
        let resolver = AssetResolver::new(transport.clone(), settings.signing);
        Self {
            catalog: CatalogClient::new(transport.clone(), settings.catalog_url),
            downloader: CacheDownloader::new(resolver, transport),
            cache_root: settings.cache_root,
            deadline: settings.deadline,
        }
    }

    /// Ranked candidates for a request, without downloading anything
    pub async fn search(&self, request: &AcquisitionRequest) -> Result<Vec<CatalogScene>> {
        let criteria = self.criteria_for(request);
        self.catalog.search(&criteria).await
    }

    /// Find the least cloudy scene for a request and download its bands
    ///
    /// # Errors
    /// * `NoImageryFound` - the catalog returned no candidates; nothing is downloaded
    /// * `CatalogUnavailable`, `CatalogQuery`, `CatalogResponse` - search failed
    /// * `PartialDownload` - some bands of the selected scene failed
    /// * `Timeout` - the whole call exceeded the configured deadline
    pub async fn fetch_best(&self, request: &AcquisitionRequest) -> Result<Acquisition> {
        match tokio::time::timeout(self.deadline, self.acquire(request)).await {
            Ok(result) => result,
            Err(_) => Err(OrbitalError::Timeout {
                operation: "acquisition".to_string(),
                limit: self.deadline,
            }),
        }
    }

    async fn acquire(&self, request: &AcquisitionRequest) -> Result<Acquisition> {
        let criteria = self.criteria_for(request);
        let candidates = self.catalog.search(&criteria).await?;

        let Some(scene) = candidates.first().cloned() else {
            return Err(OrbitalError::NoImageryFound { query: request.describe(&criteria.window) });
        };

        info!(
            scene = %scene.id,
            cloud_cover = scene.cloud_cover,
            candidates = candidates.len(),
            "Selected scene"
        );

        if let Some(footprint) = &scene.footprint {
            if !footprint_contains(footprint, request.center) {
                warn!(
                    scene = %scene.id,
                    center = %request.center,
                    "Scene footprint does not cover the requested center"
                );
            }
        }

        let images = self.downloader.download(&scene, &request.bands, &self.cache_root).await?;

        Ok(Acquisition { scene, images, candidates })
    }

    fn criteria_for(&self, request: &AcquisitionRequest) -> SearchCriteria {
        let window = request
            .window
            .unwrap_or_else(|| DateWindow::preceding_months(Utc::now(), DEFAULT_LOOKBACK_MONTHS));
        let bbox = bbox_from_center(request.center, request.radius_km);
        let mut criteria = SearchCriteria::new(bbox, window, request.max_cloud_cover)
            .with_collection(request.collection.clone());
        if let Some(max_results) = request.max_results {
            criteria = criteria.with_max_results(max_results);
        }
        criteria
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbital_collector::{MemoryTransport, SigningPolicy};
    use orbital_core::models::GeoPoint;

    fn pipeline(transport: MemoryTransport) -> AcquisitionPipeline<MemoryTransport> {
        AcquisitionPipeline::new(
            transport,
            PipelineSettings {
                catalog_url: "https://catalog.example/search".to_string(),
                signing: SigningPolicy::disabled(),
                cache_root: PathBuf::from("/nonexistent"),
                deadline: Duration::from_secs(5),
            },
        )
    }

    #[test]
    fn test_default_window_is_recent() {
        let pipeline = pipeline(MemoryTransport::new());
        let request = AcquisitionRequest::new(GeoPoint::new(0.0, 0.0), 111.0, 20.0);

        let criteria = pipeline.criteria_for(&request);

        let span = criteria.window.to - criteria.window.from;
        assert!(span.num_days() >= 89 && span.num_days() <= 92, "span = {:?}", span);
        assert!((criteria.bbox.east - 1.0).abs() < 0.01);
        assert_eq!(criteria.limit(), 20);
    }

    #[test]
    fn test_request_limit_and_collection_pass_through() {
        let pipeline = pipeline(MemoryTransport::new());
        let request = AcquisitionRequest::new(GeoPoint::new(35.0, 139.0), 5.0, 10.0)
            .with_collection("landsat-c2-l2")
            .with_max_results(3);

        let criteria = pipeline.criteria_for(&request);

        assert_eq!(criteria.collection, "landsat-c2-l2");
        assert_eq!(criteria.limit(), 3);
    }
}
