use orbital_collector::SigningPolicy;
use orbital_core::config::LayeredConfig;
use orbital_core::models::{
    CatalogScene, DateWindow, GeoPoint, ImagerySource, LocalImageSet, DEFAULT_COLLECTION,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Calendar months searched when the caller gives no date window
pub const DEFAULT_LOOKBACK_MONTHS: u32 = 3;

/// "Best recent image around this point"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionRequest {
    pub center: GeoPoint,

    /// Search radius around `center` in kilometers
    pub radius_km: f64,

    /// Cloud cover ceiling in percent
    pub max_cloud_cover: f64,

    /// Acquisition window; defaults to the months preceding the call
    pub window: Option<DateWindow>,

    /// Bands to download; empty means the true-color band
    pub bands: Vec<String>,

    pub collection: String,

    pub max_results: Option<u32>,
}

impl AcquisitionRequest {
    pub fn new(center: GeoPoint, radius_km: f64, max_cloud_cover: f64) -> Self {
        Self {
            center,
            radius_km,
            max_cloud_cover,
            window: None,
            bands: Vec::new(),
            collection: DEFAULT_COLLECTION.to_string(),
            max_results: None,
        }
    }

    pub fn with_window(mut self, window: DateWindow) -> Self {
        self.window = Some(window);
        self
    }

    pub fn with_bands(mut self, bands: Vec<String>) -> Self {
        self.bands = bands;
        self
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Search a source's collection and download its true-color bands
    pub fn with_source(self, source: ImagerySource) -> Self {
        self.with_collection(source.collection_id()).with_bands(source.true_color_bands())
    }

    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = Some(max_results);
        self
    }

    /// Human-readable summary used in "no imagery" errors and logs
    pub fn describe(&self, window: &DateWindow) -> String {
        format!(
            "{} within {} km, cloud <= {}%, {} in {}",
            self.center,
            self.radius_km,
            self.max_cloud_cover,
            window.to_stac_interval(),
            self.collection
        )
    }
}

/// Result of a successful acquisition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Acquisition {
    /// The selected scene, lowest cloud cover first
    pub scene: CatalogScene,

    /// Bands of `scene` on disk
    pub images: LocalImageSet,

    /// Every ranked candidate, `scene` included
    pub candidates: Vec<CatalogScene>,
}

/// Endpoints and limits the pipeline is built with
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub catalog_url: String,
    pub signing: SigningPolicy,
    pub cache_root: PathBuf,

    /// Bound on one whole `fetch_best` call
    pub deadline: Duration,
}

impl PipelineSettings {
    pub fn from_config(config: &LayeredConfig) -> Self {
        Self {
            catalog_url: config.catalog_url.value.clone(),
            signing: SigningPolicy {
                endpoint: config.signing_endpoint().map(str::to_string),
                strict: config.strict_signing.value,
            },
            cache_root: config.cache_dir.value.clone(),
            deadline: config.acquisition_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let request = AcquisitionRequest::new(GeoPoint::new(35.6, 139.7), 10.0, 20.0);
        assert!(request.window.is_none());
        assert!(request.bands.is_empty());
        assert_eq!(request.collection, "sentinel-2-l2a");
    }

    #[test]
    fn test_landsat_source() {
        let request = AcquisitionRequest::new(GeoPoint::new(35.6, 139.7), 10.0, 20.0)
            .with_source(ImagerySource::Landsat);
        assert_eq!(request.collection, "landsat-c2-l2");
        assert_eq!(request.bands, vec!["red", "green", "blue"]);
    }

    #[test]
    fn test_settings_from_default_config() {
        let settings = PipelineSettings::from_config(&LayeredConfig::with_defaults());
        assert_eq!(settings.cache_root, PathBuf::from("data/cache"));
        assert_eq!(settings.deadline, Duration::from_secs(600));
        assert!(!settings.signing.strict);
        assert!(settings.signing.endpoint.is_some());
    }
}
