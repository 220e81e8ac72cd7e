use chrono::{DateTime, Months, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use super::BoundingBox;

/// Collection searched when none is configured
pub const DEFAULT_COLLECTION: &str = "sentinel-2-l2a";

/// Result cap sent to the catalog when the caller does not set one
pub const DEFAULT_MAX_RESULTS: u32 = 20;

/// The true-color composite band
pub const TRUE_COLOR_BAND: &str = "visual";

/// Ground sample distance assumed for entries that omit `gsd` (Sentinel-2 native)
pub const DEFAULT_GSD_M: f64 = 10.0;

/// Imagery programs the collector knows how to query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImagerySource {
    #[default]
    Sentinel2,
    Landsat,
}

impl ImagerySource {
    /// STAC collection identifier for this source
    pub fn collection_id(&self) -> &'static str {
        match self {
            ImagerySource::Sentinel2 => DEFAULT_COLLECTION,
            ImagerySource::Landsat => "landsat-c2-l2",
        }
    }

    /// Bands that make up a true-color view for this source
    pub fn true_color_bands(&self) -> Vec<String> {
        match self {
            ImagerySource::Sentinel2 => vec![TRUE_COLOR_BAND.to_string()],
            ImagerySource::Landsat => {
                vec!["red".to_string(), "green".to_string(), "blue".to_string()]
            }
        }
    }
}

/// Acquisition time window `[from, to]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl DateWindow {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    /// The `months` calendar months ending at `now`
    pub fn preceding_months(now: DateTime<Utc>, months: u32) -> Self {
        let from = now.checked_sub_months(Months::new(months)).unwrap_or(now);
        Self { from, to: now }
    }

    /// STAC datetime range, e.g. `2024-01-01T00:00:00Z/2024-04-01T00:00:00Z`
    pub fn to_stac_interval(&self) -> String {
        format!(
            "{}/{}",
            self.from.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.to.to_rfc3339_opts(SecondsFormat::Secs, true)
        )
    }
}

/// Parameters of one catalog search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCriteria {
    pub bbox: BoundingBox,
    pub window: DateWindow,
    /// Cloud cover ceiling in percent
    pub max_cloud_cover: f64,
    pub max_results: Option<u32>,
    pub collection: String,
}

impl SearchCriteria {
    pub fn new(bbox: BoundingBox, window: DateWindow, max_cloud_cover: f64) -> Self {
        Self {
            bbox,
            window,
            max_cloud_cover,
            max_results: None,
            collection: DEFAULT_COLLECTION.to_string(),
        }
    }

    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = Some(max_results);
        self
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Effective result cap
    pub fn limit(&self) -> u32 {
        self.max_results.unwrap_or(DEFAULT_MAX_RESULTS)
    }
}

/// Remote reference to one band of a scene
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef {
    pub href: String,
    pub media_type: Option<String>,
}

/// One candidate image returned by the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogScene {
    /// Catalog-unique scene identifier
    pub id: String,

    /// Acquisition time; the Unix epoch when the catalog entry had none
    pub acquired_at: DateTime<Utc>,

    /// Cloud cover in percent
    pub cloud_cover: f64,

    /// Ground sample distance in meters
    pub gsd_m: f64,

    pub platform: String,

    pub collection: String,

    /// Scene footprint, when the catalog reports one
    pub footprint: Option<BoundingBox>,

    /// Band name to remote asset
    pub assets: BTreeMap<String, AssetRef>,
}

impl CatalogScene {
    pub fn asset(&self, band: &str) -> Option<&AssetRef> {
        self.assets.get(band)
    }

    pub fn band_names(&self) -> Vec<&str> {
        self.assets.keys().map(String::as_str).collect()
    }
}

/// How an asset URL was obtained
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SigningOutcome {
    /// The signing service returned a signed URL
    Signed,
    /// Signing is not configured for this catalog
    Unsigned,
    /// Signing was attempted and failed; the raw href is used as-is
    FellBackUnsigned { reason: String },
}

/// A directly fetchable URL for one band. Valid for a single download attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAsset {
    pub band: String,
    pub url: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub outcome: SigningOutcome,
}

/// Bands of one scene materialized under a cache root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalImageSet {
    pub scene_id: String,

    /// `<cacheRoot>/<sceneID>`
    pub directory: PathBuf,

    /// Band name to local file
    pub bands: BTreeMap<String, PathBuf>,
}

impl LocalImageSet {
    pub fn new(scene_id: impl Into<String>, directory: impl Into<PathBuf>) -> Self {
        Self { scene_id: scene_id.into(), directory: directory.into(), bands: BTreeMap::new() }
    }

    /// File name a band is stored under
    pub fn band_file_name(band: &str) -> String {
        format!("{}.tif", band)
    }

    /// Whether `name` can be used as a scene directory or band name
    ///
    /// Scene ids and band names come from the catalog; only a single normal
    /// path component keeps them inside `<cacheRoot>/<sceneID>`.
    pub fn is_cache_name(name: &str) -> bool {
        let mut components = Path::new(name).components();
        matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(part)), None) if part.to_str() == Some(name)
        )
    }

    /// Expected path of a band inside a scene directory
    pub fn band_path_in(directory: &Path, band: &str) -> PathBuf {
        directory.join(Self::band_file_name(band))
    }

    pub fn band(&self, band: &str) -> Option<&Path> {
        self.bands.get(band).map(PathBuf::as_path)
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }
}
