//! STAC item-search wire format.
//!
//! Only the fields the collector reads are modeled; everything else in a
//! feature is ignored by serde.

use chrono::{DateTime, Utc};
use orbital_core::models::{AssetRef, BoundingBox, CatalogScene, SearchCriteria, DEFAULT_GSD_M};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cloud cover assumed when a feature does not report one; ranks last
pub const UNKNOWN_CLOUD_COVER: f64 = 100.0;

const CLOUD_COVER_PROPERTY: &str = "properties.eo:cloud_cover";

/// POST body of `/search`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchBody {
    pub collections: Vec<String>,
    pub bbox: [f64; 4],
    pub datetime: String,
    pub limit: u32,
    pub query: SearchQuery,
    pub sortby: Vec<SortBy>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchQuery {
    #[serde(rename = "eo:cloud_cover")]
    pub cloud_cover: UpperBound,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpperBound {
    pub lte: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SortBy {
    pub field: String,
    pub direction: String,
}

impl SearchBody {
    pub fn from_criteria(criteria: &SearchCriteria) -> Self {
        Self {
            collections: vec![criteria.collection.clone()],
            bbox: criteria.bbox.to_array(),
            datetime: criteria.window.to_stac_interval(),
            limit: criteria.limit(),
            query: SearchQuery { cloud_cover: UpperBound { lte: criteria.max_cloud_cover } },
            sortby: vec![SortBy {
                field: CLOUD_COVER_PROPERTY.to_string(),
                direction: "asc".to_string(),
            }],
        }
    }
}

/// Response of `/search`
#[derive(Debug, Clone, Deserialize)]
pub struct ItemCollection {
    #[serde(default)]
    pub features: Vec<Item>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Item {
    pub id: String,
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default)]
    pub bbox: Option<Vec<f64>>,
    #[serde(default)]
    pub properties: ItemProperties,
    #[serde(default)]
    pub assets: BTreeMap<String, ItemAsset>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemProperties {
    #[serde(default)]
    pub datetime: Option<String>,
    #[serde(default, rename = "eo:cloud_cover")]
    pub cloud_cover: Option<f64>,
    #[serde(default)]
    pub gsd: Option<f64>,
    #[serde(default)]
    pub platform: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemAsset {
    pub href: String,
    #[serde(default, rename = "type")]
    pub media_type: Option<String>,
}

impl Item {
    /// Convert to the domain scene, filling catalog gaps with fixed defaults
    pub fn into_scene(self, fallback_collection: &str) -> CatalogScene {
        let acquired_at = self
            .properties
            .datetime
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_default();

        let assets = self
            .assets
            .into_iter()
            .map(|(band, asset)| (band, AssetRef { href: asset.href, media_type: asset.media_type }))
            .collect();

        CatalogScene {
            id: self.id,
            acquired_at,
            cloud_cover: self.properties.cloud_cover.unwrap_or(UNKNOWN_CLOUD_COVER),
            gsd_m: self.properties.gsd.unwrap_or(DEFAULT_GSD_M),
            platform: self.properties.platform.unwrap_or_default(),
            collection: self.collection.unwrap_or_else(|| fallback_collection.to_string()),
            footprint: self.bbox.as_deref().and_then(BoundingBox::from_slice),
            assets,
        }
    }
}
