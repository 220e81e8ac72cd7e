use chrono::{DateTime, Utc};
use orbital_core::models::{CatalogScene, ChangeRegion, Detection, GeoPoint, HealthStatus, LocalImageSet};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tabled::Tabled;

/// One ranked candidate in human output
#[derive(Debug, Tabled)]
pub struct SceneRow {
    #[tabled(rename = "#")]
    pub rank: usize,
    #[tabled(rename = "Scene")]
    pub id: String,
    #[tabled(rename = "Acquired")]
    pub acquired: String,
    #[tabled(rename = "Cloud %")]
    pub cloud_cover: String,
    #[tabled(rename = "GSD m")]
    pub gsd_m: String,
    #[tabled(rename = "Platform")]
    pub platform: String,
}

impl SceneRow {
    pub fn rows(scenes: &[CatalogScene]) -> Vec<Self> {
        scenes
            .iter()
            .enumerate()
            .map(|(i, scene)| SceneRow {
                rank: i + 1,
                id: scene.id.clone(),
                acquired: scene.acquired_at.format("%Y-%m-%d %H:%M").to_string(),
                cloud_cover: format!("{:.1}", scene.cloud_cover),
                gsd_m: format!("{:.0}", scene.gsd_m),
                platform: scene.platform.clone(),
            })
            .collect()
    }
}

/// Output for fetch command
#[derive(Debug, Serialize)]
pub struct FetchOutput {
    pub scene: SceneSummary,
    pub directory: PathBuf,
    pub bands: BTreeMap<String, PathBuf>,
    pub candidates: Vec<SceneSummary>,
}

#[derive(Debug, Serialize)]
pub struct SceneSummary {
    pub id: String,
    pub acquired_at: DateTime<Utc>,
    pub cloud_cover: f64,
    pub gsd_m: f64,
    pub platform: String,
    pub collection: String,
}

impl From<&CatalogScene> for SceneSummary {
    fn from(scene: &CatalogScene) -> Self {
        Self {
            id: scene.id.clone(),
            acquired_at: scene.acquired_at,
            cloud_cover: scene.cloud_cover,
            gsd_m: scene.gsd_m,
            platform: scene.platform.clone(),
            collection: scene.collection.clone(),
        }
    }
}

impl FetchOutput {
    pub fn new(scene: &CatalogScene, images: &LocalImageSet, candidates: &[CatalogScene]) -> Self {
        Self {
            scene: scene.into(),
            directory: images.directory.clone(),
            bands: images.bands.clone(),
            candidates: candidates.iter().map(SceneSummary::from).collect(),
        }
    }
}

/// One band file in human output
#[derive(Debug, Tabled)]
pub struct BandRow {
    #[tabled(rename = "Band")]
    pub band: String,
    #[tabled(rename = "File")]
    pub path: String,
}

impl BandRow {
    pub fn rows(images: &LocalImageSet) -> Vec<Self> {
        images
            .bands
            .iter()
            .map(|(band, path)| BandRow { band: band.clone(), path: path.display().to_string() })
            .collect()
    }
}

/// One detection in human output
#[derive(Debug, Tabled)]
pub struct DetectionRow {
    #[tabled(rename = "Class")]
    pub class_name: String,
    #[tabled(rename = "Conf")]
    pub confidence: String,
    #[tabled(rename = "Pixel box")]
    pub bbox: String,
    #[tabled(rename = "Size m")]
    pub size: String,
    #[tabled(rename = "Location")]
    pub location: String,
}

impl DetectionRow {
    pub fn rows(detections: &[Detection]) -> Vec<Self> {
        detections
            .iter()
            .map(|d| DetectionRow {
                class_name: d.class_name.clone(),
                confidence: format!("{:.2}", d.confidence),
                bbox: format!(
                    "{:.0},{:.0} - {:.0},{:.0}",
                    d.bbox.x_min, d.bbox.y_min, d.bbox.x_max, d.bbox.y_max
                ),
                size: match (d.estimated_length_m, d.estimated_width_m) {
                    (Some(l), Some(w)) => format!("{:.0} x {:.0}", l, w),
                    (Some(l), None) => format!("{:.0}", l),
                    _ => "-".to_string(),
                },
                location: location_text(d.geo_center),
            })
            .collect()
    }
}

/// Output for detect and search commands
#[derive(Debug, Serialize)]
pub struct DetectOutput {
    pub image: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene: Option<SceneSummary>,
    pub detections: Vec<Detection>,
    pub inference_time_ms: f32,
}

/// One change region in human output
#[derive(Debug, Tabled)]
pub struct ChangeRow {
    #[tabled(rename = "Change")]
    pub change_type: String,
    #[tabled(rename = "Conf")]
    pub confidence: String,
    #[tabled(rename = "Area m²")]
    pub area: String,
    #[tabled(rename = "Location")]
    pub location: String,
}

impl ChangeRow {
    pub fn rows(changes: &[ChangeRegion]) -> Vec<Self> {
        changes
            .iter()
            .map(|c| ChangeRow {
                change_type: c.change_type.clone(),
                confidence: format!("{:.2}", c.confidence),
                area: c.area_m2.map(|a| format!("{:.0}", a)).unwrap_or_else(|| "-".to_string()),
                location: location_text(c.geo_center),
            })
            .collect()
    }
}

/// Output for changes command
#[derive(Debug, Serialize)]
pub struct ChangesOutput {
    pub before: PathBuf,
    pub after: PathBuf,
    pub changes: Vec<ChangeRegion>,
    pub changed_fraction: f32,
    pub inference_time_ms: f32,
}

/// Output for health command
#[derive(Debug, Serialize)]
pub struct HealthOutput {
    pub address: String,
    #[serde(flatten)]
    pub status: HealthStatus,
}

/// Output for version command
#[derive(Debug, Serialize)]
pub struct VersionOutput {
    pub name: &'static str,
    pub version: &'static str,
}

/// One configuration entry
#[derive(Debug, Serialize, Tabled)]
pub struct ConfigEntry {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Source")]
    pub source: String,
}

fn location_text(point: Option<GeoPoint>) -> String {
    point.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string())
}
