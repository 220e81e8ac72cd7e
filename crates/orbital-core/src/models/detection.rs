//! Request and response types of the remote detection service.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::PathBuf;

use super::GeoPoint;

/// Where the detection service reads the image from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSource {
    /// A path readable by the detection service
    Path(PathBuf),
    /// Encoded image bytes, base64 on the wire
    Bytes(#[serde(with = "base64_bytes")] Vec<u8>),
}

/// Object detection request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectRequest {
    pub image: ImageSource,

    /// Class names to keep; empty means every class
    #[serde(default)]
    pub target_classes: Vec<String>,

    pub confidence_threshold: f32,

    pub gsd_meters: f32,

    /// Geographic position of pixel (0, 0), enables geo-referenced detections
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_left: Option<GeoPoint>,
}

impl DetectRequest {
    pub fn new(image: ImageSource, confidence_threshold: f32, gsd_meters: f32) -> Self {
        Self { image, target_classes: Vec::new(), confidence_threshold, gsd_meters, top_left: None }
    }

    pub fn with_targets(mut self, targets: Vec<String>) -> Self {
        self.target_classes = targets;
        self
    }

    pub fn with_top_left(mut self, top_left: GeoPoint) -> Self {
        self.top_left = Some(top_left);
        self
    }
}

/// Pixel-space box, `(x_min, y_min)` is the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelBox {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub class_name: String,
    pub confidence: f32,
    pub bbox: PixelBox,
    #[serde(default)]
    pub estimated_length_m: Option<f32>,
    #[serde(default)]
    pub estimated_width_m: Option<f32>,
    #[serde(default)]
    pub geo_center: Option<GeoPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectResponse {
    #[serde(default)]
    pub detections: Vec<Detection>,
    pub inference_time_ms: f32,
}

/// Change detection between two co-located acquisitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRequest {
    pub before: PathBuf,
    pub after: PathBuf,
    /// 0 reports only strong changes, 1 reports everything
    pub sensitivity: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRegion {
    pub change_type: String,
    pub confidence: f32,
    pub bbox: PixelBox,
    #[serde(default)]
    pub area_m2: Option<f32>,
    #[serde(default)]
    pub geo_center: Option<GeoPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeResponse {
    #[serde(default)]
    pub changes: Vec<ChangeRegion>,
    /// Fraction of the image area that changed, in `[0, 1]`
    #[serde(default)]
    pub changed_fraction: f32,
    pub inference_time_ms: f32,
}

/// Readiness report of the detection service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub ready: bool,
    #[serde(default)]
    pub loaded_models: Vec<String>,
    #[serde(default)]
    pub gpu_memory_used_mb: Option<u64>,
    #[serde(default)]
    pub gpu_memory_total_mb: Option<u64>,
}

mod base64_bytes {
    use super::*;

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded.as_bytes()).map_err(serde::de::Error::custom)
    }
}
