//! In-memory detector for development and testing.
//!
//! Serves a fixed set of detections and change regions, applying the request's
//! class and confidence filters the way the real service does.

use async_trait::async_trait;
use orbital_core::error::{OrbitalError, Result};
use orbital_core::models::{
    ChangeRegion, ChangeRequest, ChangeResponse, DetectRequest, DetectResponse, Detection,
    HealthStatus,
};
use orbital_core::ports::Detector;
use std::sync::{Arc, RwLock};

const MEMORY_ADDRESS: &str = "memory";

#[derive(Debug, Default)]
struct State {
    detections: Vec<Detection>,
    changes: Vec<ChangeRegion>,
    changed_fraction: f32,
    loaded_models: Vec<String>,
    offline: bool,
    detect_requests: Vec<DetectRequest>,
    change_requests: Vec<ChangeRequest>,
}

/// In-memory implementation of Detector
#[derive(Debug, Clone, Default)]
pub struct MemoryDetector {
    state: Arc<RwLock<State>>,
}

impl MemoryDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Detections every `detect` call draws from
    pub fn with_detections(self, detections: Vec<Detection>) -> Self {
        self.state.write().unwrap().detections = detections;
        self
    }

    pub fn with_changes(self, changes: Vec<ChangeRegion>, changed_fraction: f32) -> Self {
        {
            let mut state = self.state.write().unwrap();
            state.changes = changes;
            state.changed_fraction = changed_fraction;
        }
        self
    }

    pub fn with_models(self, models: Vec<String>) -> Self {
        self.state.write().unwrap().loaded_models = models;
        self
    }

    /// Make every call fail as if the service were down
    pub fn offline(self) -> Self {
        self.state.write().unwrap().offline = true;
        self
    }

    pub fn detect_requests(&self) -> Vec<DetectRequest> {
        self.state.read().unwrap().detect_requests.clone()
    }

    pub fn change_requests(&self) -> Vec<ChangeRequest> {
        self.state.read().unwrap().change_requests.clone()
    }

    fn ensure_online(&self) -> Result<()> {
        if self.state.read().unwrap().offline {
            return Err(OrbitalError::DetectorUnavailable {
                address: MEMORY_ADDRESS.to_string(),
                reason: "detector is offline".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Detector for MemoryDetector {
    async fn detect(&self, request: &DetectRequest) -> Result<DetectResponse> {
        self.ensure_online()?;
        let mut state = self.state.write().unwrap();
        state.detect_requests.push(request.clone());

        let detections = state
            .detections
            .iter()
            .filter(|d| d.confidence >= request.confidence_threshold)
            .filter(|d| {
                request.target_classes.is_empty()
                    || request.target_classes.iter().any(|c| c == &d.class_name)
            })
            .cloned()
            .collect();

        Ok(DetectResponse { detections, inference_time_ms: 0.0 })
    }

    async fn detect_changes(&self, request: &ChangeRequest) -> Result<ChangeResponse> {
        self.ensure_online()?;
        let mut state = self.state.write().unwrap();
        state.change_requests.push(request.clone());

        // sensitivity 1.0 reports everything, 0.0 only certain changes
        let floor = 1.0 - request.sensitivity;
        let changes = state.changes.iter().filter(|c| c.confidence >= floor).cloned().collect();

        Ok(ChangeResponse {
            changes,
            changed_fraction: state.changed_fraction,
            inference_time_ms: 0.0,
        })
    }

    async fn health(&self) -> Result<HealthStatus> {
        self.ensure_online()?;
        Ok(HealthStatus {
            ready: true,
            loaded_models: self.state.read().unwrap().loaded_models.clone(),
            gpu_memory_used_mb: None,
            gpu_memory_total_mb: None,
        })
    }

    fn address(&self) -> &str {
        MEMORY_ADDRESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbital_core::models::{ImageSource, PixelBox};
    use std::path::PathBuf;

    fn detection(class_name: &str, confidence: f32) -> Detection {
        Detection {
            class_name: class_name.to_string(),
            confidence,
            bbox: PixelBox { x_min: 0.0, y_min: 0.0, x_max: 10.0, y_max: 10.0 },
            estimated_length_m: None,
            estimated_width_m: None,
            geo_center: None,
        }
    }

    fn request() -> DetectRequest {
        DetectRequest::new(ImageSource::Path(PathBuf::from("/cache/S2A/visual.tif")), 0.5, 10.0)
    }

    #[tokio::test]
    async fn test_filters_by_confidence_and_class() {
        let detector = MemoryDetector::new().with_detections(vec![
            detection("vessel", 0.9),
            detection("vessel", 0.2),
            detection("aircraft", 0.8),
        ]);

        let all = detector.detect(&request()).await.unwrap();
        assert_eq!(all.detections.len(), 2);

        let vessels =
            detector.detect(&request().with_targets(vec!["vessel".to_string()])).await.unwrap();
        assert_eq!(vessels.detections.len(), 1);
        assert_eq!(vessels.detections[0].class_name, "vessel");

        assert_eq!(detector.detect_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_offline_detector() {
        let detector = MemoryDetector::new().offline();
        let err = detector.health().await.unwrap_err();
        assert!(matches!(err, OrbitalError::DetectorUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_change_sensitivity() {
        let region = |confidence| ChangeRegion {
            change_type: "construction".to_string(),
            confidence,
            bbox: PixelBox { x_min: 0.0, y_min: 0.0, x_max: 5.0, y_max: 5.0 },
            area_m2: Some(2500.0),
            geo_center: None,
        };
        let detector = MemoryDetector::new().with_changes(vec![region(0.9), region(0.3)], 0.02);
        let before = PathBuf::from("/a.tif");
        let after = PathBuf::from("/b.tif");

        let strict = detector
            .detect_changes(&ChangeRequest { before: before.clone(), after: after.clone(), sensitivity: 0.2 })
            .await
            .unwrap();
        assert_eq!(strict.changes.len(), 1);

        let loose = detector
            .detect_changes(&ChangeRequest { before, after, sensitivity: 1.0 })
            .await
            .unwrap();
        assert_eq!(loose.changes.len(), 2);
        assert_eq!(loose.changed_fraction, 0.02);
    }
}
