use crate::cli::{parse_targets, SearchArgs};
use crate::config_loader::load_config_with_overrides;
use crate::errors::{self, CliError};
use crate::output::OutputWriter;
use crate::output_types::{DetectOutput, DetectionRow, SceneSummary};
use crate::progress::{create_spinner, finish_error, finish_success};
use anyhow::{Context, Result};
use orbital_core::config::CliConfigOverrides;
use orbital_core::models::{DetectRequest, ImageSource};
use orbital_core::ports::Detector;
use orbital_geo::bbox_from_center;
use orbital_pipeline::AcquisitionRequest;
use std::path::Path;

/// Fetch the best scene for a location, then run detection on its true-color image
pub async fn execute(args: SearchArgs, config_path: Option<&Path>, output: &OutputWriter) -> Result<()> {
    let Some(center) = args.location.center() else {
        return Err(errors::location_required("search").into());
    };

    let config = load_config_with_overrides(
        config_path,
        CliConfigOverrides { detector_address: args.service.ai.clone(), ..Default::default() },
    )?;
    let collection = config.collection.value.clone();
    let band = composite_band(&collection)?;
    let pipeline = super::build_pipeline(&config)?;
    let detector = super::build_detector(&config)?;

    let request = AcquisitionRequest::new(center, args.location.radius, args.location.cloud)
        .with_collection(collection)
        .with_bands(vec![band.clone()])
        .with_max_results(config.max_results.value);

    let spinner = create_spinner(&format!("Fetching imagery around {}...", center), output.is_json());
    let acquisition = match pipeline.fetch_best(&request).await {
        Ok(acquisition) => acquisition,
        Err(e) => {
            finish_error(&spinner, "Acquisition failed");
            return Err(e).context("Imagery acquisition failed");
        }
    };

    let image = acquisition
        .images
        .band(&band)
        .map(Path::to_path_buf)
        .with_context(|| format!("Scene {} has no {} image", acquisition.scene.id, band))?;

    spinner.set_message(format!("Running detection on {}...", acquisition.scene.id));
    // Pixel (0, 0) is taken as the north-west corner of the searched area
    let top_left = bbox_from_center(center, args.location.radius).north_west();
    let detect = DetectRequest::new(
        ImageSource::Path(image.clone()),
        args.confidence,
        acquisition.scene.gsd_m as f32,
    )
    .with_targets(parse_targets(&args.objects))
    .with_top_left(top_left);

    let response = match detector.detect(&detect).await {
        Ok(response) => response,
        Err(e) => {
            finish_error(&spinner, "Detection failed");
            return Err(e.into());
        }
    };
    finish_success(
        &spinner,
        &format!("{} detections in {}", response.detections.len(), acquisition.scene.id),
    );

    if output.is_json() {
        return output.result(DetectOutput {
            image,
            scene: Some(SceneSummary::from(&acquisition.scene)),
            detections: response.detections,
            inference_time_ms: response.inference_time_ms,
        });
    }

    output.kv("Scene", &acquisition.scene.id);
    output.kv("Acquired", acquisition.scene.acquired_at.format("%Y-%m-%d"));
    output.kv("Cloud cover", format!("{:.1}%", acquisition.scene.cloud_cover));
    output.info(format!("Image: {}", image.display()));
    output.section("Detections");
    output.table(DetectionRow::rows(&response.detections));
    Ok(())
}

/// The single true-color image detection runs on
///
/// Collections that only ship separate red/green/blue bands cannot be searched.
fn composite_band(collection: &str) -> std::result::Result<String, CliError> {
    let mut bands = super::source_for_collection(collection).true_color_bands();
    if bands.len() == 1 {
        if let Some(band) = bands.pop() {
            return Ok(band);
        }
    }

    Err(CliError::new("Collection has no true-color composite")
        .with_context(format!(
            "Detection needs one true-color image, but {} provides separate bands ({}).",
            collection,
            bands.join(", ")
        ))
        .with_suggestion("Search Sentinel-2 instead: ORBITAL_COLLECTION=sentinel-2-l2a")
        .with_suggestion("Or download the bands: orbital-eye fetch --source landsat --lat <LAT> --lon <LON>")
        .with_help("Run: orbital-eye config"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_uses_visual_composite() {
        assert_eq!(composite_band("sentinel-2-l2a").unwrap(), "visual");
    }

    #[test]
    fn test_landsat_is_rejected_up_front() {
        let err = composite_band("landsat-c2-l2").unwrap_err();
        assert_eq!(err.message, "Collection has no true-color composite");
        let context = err.context.unwrap();
        assert!(context.contains("landsat-c2-l2"));
        assert!(context.contains("red, green, blue"));
    }
}
