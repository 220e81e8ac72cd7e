use crate::cli::{parse_targets, DetectArgs};
use crate::config_loader::load_config_with_overrides;
use crate::errors;
use crate::output::OutputWriter;
use crate::output_types::{DetectOutput, DetectionRow};
use crate::progress::{create_spinner, finish_error, finish_success};
use anyhow::{Context, Result};
use orbital_core::config::CliConfigOverrides;
use orbital_core::models::{DetectRequest, ImageSource};
use orbital_core::ports::Detector;
use std::path::Path;

pub async fn execute(args: DetectArgs, config_path: Option<&Path>, output: &OutputWriter) -> Result<()> {
    if !args.image.is_file() {
        return Err(errors::image_not_found(&args.image).into());
    }
    // The detection service resolves paths on its own filesystem
    let image = args
        .image
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", args.image.display()))?;

    let config = load_config_with_overrides(
        config_path,
        CliConfigOverrides { detector_address: args.service.ai.clone(), ..Default::default() },
    )?;
    let detector = super::build_detector(&config)?;

    let request = DetectRequest::new(ImageSource::Path(image.clone()), args.confidence, args.gsd)
        .with_targets(parse_targets(&args.objects));

    let spinner = create_spinner("Running detection...", output.is_json());
    let response = match detector.detect(&request).await {
        Ok(response) => response,
        Err(e) => {
            finish_error(&spinner, "Detection failed");
            return Err(e.into());
        }
    };
    finish_success(
        &spinner,
        &format!("{} detections in {:.0} ms", response.detections.len(), response.inference_time_ms),
    );

    if output.is_json() {
        return output.result(DetectOutput {
            image,
            scene: None,
            detections: response.detections,
            inference_time_ms: response.inference_time_ms,
        });
    }

    output.section("Detections");
    output.table(DetectionRow::rows(&response.detections));
    Ok(())
}
