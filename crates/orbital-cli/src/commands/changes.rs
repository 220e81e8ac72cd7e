use crate::cli::ChangesArgs;
use crate::config_loader::load_config_with_overrides;
use crate::errors;
use crate::output::OutputWriter;
use crate::output_types::{ChangeRow, ChangesOutput};
use crate::progress::{create_spinner, finish_error, finish_success};
use anyhow::{Context, Result};
use orbital_core::config::CliConfigOverrides;
use orbital_core::models::ChangeRequest;
use orbital_core::ports::Detector;
use std::path::{Path, PathBuf};

pub async fn execute(args: ChangesArgs, config_path: Option<&Path>, output: &OutputWriter) -> Result<()> {
    let before = existing_image(&args.before)?;
    let after = existing_image(&args.after)?;

    let config = load_config_with_overrides(
        config_path,
        CliConfigOverrides { detector_address: args.service.ai.clone(), ..Default::default() },
    )?;
    let detector = super::build_detector(&config)?;

    let request = ChangeRequest {
        before: before.clone(),
        after: after.clone(),
        sensitivity: args.sensitivity.clamp(0.0, 1.0),
    };

    let spinner = create_spinner("Comparing images...", output.is_json());
    let response = match detector.detect_changes(&request).await {
        Ok(response) => response,
        Err(e) => {
            finish_error(&spinner, "Change detection failed");
            return Err(e.into());
        }
    };
    finish_success(&spinner, &format!("{} changed regions", response.changes.len()));

    if output.is_json() {
        return output.result(ChangesOutput {
            before,
            after,
            changes: response.changes,
            changed_fraction: response.changed_fraction,
            inference_time_ms: response.inference_time_ms,
        });
    }

    output.section("Changes");
    output.table(ChangeRow::rows(&response.changes));
    output.kv("Changed area", format!("{:.1}%", response.changed_fraction * 100.0));
    Ok(())
}

fn existing_image(path: &Path) -> Result<PathBuf> {
    if !path.is_file() {
        return Err(errors::image_not_found(path).into());
    }
    path.canonicalize().with_context(|| format!("Failed to resolve {}", path.display()))
}
