use crate::cli::FetchArgs;
use crate::config_loader::load_config_with_overrides;
use crate::errors::{self, CliError};
use crate::output::OutputWriter;
use crate::output_types::{BandRow, FetchOutput, SceneRow, SceneSummary};
use crate::progress::{create_spinner, finish_error, finish_success};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use orbital_core::config::CliConfigOverrides;
use orbital_core::error::OrbitalError;
use orbital_core::models::{DateWindow, ImagerySource};
use orbital_pipeline::{AcquisitionRequest, DEFAULT_LOOKBACK_MONTHS};
use std::path::Path;

pub async fn execute(args: FetchArgs, config_path: Option<&Path>, output: &OutputWriter) -> Result<()> {
    let Some(center) = args.location.center() else {
        return Err(errors::location_required("fetch").into());
    };

    let source = args.source.map(ImagerySource::from);
    let config = load_config_with_overrides(
        config_path,
        CliConfigOverrides {
            collection: source.map(|s| s.collection_id().to_string()),
            cache_dir: args.out.clone(),
            ..Default::default()
        },
    )?;

    let collection = config.collection.value.clone();
    let bands = if args.bands.is_empty() {
        source.unwrap_or_else(|| super::source_for_collection(&collection)).true_color_bands()
    } else {
        args.bands.clone()
    };

    let mut request = AcquisitionRequest::new(center, args.location.radius, args.location.cloud)
        .with_collection(collection)
        .with_bands(bands)
        .with_max_results(args.limit);
    if let Some(window) = acquisition_window(args.from, args.to, Utc::now())? {
        request = request.with_window(window);
    }

    let pipeline = super::build_pipeline(&config)?;

    if args.list {
        let spinner = create_spinner(&format!("Searching imagery around {}...", center), output.is_json());
        let candidates = match pipeline.search(&request).await {
            Ok(candidates) => candidates,
            Err(e) => {
                finish_error(&spinner, "Search failed");
                return Err(e).context("Catalog search failed");
            }
        };
        finish_success(&spinner, &format!("{} candidate scenes", candidates.len()));

        if output.is_json() {
            return output.result(candidates.iter().map(SceneSummary::from).collect::<Vec<_>>());
        }
        output.section("Candidates");
        output.table(SceneRow::rows(&candidates));
        return Ok(());
    }

    let spinner = create_spinner(&format!("Searching imagery around {}...", center), output.is_json());
    let acquisition = match pipeline.fetch_best(&request).await {
        Ok(acquisition) => acquisition,
        Err(OrbitalError::PartialDownload(partial)) => {
            finish_error(&spinner, "Download incomplete");
            if !partial.succeeded.is_empty() {
                output.warning(format!(
                    "Kept bands of {} in {}: {}",
                    partial.scene_id,
                    partial.image_set.directory.display(),
                    partial.succeeded.join(", ")
                ));
            }
            return Err(OrbitalError::PartialDownload(partial)).context("Imagery acquisition failed");
        }
        Err(e) => {
            finish_error(&spinner, "Acquisition failed");
            return Err(e).context("Imagery acquisition failed");
        }
    };
    finish_success(&spinner, &format!("Downloaded {}", acquisition.scene.id));

    if output.is_json() {
        return output.result(FetchOutput::new(
            &acquisition.scene,
            &acquisition.images,
            &acquisition.candidates,
        ));
    }

    output.section("Candidates");
    output.table(SceneRow::rows(&acquisition.candidates));

    output.section("Bands");
    output.table(BandRow::rows(&acquisition.images));

    output.kv("Scene", &acquisition.scene.id);
    output.kv("Cloud cover", format!("{:.1}%", acquisition.scene.cloud_cover));
    output.kv("Directory", acquisition.images.directory.display());
    output.success("Imagery ready");

    Ok(())
}

/// Explicit window from `--from`/`--to`, `None` when neither is given
///
/// A missing end defaults to `now`; a missing start to three months before the end.
fn acquisition_window(
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<Option<DateWindow>> {
    if from.is_none() && to.is_none() {
        return Ok(None);
    }

    let to = to.unwrap_or(now);
    let from = from.unwrap_or_else(|| DateWindow::preceding_months(to, DEFAULT_LOOKBACK_MONTHS).from);
    if from > to {
        return Err(CliError::new("Invalid date range")
            .with_context(format!("--from {} is after --to {}", from.date_naive(), to.date_naive()))
            .with_suggestion("Swap the dates or drop one of them")
            .into());
    }

    Ok(Some(DateWindow::new(from, to)))
}
