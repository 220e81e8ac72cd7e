//! Command implementations

mod changes;
mod config;
mod detect;
mod fetch;
mod health;
mod search;
mod version;

use crate::cli::{Cli, Commands};
use crate::output::OutputWriter;
use anyhow::Result;
use orbital_collector::ReqwestTransport;
use orbital_core::config::LayeredConfig;
use orbital_core::models::ImagerySource;
use orbital_detector::HttpDetector;
use orbital_pipeline::{AcquisitionPipeline, PipelineSettings};

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Fetch(args) => fetch::execute(args, config_path, &output).await,
        Commands::Detect(args) => detect::execute(args, config_path, &output).await,
        Commands::Search(args) => search::execute(args, config_path, &output).await,
        Commands::Changes(args) => changes::execute(args, config_path, &output).await,
        Commands::Health(args) => health::execute(args, config_path, &output).await,
        Commands::Version => version::execute(&output),
        Commands::Config => config::execute(config_path, &output),
    }
}

/// Acquisition pipeline over the network, configured from `config`
fn build_pipeline(config: &LayeredConfig) -> Result<AcquisitionPipeline<ReqwestTransport>> {
    let transport = ReqwestTransport::new(config.request_timeout())?;
    Ok(AcquisitionPipeline::new(transport, PipelineSettings::from_config(config)))
}

fn build_detector(config: &LayeredConfig) -> Result<HttpDetector> {
    Ok(HttpDetector::new(config.detector_address.value.clone(), config.request_timeout())?)
}

/// Imagery program behind a collection id
fn source_for_collection(collection: &str) -> ImagerySource {
    if collection == ImagerySource::Landsat.collection_id() {
        ImagerySource::Landsat
    } else {
        ImagerySource::Sentinel2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbital_core::models::DEFAULT_COLLECTION;

    #[test]
    fn test_source_for_collection() {
        assert_eq!(source_for_collection("landsat-c2-l2"), ImagerySource::Landsat);
        assert_eq!(source_for_collection(DEFAULT_COLLECTION), ImagerySource::Sentinel2);
    }
}
