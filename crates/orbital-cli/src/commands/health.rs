use crate::cli::HealthArgs;
use crate::config_loader::load_config_with_overrides;
use crate::errors;
use crate::output::OutputWriter;
use crate::output_types::HealthOutput;
use anyhow::Result;
use console::style;
use orbital_core::config::CliConfigOverrides;
use orbital_core::ports::Detector;
use std::path::Path;
use std::time::Duration;

const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn execute(args: HealthArgs, config_path: Option<&Path>, output: &OutputWriter) -> Result<()> {
    let config = load_config_with_overrides(
        config_path,
        CliConfigOverrides { detector_address: args.service.ai.clone(), ..Default::default() },
    )?;
    let detector = super::build_detector(&config)?;
    let address = detector.address().to_string();

    let status = match tokio::time::timeout(HEALTH_TIMEOUT, detector.health()).await {
        Ok(result) => result?,
        Err(_) => {
            return Err(errors::detector_unavailable(
                &address,
                &format!("no answer within {} s", HEALTH_TIMEOUT.as_secs()),
            )
            .into());
        }
    };

    if output.is_json() {
        return output.result(HealthOutput { address, status });
    }

    output.kv("Address", &address);
    let ready = if status.ready { style("ready").green().bold() } else { style("not ready").red().bold() };
    output.kv("Status", ready);
    if status.loaded_models.is_empty() {
        output.kv("Models", "-");
    } else {
        output.kv("Models", status.loaded_models.join(", "));
    }
    if let (Some(used), Some(total)) = (status.gpu_memory_used_mb, status.gpu_memory_total_mb) {
        output.kv("GPU memory", format!("{} / {} MB", used, total));
    }
    Ok(())
}
