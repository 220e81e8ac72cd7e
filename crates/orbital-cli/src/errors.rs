use console::style;
use orbital_core::error::OrbitalError;
use std::fmt;
use std::path::Path;

/// Enhanced error type with suggestions
pub struct CliError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
    pub help_command: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), context: None, suggestions: Vec::new(), help_command: None }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_help(mut self, command: impl Into<String>) -> Self {
        self.help_command = Some(command.into());
        self
    }

    /// Print to stderr, as one JSON object in JSON mode
    pub fn display(&self, json: bool) {
        if json {
            let output = serde_json::json!({
                "status": "error",
                "message": self.message,
                "context": self.context,
                "suggestions": self.suggestions,
            });
            eprintln!("{}", output);
            return;
        }

        eprintln!("{} {}\n", style("✗").red().bold(), style(&self.message).red().bold());

        if let Some(ref context) = self.context {
            eprintln!("{}", context);
            eprintln!();
        }

        if !self.suggestions.is_empty() {
            eprintln!("{}", style("To fix this:").yellow().bold());
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, suggestion);
            }
            eprintln!();
        }

        if let Some(ref help_cmd) = self.help_command {
            eprintln!("{} {}", style("Need help?").cyan(), style(help_cmd).cyan().bold());
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Create error for a missing `--lat/--lon`
pub fn location_required(command: &str) -> CliError {
    CliError::new("Location required")
        .with_context("Both --lat and --lon are zero; no area of interest was given.")
        .with_suggestion(format!("Pass a center point: orbital-eye {} --lat 35.45 --lon 139.80", command))
        .with_help(format!("Run: orbital-eye {} --help", command))
}

/// Create error for a missing input image
pub fn image_not_found(path: &Path) -> CliError {
    CliError::new("Image file not found")
        .with_context(format!("The specified image does not exist.\n\nPath: {}", path.display()))
        .with_suggestion("Check the file path and try again")
        .with_suggestion("Download a scene first: orbital-eye fetch --lat <LAT> --lon <LON>")
}

/// Create error for an unreachable detection service
pub fn detector_unavailable(address: &str, reason: &str) -> CliError {
    CliError::new("Detection service unavailable")
        .with_context(format!("Could not reach the detection service.\n\nAddress: {}\nError: {}", address, reason))
        .with_suggestion("Start the detection service")
        .with_suggestion("Or point to another instance: --ai host:port")
        .with_suggestion("Or set ORBITAL_DETECTOR_ADDRESS")
        .with_help("Run: orbital-eye health")
}

/// Create error for an unreachable catalog
pub fn catalog_unavailable(endpoint: &str, reason: &str) -> CliError {
    CliError::new("Imagery catalog unavailable")
        .with_context(format!("The STAC catalog could not be reached.\n\nEndpoint: {}\nError: {}", endpoint, reason))
        .with_suggestion("Check your network connection")
        .with_suggestion("Or set another catalog: ORBITAL_CATALOG_URL")
        .with_help("Run: orbital-eye config")
}

/// Create error for an empty search result
pub fn no_imagery(query: &str) -> CliError {
    CliError::new("No imagery found")
        .with_context(format!("The catalog returned no scenes.\n\nQuery: {}", query))
        .with_suggestion("Allow more clouds: --cloud 50")
        .with_suggestion("Widen the window: --from YYYY-MM-DD")
        .with_suggestion("Or enlarge the area: --radius 25")
}

/// Create error for invalid configuration
pub fn invalid_config(key: &str, reason: &str) -> CliError {
    CliError::new(format!("Invalid configuration: {}", key))
        .with_context(format!("Configuration value is invalid.\n\nReason: {}", reason))
        .with_suggestion("Check orbital-eye.toml for syntax errors")
        .with_suggestion("Check ORBITAL_* environment variables")
        .with_help("Run: orbital-eye config")
}

/// Convert anyhow::Error to CliError with context
pub fn from_anyhow(error: anyhow::Error) -> CliError {
    let error = match error.downcast::<CliError>() {
        Ok(cli_error) => return cli_error,
        Err(error) => error,
    };

    let outer = error.to_string();
    let Some(orbital) = error.chain().find_map(|e| e.downcast_ref::<OrbitalError>()) else {
        let chain: Vec<String> = error.chain().skip(1).map(|e| e.to_string()).collect();
        let cli_error = CliError::new(outer);
        return if chain.is_empty() { cli_error } else { cli_error.with_context(chain.join("\n")) };
    };

    match orbital {
        OrbitalError::CatalogUnavailable { endpoint, reason } => catalog_unavailable(endpoint, reason),
        OrbitalError::NoImageryFound { query } => no_imagery(query),
        OrbitalError::DetectorUnavailable { address, reason } => {
            detector_unavailable(address, reason)
        }
        OrbitalError::ConfigInvalid { key, reason } => invalid_config(key, reason),
        OrbitalError::PartialDownload(partial) => CliError::new(outer)
            .with_context(partial.to_string())
            .with_suggestion("Run the same command again; bands already on disk are not fetched twice"),
        OrbitalError::Timeout { .. } => CliError::new(outer)
            .with_context(orbital.to_string())
            .with_suggestion("Raise the limit: ORBITAL_ACQUISITION_TIMEOUT=<seconds>"),
        other => CliError::new(outer).with_context(other.to_string()),
    }
}
