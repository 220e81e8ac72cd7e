use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use orbital_core::models::{GeoPoint, ImagerySource};
use std::path::PathBuf;

/// Orbital Eye - Satellite imagery acquisition and analysis
#[derive(Parser, Debug)]
#[command(name = "orbital-eye")]
#[command(about = "Find, download, and analyze recent satellite imagery", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to ./orbital-eye.toml, then ~/.config/orbital-eye/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Show progress logs
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search the catalog and download the least cloudy recent scene
    Fetch(FetchArgs),

    /// Run object detection on a local image
    Detect(DetectArgs),

    /// Fetch the best scene for a location and run detection on it
    Search(SearchArgs),

    /// Compare two images of the same area for changes
    Changes(ChangesArgs),

    /// Check the detection service
    Health(HealthArgs),

    /// Print version information
    Version,

    /// Show the effective configuration and where each value comes from
    Config,
}

/// Area of interest shared by `fetch` and `search`
#[derive(Args, Debug, Clone)]
pub struct LocationArgs {
    /// Latitude of the center point in degrees
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub lat: f64,

    /// Longitude of the center point in degrees
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub lon: f64,

    /// Search radius in kilometers
    #[arg(long, default_value_t = 10.0)]
    pub radius: f64,

    /// Maximum cloud cover in percent
    #[arg(long, default_value_t = 20.0)]
    pub cloud: f64,
}

impl LocationArgs {
    /// The center point, or `None` when no location was given
    pub fn center(&self) -> Option<GeoPoint> {
        if self.lat == 0.0 && self.lon == 0.0 {
            None
        } else {
            Some(GeoPoint::new(self.lat, self.lon))
        }
    }
}

/// Detection service options shared by the detection commands
#[derive(Args, Debug, Clone)]
pub struct ServiceArgs {
    /// Detection service address (host:port or URL)
    #[arg(long, value_name = "ADDR")]
    pub ai: Option<String>,
}

#[derive(Parser, Debug)]
pub struct FetchArgs {
    #[command(flatten)]
    pub location: LocationArgs,

    /// Start of the acquisition window (YYYY-MM-DD, default three months ago)
    #[arg(long, value_parser = parse_date)]
    pub from: Option<DateTime<Utc>>,

    /// End of the acquisition window (YYYY-MM-DD, default now)
    #[arg(long, value_parser = parse_date)]
    pub to: Option<DateTime<Utc>>,

    /// Cache directory the scene is downloaded into
    #[arg(long, value_name = "DIR")]
    pub out: Option<PathBuf>,

    /// Imagery program to search
    #[arg(long, value_enum)]
    pub source: Option<SourceArg>,

    /// Bands to download, comma separated (default: true color)
    #[arg(long, value_delimiter = ',')]
    pub bands: Vec<String>,

    /// Maximum number of candidate scenes to consider
    #[arg(long, default_value_t = 10)]
    pub limit: u32,

    /// Only list the ranked candidates, download nothing
    #[arg(long)]
    pub list: bool,
}

#[derive(Parser, Debug)]
pub struct DetectArgs {
    /// Image to analyze
    #[arg(long)]
    pub image: PathBuf,

    /// Object classes to detect, comma separated, or "all"
    #[arg(long, default_value = "all")]
    pub objects: String,

    /// Minimum detection confidence (0-1)
    #[arg(long, default_value_t = 0.3)]
    pub confidence: f32,

    /// Ground sample distance of the image in meters
    #[arg(long, default_value_t = 10.0)]
    pub gsd: f32,

    #[command(flatten)]
    pub service: ServiceArgs,
}

#[derive(Parser, Debug)]
pub struct SearchArgs {
    #[command(flatten)]
    pub location: LocationArgs,

    /// Object classes to detect, comma separated, or "all"
    #[arg(long, default_value = "all")]
    pub objects: String,

    /// Minimum detection confidence (0-1)
    #[arg(long, default_value_t = 0.3)]
    pub confidence: f32,

    #[command(flatten)]
    pub service: ServiceArgs,
}

#[derive(Parser, Debug)]
pub struct ChangesArgs {
    /// Earlier image
    #[arg(long)]
    pub before: PathBuf,

    /// Later image of the same area
    #[arg(long)]
    pub after: PathBuf,

    /// Change sensitivity (0-1); higher reports weaker changes
    #[arg(long, default_value_t = 0.5)]
    pub sensitivity: f32,

    #[command(flatten)]
    pub service: ServiceArgs,
}

#[derive(Parser, Debug)]
pub struct HealthArgs {
    #[command(flatten)]
    pub service: ServiceArgs,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SourceArg {
    /// Sentinel-2 Level-2A (10 m)
    Sentinel2,
    /// Landsat Collection 2 Level-2 (30 m)
    Landsat,
}

impl From<SourceArg> for ImagerySource {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Sentinel2 => ImagerySource::Sentinel2,
            SourceArg::Landsat => ImagerySource::Landsat,
        }
    }
}

/// Parse `YYYY-MM-DD` as midnight UTC
pub fn parse_date(s: &str) -> Result<DateTime<Utc>, String> {
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD, got '{}': {}", s, e))?;
    Ok(date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc()).unwrap_or_default())
}

/// Split a `--objects` value into class names; "all" means no filter
pub fn parse_targets(objects: &str) -> Vec<String> {
    if objects.trim().eq_ignore_ascii_case("all") {
        return Vec::new();
    }
    objects
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_date_midnight_utc() {
        let dt = parse_date("2024-03-01").unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-03-01T00:00:00+00:00");
        assert!(parse_date("03/01/2024").is_err());
        assert!(parse_date("2024-02-30").is_err());
    }

    #[test]
    fn test_parse_targets() {
        assert!(parse_targets("all").is_empty());
        assert!(parse_targets(" ALL ").is_empty());
        assert_eq!(parse_targets("vessel, aircraft,"), vec!["vessel", "aircraft"]);
    }

    #[test]
    fn test_fetch_arguments() {
        let cli = Cli::parse_from([
            "orbital-eye",
            "fetch",
            "--lat",
            "-8.5069",
            "--lon",
            "115.2625",
            "--bands",
            "visual,B08",
            "--source",
            "landsat",
            "--from",
            "2024-01-01",
        ]);
        match cli.command {
            Commands::Fetch(args) => {
                assert_eq!(args.location.lat, -8.5069);
                assert_eq!(args.location.radius, 10.0);
                assert_eq!(args.location.cloud, 20.0);
                assert_eq!(args.bands, vec!["visual", "B08"]);
                assert!(matches!(args.source, Some(SourceArg::Landsat)));
                assert!(args.from.is_some());
                assert_eq!(args.limit, 10);
                assert!(!args.list);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_zero_location_is_missing() {
        let location = LocationArgs { lat: 0.0, lon: 0.0, radius: 10.0, cloud: 20.0 };
        assert!(location.center().is_none());
        let location = LocationArgs { lat: 0.0, lon: 12.0, ..location };
        assert_eq!(location.center(), Some(GeoPoint::new(0.0, 12.0)));
    }

    #[test]
    fn test_bad_date_is_usage_error() {
        let result = Cli::try_parse_from(["orbital-eye", "fetch", "--lat", "1", "--from", "soon"]);
        assert!(result.is_err());
    }
}
