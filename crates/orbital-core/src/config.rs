use crate::error::{OrbitalError, Result};
use crate::models::{DEFAULT_COLLECTION, DEFAULT_MAX_RESULTS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Planetary Computer STAC search endpoint
pub const DEFAULT_CATALOG_URL: &str = "https://planetarycomputer.microsoft.com/api/stac/v1/search";

/// Planetary Computer SAS signing endpoint
pub const DEFAULT_SIGNING_URL: &str = "https://planetarycomputer.microsoft.com/api/sas/v1/sign";

pub const DEFAULT_DETECTOR_ADDRESS: &str = "localhost:50051";

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for Orbital Eye
///
/// Built once by the binary and threaded into each component's constructor.
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    /// STAC search endpoint
    pub catalog_url: ConfigValue<String>,
    /// Asset signing endpoint; empty disables signing
    pub signing_url: ConfigValue<String>,
    pub collection: ConfigValue<String>,
    pub cache_dir: ConfigValue<PathBuf>,
    pub detector_address: ConfigValue<String>,
    /// Bound on every single network round trip
    pub request_timeout_secs: ConfigValue<u64>,
    /// Bound on a whole fetch-best call
    pub acquisition_timeout_secs: ConfigValue<u64>,
    pub max_results: ConfigValue<u32>,
    /// Fail instead of falling back to the raw href when signing fails
    pub strict_signing: ConfigValue<bool>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            catalog_url: ConfigValue::new(DEFAULT_CATALOG_URL.to_string(), ConfigSource::Default),
            signing_url: ConfigValue::new(DEFAULT_SIGNING_URL.to_string(), ConfigSource::Default),
            collection: ConfigValue::new(DEFAULT_COLLECTION.to_string(), ConfigSource::Default),
            cache_dir: ConfigValue::new(PathBuf::from("data/cache"), ConfigSource::Default),
            detector_address: ConfigValue::new(
                DEFAULT_DETECTOR_ADDRESS.to_string(),
                ConfigSource::Default,
            ),
            request_timeout_secs: ConfigValue::new(60, ConfigSource::Default),
            acquisition_timeout_secs: ConfigValue::new(600, ConfigSource::Default),
            max_results: ConfigValue::new(DEFAULT_MAX_RESULTS, ConfigSource::Default),
            strict_signing: ConfigValue::new(false, ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| OrbitalError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read {}: {}", path.as_ref().display(), e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| OrbitalError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(url) = file_config.catalog_url {
            self.catalog_url.update(url, ConfigSource::File);
        }
        if let Some(url) = file_config.signing_url {
            self.signing_url.update(url, ConfigSource::File);
        }
        if let Some(collection) = file_config.collection {
            self.collection.update(collection, ConfigSource::File);
        }
        if let Some(dir) = file_config.cache_dir {
            self.cache_dir.update(dir, ConfigSource::File);
        }
        if let Some(address) = file_config.detector_address {
            self.detector_address.update(address, ConfigSource::File);
        }
        if let Some(secs) = file_config.request_timeout_secs {
            self.request_timeout_secs.update(secs, ConfigSource::File);
        }
        if let Some(secs) = file_config.acquisition_timeout_secs {
            self.acquisition_timeout_secs.update(secs, ConfigSource::File);
        }
        if let Some(max) = file_config.max_results {
            self.max_results.update(max, ConfigSource::File);
        }
        if let Some(strict) = file_config.strict_signing {
            self.strict_signing.update(strict, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from `ORBITAL_*` environment variables
    ///
    /// Unparseable values are logged and ignored.
    pub fn load_from_env(mut self) -> Self {
        if let Ok(url) = env::var("ORBITAL_CATALOG_URL") {
            self.catalog_url.update(url, ConfigSource::Environment);
        }
        if let Ok(url) = env::var("ORBITAL_SIGNING_URL") {
            self.signing_url.update(url, ConfigSource::Environment);
        }
        if let Ok(collection) = env::var("ORBITAL_COLLECTION") {
            self.collection.update(collection, ConfigSource::Environment);
        }
        if let Ok(dir) = env::var("ORBITAL_CACHE_DIR") {
            self.cache_dir.update(PathBuf::from(dir), ConfigSource::Environment);
        }
        if let Ok(address) = env::var("ORBITAL_DETECTOR_ADDRESS") {
            self.detector_address.update(address, ConfigSource::Environment);
        }
        if let Some(secs) = env_number::<u64>("ORBITAL_REQUEST_TIMEOUT") {
            self.request_timeout_secs.update(secs, ConfigSource::Environment);
        }
        if let Some(secs) = env_number::<u64>("ORBITAL_ACQUISITION_TIMEOUT") {
            self.acquisition_timeout_secs.update(secs, ConfigSource::Environment);
        }
        if let Some(max) = env_number::<u32>("ORBITAL_MAX_RESULTS") {
            self.max_results.update(max, ConfigSource::Environment);
        }
        if let Ok(flag) = env::var("ORBITAL_STRICT_SIGNING") {
            match parse_flag(&flag) {
                Ok(strict) => self.strict_signing.update(strict, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid ORBITAL_STRICT_SIGNING value '{}': expected true or false",
                    flag
                ),
            }
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(collection) = overrides.collection {
            self.collection.update(collection, ConfigSource::Cli);
        }
        if let Some(dir) = overrides.cache_dir {
            self.cache_dir.update(dir, ConfigSource::Cli);
        }
        if let Some(address) = overrides.detector_address {
            self.detector_address.update(address, ConfigSource::Cli);
        }
        if let Some(max) = overrides.max_results {
            self.max_results.update(max, ConfigSource::Cli);
        }
    }

    /// Signing endpoint, `None` when signing is disabled
    pub fn signing_endpoint(&self) -> Option<&str> {
        let url = self.signing_url.value.trim();
        if url.is_empty() {
            None
        } else {
            Some(url)
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.value)
    }

    pub fn acquisition_timeout(&self) -> Duration {
        Duration::from_secs(self.acquisition_timeout_secs.value)
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> BTreeMap<String, (String, ConfigSource)> {
        let mut map = BTreeMap::new();

        map.insert(
            "catalog_url".to_string(),
            (self.catalog_url.value.clone(), self.catalog_url.source),
        );
        map.insert(
            "signing_url".to_string(),
            (self.signing_url.value.clone(), self.signing_url.source),
        );
        map.insert(
            "collection".to_string(),
            (self.collection.value.clone(), self.collection.source),
        );
        map.insert(
            "cache_dir".to_string(),
            (self.cache_dir.value.display().to_string(), self.cache_dir.source),
        );
        map.insert(
            "detector_address".to_string(),
            (self.detector_address.value.clone(), self.detector_address.source),
        );
        map.insert(
            "request_timeout_secs".to_string(),
            (self.request_timeout_secs.value.to_string(), self.request_timeout_secs.source),
        );
        map.insert(
            "acquisition_timeout_secs".to_string(),
            (
                self.acquisition_timeout_secs.value.to_string(),
                self.acquisition_timeout_secs.source,
            ),
        );
        map.insert(
            "max_results".to_string(),
            (self.max_results.value.to_string(), self.max_results.source),
        );
        map.insert(
            "strict_signing".to_string(),
            (self.strict_signing.value.to_string(), self.strict_signing.source),
        );

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    catalog_url: Option<String>,
    signing_url: Option<String>,
    collection: Option<String>,
    cache_dir: Option<PathBuf>,
    detector_address: Option<String>,
    request_timeout_secs: Option<u64>,
    acquisition_timeout_secs: Option<u64>,
    max_results: Option<u32>,
    strict_signing: Option<bool>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub collection: Option<String>,
    pub cache_dir: Option<PathBuf>,
    pub detector_address: Option<String>,
    pub max_results: Option<u32>,
}

/// Parse a boolean flag from string
pub fn parse_flag(s: &str) -> Result<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(OrbitalError::ConfigInvalid {
            key: "flag".to_string(),
            reason: format!("Invalid boolean: {}. Use true or false", s),
        }),
    }
}

fn env_number<T: FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Invalid {} value '{}': expected a non-negative integer", key, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = LayeredConfig::with_defaults();
        assert_eq!(config.catalog_url.value, DEFAULT_CATALOG_URL);
        assert_eq!(config.catalog_url.source, ConfigSource::Default);
        assert_eq!(config.collection.value, "sentinel-2-l2a");
        assert_eq!(config.detector_address.value, "localhost:50051");
        assert_eq!(config.request_timeout(), Duration::from_secs(60));
        assert!(!config.strict_signing.value);
    }

    #[test]
    fn test_config_precedence() {
        let mut value = ConfigValue::new(100, ConfigSource::Default);

        value.update(200, ConfigSource::File);
        assert_eq!(value.value, 200);
        assert_eq!(value.source, ConfigSource::File);

        value.update(300, ConfigSource::Environment);
        assert_eq!(value.value, 300);

        value.update(400, ConfigSource::Cli);
        assert_eq!(value.value, 400);
        assert_eq!(value.source, ConfigSource::Cli);

        // Lower precedence should not override
        value.update(500, ConfigSource::File);
        assert_eq!(value.value, 400);
        assert_eq!(value.source, ConfigSource::Cli);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
catalog_url = "https://earth-search.aws.element84.com/v1/search"
signing_url = ""
cache_dir = "/var/cache/orbital"
request_timeout_secs = 15
strict_signing = true
"#
        )
        .unwrap();

        let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();

        assert_eq!(config.catalog_url.value, "https://earth-search.aws.element84.com/v1/search");
        assert_eq!(config.catalog_url.source, ConfigSource::File);
        assert_eq!(config.signing_endpoint(), None);
        assert_eq!(config.cache_dir.value, PathBuf::from("/var/cache/orbital"));
        assert_eq!(config.request_timeout(), Duration::from_secs(15));
        assert!(config.strict_signing.value);
        assert_eq!(config.collection.source, ConfigSource::Default);
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "max_results = \"many\"").unwrap();

        let err = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap_err();
        assert!(matches!(err, OrbitalError::ConfigInvalid { ref key, .. } if key == "file"));
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = LayeredConfig::with_defaults();

        config.update_from_cli(CliConfigOverrides {
            collection: Some("landsat-c2-l2".to_string()),
            cache_dir: None,
            detector_address: Some("gpu-box:50051".to_string()),
            max_results: None,
        });

        assert_eq!(config.collection.value, "landsat-c2-l2");
        assert_eq!(config.collection.source, ConfigSource::Cli);
        assert_eq!(config.detector_address.value, "gpu-box:50051");
        assert_eq!(config.cache_dir.source, ConfigSource::Default);
        assert_eq!(config.max_results.source, ConfigSource::Default);
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true").unwrap());
        assert!(parse_flag("YES").unwrap());
        assert!(!parse_flag("0").unwrap());
        assert!(parse_flag("maybe").is_err());
    }

    #[test]
    fn test_inspection_map() {
        let config = LayeredConfig::with_defaults();
        let map = config.to_inspection_map();

        assert_eq!(map.len(), 9);
        let (collection, source) = &map["collection"];
        assert_eq!(collection, "sentinel-2-l2a");
        assert_eq!(*source, ConfigSource::Default);
    }
}
