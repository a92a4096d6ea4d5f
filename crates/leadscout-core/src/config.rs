//! Configuration management for LeadScout.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::backoff::BackoffPolicy;
use crate::error::{ConfigError, ConfigResult};
use crate::types::{City, Niche};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Main application configuration.
///
/// This is loaded from `~/.config/leadscout/leadscout.toml` (or platform
/// equivalent) unless an explicit path is given. If the default file doesn't
/// exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// What to collect and where to write it
    pub collection: CollectionConfig,
    /// Which data source to use
    pub source: SourceConfig,
    /// Google Places settings
    pub places: PlacesConfig,
    /// OpenStreetMap settings
    pub osm: OsmConfig,
    /// Retry policy for transient source failures
    pub backoff: BackoffConfig,
    /// Website email extraction settings
    pub email: EmailConfig,
}

impl AppConfig {
    /// Load configuration from the default location, falling back to defaults
    /// if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit path. A missing file is an error.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            });
        }

        tracing::debug!("Loading config from {}", path.display());
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `LEADSCOUT_GOOGLE_API_KEY` (or `GOOGLE_API_KEY`): Places API key
    /// - `LEADSCOUT_SOURCE`: `google` or `osm`
    /// - `LEADSCOUT_MAX_LEADS`: Override the global lead budget
    pub fn load_with_env(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(p) => Self::load_from(p)?,
            None => Self::load()?,
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from a variable lookup. Unparseable values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("LEADSCOUT_GOOGLE_API_KEY").or_else(|| lookup("GOOGLE_API_KEY"));
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            self.places.api_key = Some(key.trim().to_string());
            tracing::debug!("Override places.api_key from env");
        }

        if let Some(val) = lookup("LEADSCOUT_SOURCE") {
            if let Ok(kind) = val.parse() {
                self.source.kind = kind;
                tracing::debug!("Override source.kind from env: {}", kind);
            }
        }

        if let Some(val) = lookup("LEADSCOUT_MAX_LEADS") {
            if let Ok(max) = val.parse() {
                self.collection.max_leads = max;
                tracing::debug!("Override collection.max_leads from env: {}", max);
            }
        }
    }

    /// Check cross-field constraints before a run.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.source.kind == SourceKind::Google
            && self
                .places
                .api_key
                .as_deref()
                .map_or(true, |k| k.trim().is_empty())
        {
            return Err(ConfigError::MissingApiKey);
        }

        if self.collection.checkpoint_interval == 0 {
            return Err(ConfigError::InvalidValue {
                field: "collection.checkpoint_interval".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.source.country.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "source.country".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Save configuration to disk.
    ///
    /// Creates the parent directory if it doesn't exist.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let config_dir = path.parent().ok_or_else(|| ConfigError::InvalidValue {
            field: "config_path".to_string(),
            reason: "no parent directory".to_string(),
        })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Get the path to the default configuration file.
    ///
    /// Uses XDG base directories: `~/.config/leadscout/leadscout.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("com", "leadscout", "leadscout").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("leadscout.toml"))
    }
}

/// Collection scope, pacing and output locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    /// Niches to collect, walked in declaration order regardless of list order
    pub niches: Vec<Niche>,
    /// Cities to collect, walked in declaration order regardless of list order
    pub cities: Vec<City>,
    /// Global lead budget, including leads from resumed runs
    pub max_leads: usize,
    /// Whether to visit each website looking for an email address
    pub extract_emails: bool,
    /// Minimum delay between source API calls in milliseconds
    pub sleep_api_ms: u64,
    /// Minimum delay between website fetches in milliseconds
    pub sleep_web_ms: u64,
    /// Accepted leads between checkpoint saves
    pub checkpoint_interval: usize,
    /// CSV output file
    pub output_path: PathBuf,
    /// Checkpoint JSON file
    pub checkpoint_path: PathBuf,
}

impl CollectionConfig {
    /// API throttle interval.
    #[must_use]
    pub fn sleep_api(&self) -> Duration {
        Duration::from_millis(self.sleep_api_ms)
    }

    /// Website throttle interval.
    #[must_use]
    pub fn sleep_web(&self) -> Duration {
        Duration::from_millis(self.sleep_web_ms)
    }
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            niches: Niche::ALL.to_vec(),
            cities: City::ALL.to_vec(),
            max_leads: 1000,
            extract_emails: true,
            sleep_api_ms: 500,
            sleep_web_ms: 1000,
            checkpoint_interval: 100,
            output_path: PathBuf::from("outputs/leads_de_bw.csv"),
            checkpoint_path: PathBuf::from("outputs/checkpoint.json"),
        }
    }
}

/// Which data source backs a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Google Places Web Service (API key required)
    #[default]
    Google,
    /// OpenStreetMap Nominatim + Overpass
    Osm,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Google => f.write_str("google"),
            Self::Osm => f.write_str("osm"),
        }
    }
}

impl FromStr for SourceKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "google" | "places" => Ok(Self::Google),
            "osm" | "openstreetmap" => Ok(Self::Osm),
            other => Err(ConfigError::InvalidValue {
                field: "source.kind".to_string(),
                reason: format!("unknown source '{other}' (expected google or osm)"),
            }),
        }
    }
}

/// Data source selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Provider used for this run
    pub kind: SourceKind,
    /// Country appended to every city query
    pub country: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Google,
            country: "Germany".to_string(),
        }
    }
}

/// Google Places settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacesConfig {
    /// API key; prefer the environment over writing it to disk
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Base URL of the Maps web service
    pub base_url: String,
    /// Place Details field mask
    pub fields: Vec<String>,
    /// Delay before requesting a `next_page_token` page in milliseconds
    pub token_delay_ms: u64,
    /// Below this many text-search results the nearby search is also used
    pub min_text_results: usize,
    /// Nearby search radius in meters
    pub nearby_radius_m: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for PlacesConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://maps.googleapis.com/maps/api".to_string(),
            fields: [
                "place_id",
                "name",
                "formatted_address",
                "geometry/location",
                "formatted_phone_number",
                "international_phone_number",
                "website",
                "url",
                "rating",
                "user_ratings_total",
            ]
            .iter()
            .map(ToString::to_string)
            .collect(),
            token_delay_ms: 2000,
            min_text_results: 5,
            nearby_radius_m: 15_000,
            timeout_secs: 20,
        }
    }
}

/// OpenStreetMap settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OsmConfig {
    /// Nominatim base URL
    pub nominatim_url: String,
    /// Overpass interpreter endpoint
    pub overpass_url: String,
    /// User agent; Nominatim rejects anonymous clients
    pub user_agent: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for OsmConfig {
    fn default() -> Self {
        Self {
            nominatim_url: "https://nominatim.openstreetmap.org".to_string(),
            overpass_url: "https://overpass-api.de/api/interpreter".to_string(),
            user_agent: "LeadDatasetBuilder/1.0".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Exponential backoff settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    /// Delay before the first retry in milliseconds; doubles per retry
    pub base_delay_ms: u64,
    /// Retries after the initial attempt
    pub max_retries: u32,
}

impl BackoffConfig {
    /// Build the runtime policy.
    #[must_use]
    pub fn policy(&self) -> BackoffPolicy {
        BackoffPolicy::new(Duration::from_millis(self.base_delay_ms), self.max_retries)
    }
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 2000,
            max_retries: 5,
        }
    }
}

/// Website email extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    /// User agent sent with robots.txt and homepage requests
    pub user_agent: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            user_agent: "LeadDatasetBuilder/1.0".to_string(),
            timeout_secs: 6,
        }
    }
}
