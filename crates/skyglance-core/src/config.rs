use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Number of entries a weekday table must have.
pub const DAYS_IN_WEEK: usize = 7;

/// Longest forecast the dashboard will label (one full week of day cards).
pub const MAX_FORECAST_DAYS: u8 = 7;

/// Environment variable holding the OpenWeatherMap API key
pub const OPENWEATHER_KEY_ENV: &str = "SKYGLANCE_OPENWEATHER_KEY";
/// Environment variable holding the WeatherAPI.com API key
pub const WEATHERAPI_KEY_ENV: &str = "SKYGLANCE_WEATHERAPI_KEY";
/// Environment variable holding the Google Time Zone API key
pub const GOOGLE_KEY_ENV: &str = "SKYGLANCE_GOOGLE_KEY";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory
    #[serde(skip, default = "default_config_dir")]
    pub config_dir: PathBuf,

    /// Weather settings
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Clock display settings
    #[serde(default)]
    pub clock: ClockConfig,

    /// Upstream service endpoints
    #[serde(default)]
    pub services: ServiceConfig,
}

/// Temperature unit preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    /// Unit system name the weather APIs expect (`metric` / `imperial`)
    pub fn query_units(self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "metric",
            TemperatureUnit::Fahrenheit => "imperial",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }

    /// The other unit, for toggle buttons.
    pub fn toggled(self) -> Self {
        match self {
            TemperatureUnit::Celsius => TemperatureUnit::Fahrenheit,
            TemperatureUnit::Fahrenheit => TemperatureUnit::Celsius,
        }
    }
}

impl std::str::FromStr for TemperatureUnit {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "c" | "celsius" | "metric" => Ok(TemperatureUnit::Celsius),
            "f" | "fahrenheit" | "imperial" => Ok(TemperatureUnit::Fahrenheit),
            other => Err(format!("unknown temperature unit: {}", other)),
        }
    }
}

/// Which weather backend serves current conditions and forecasts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    OpenWeatherMap,
    WeatherApi,
}

impl ProviderKind {
    /// Environment variable the provider's API key is read from
    pub fn key_env(self) -> &'static str {
        match self {
            ProviderKind::OpenWeatherMap => OPENWEATHER_KEY_ENV,
            ProviderKind::WeatherApi => WEATHERAPI_KEY_ENV,
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openweathermap" | "owm" => Ok(ProviderKind::OpenWeatherMap),
            "weatherapi" => Ok(ProviderKind::WeatherApi),
            other => Err(format!("unknown weather provider: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Weather backend
    #[serde(default)]
    pub provider: ProviderKind,

    /// Temperature unit preference
    #[serde(default)]
    pub temperature_unit: TemperatureUnit,

    /// City shown when geolocation is unavailable
    #[serde(default = "default_fallback_city")]
    pub fallback_city: String,

    /// Number of forecast day cards after today
    #[serde(default = "default_forecast_days")]
    pub forecast_days: u8,

    /// Refresh interval in minutes
    #[serde(default = "default_refresh_minutes")]
    pub refresh_minutes: u32,
}

fn default_fallback_city() -> String {
    "Paris".to_string()
}

fn default_forecast_days() -> u8 {
    5
}

fn default_refresh_minutes() -> u32 {
    15
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            temperature_unit: TemperatureUnit::default(),
            fallback_city: default_fallback_city(),
            forecast_days: default_forecast_days(),
            refresh_minutes: default_refresh_minutes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockConfig {
    /// Render times as `1:05 PM` instead of `13:05`
    #[serde(default)]
    pub use_12_hour: bool,

    /// Day names, index 0 = Sunday
    #[serde(default = "default_weekday_names")]
    pub weekday_names: Vec<String>,
}

fn default_weekday_names() -> Vec<String> {
    [
        "Sunday",
        "Monday",
        "Tuesday",
        "Wednesday",
        "Thursday",
        "Friday",
        "Saturday",
    ]
    .iter()
    .map(|d| d.to_string())
    .collect()
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            use_12_hour: false,
            weekday_names: default_weekday_names(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_openweathermap_url")]
    pub openweathermap_url: String,

    #[serde(default = "default_weatherapi_url")]
    pub weatherapi_url: String,

    /// Google Time Zone API base URL
    #[serde(default = "default_timezone_url")]
    pub timezone_url: String,

    /// IP geolocation endpoint base URL
    #[serde(default = "default_geolocation_url")]
    pub geolocation_url: String,

    /// Per-request timeout applied to every upstream call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_openweathermap_url() -> String {
    "https://api.openweathermap.org".to_string()
}

fn default_weatherapi_url() -> String {
    "https://api.weatherapi.com".to_string()
}

fn default_timezone_url() -> String {
    "https://maps.googleapis.com".to_string()
}

fn default_geolocation_url() -> String {
    "http://ip-api.com".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            openweathermap_url: default_openweathermap_url(),
            weatherapi_url: default_weatherapi_url(),
            timezone_url: default_timezone_url(),
            geolocation_url: default_geolocation_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// API keys for the upstream services.
///
/// Keys are read from the environment and never written to the config file.
#[derive(Clone, Default)]
pub struct ApiKeys {
    pub openweathermap: Option<String>,
    pub weatherapi: Option<String>,
    pub google: Option<String>,
}

impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |k: &Option<String>| if k.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("ApiKeys")
            .field("openweathermap", &mask(&self.openweathermap))
            .field("weatherapi", &mask(&self.weatherapi))
            .field("google", &mask(&self.google))
            .finish()
    }
}

impl ApiKeys {
    /// Read all keys from their environment variables. Empty values count as unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Self {
            openweathermap: read(OPENWEATHER_KEY_ENV),
            weatherapi: read(WEATHERAPI_KEY_ENV),
            google: read(GOOGLE_KEY_ENV),
        }
    }

    /// Key for the given weather provider, if configured
    pub fn for_provider(&self, kind: ProviderKind) -> Option<&str> {
        match kind {
            ProviderKind::OpenWeatherMap => self.openweathermap.as_deref(),
            ProviderKind::WeatherApi => self.weatherapi.as_deref(),
        }
    }
}

fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("skyglance")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            weather: WeatherConfig::default(),
            clock: ClockConfig::default(),
            services: ServiceConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit file path, creating defaults there if missing
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config_dir = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(default_config_dir);

        if !config_path.exists() {
            let config = Self {
                config_dir,
                ..Self::default()
            };
            config.save_to(config_path)?;
            tracing::info!("Wrote default config to {}", config_path.display());
            return Ok(config);
        }

        let contents = std::fs::read_to_string(config_path)
            .context("Failed to read config file")?;

        let mut config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::Malformed(format!("{}: {}", config_path.display(), e)))?;
        config.config_dir = config_dir;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        Self::validated(Self::load()?)
    }

    /// Same as [`Config::load_validated`] for an explicit file path
    pub fn load_validated_from(config_path: &Path) -> Result<(Self, ValidationResult)> {
        Self::validated(Self::load_from(config_path)?)
    }

    fn validated(config: Self) -> Result<(Self, ValidationResult)> {
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    ///
    /// Returns a ValidationResult containing any errors or warnings.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(
            &self.services.openweathermap_url,
            "services.openweathermap_url",
            &mut result,
        );
        self.validate_url(
            &self.services.weatherapi_url,
            "services.weatherapi_url",
            &mut result,
        );
        self.validate_url(&self.services.timezone_url, "services.timezone_url", &mut result);
        self.validate_url(
            &self.services.geolocation_url,
            "services.geolocation_url",
            &mut result,
        );

        if self.services.request_timeout_secs == 0 {
            result.add_error(
                "services.request_timeout_secs",
                "Request timeout must be greater than 0",
            );
        }

        if self.clock.weekday_names.len() != DAYS_IN_WEEK {
            result.add_error(
                "clock.weekday_names",
                format!(
                    "Expected {} day names, got {}",
                    DAYS_IN_WEEK,
                    self.clock.weekday_names.len()
                ),
            );
        } else if self.clock.weekday_names.iter().any(|d| d.trim().is_empty()) {
            result.add_warning("clock.weekday_names", "Some day names are blank");
        }

        if self.weather.forecast_days == 0 || self.weather.forecast_days > MAX_FORECAST_DAYS {
            result.add_error(
                "weather.forecast_days",
                format!("Forecast days must be between 1 and {}", MAX_FORECAST_DAYS),
            );
        }

        if self.weather.fallback_city.trim().is_empty() {
            result.add_error("weather.fallback_city", "Fallback city must not be empty");
        }

        if self.weather.refresh_minutes == 0 {
            result.add_warning(
                "weather.refresh_minutes",
                "Weather refresh disabled (0 minutes)",
            );
        } else if self.weather.refresh_minutes > 1440 {
            result.add_warning(
                "weather.refresh_minutes",
                "Weather refresh interval is more than 24 hours",
            );
        }

        result
    }

    /// Validate a URL field
    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }

                if url.port() == Some(0) {
                    result.add_error(field_name, "Port cannot be 0");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to an explicit file path
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        std::fs::write(config_path, contents)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("skyglance");

        Ok(config_dir.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_default_config() {
        let config = Config::default();
        let result = config.validate();
        assert!(result.is_valid(), "Default config should be valid: {:?}", result.errors);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_invalid_url() {
        let mut config = Config::default();
        config.services.timezone_url = "not-a-url".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "services.timezone_url"));
    }

    #[test]
    fn test_invalid_url_scheme() {
        let mut config = Config::default();
        config.services.openweathermap_url = "ftp://localhost:8080".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_weekday_table_must_have_seven_entries() {
        let mut config = Config::default();
        config.clock.weekday_names.pop();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "clock.weekday_names"));
    }

    #[test]
    fn test_forecast_days_range() {
        let mut config = Config::default();
        config.weather.forecast_days = 0;
        assert!(!config.validate().is_valid());

        config.weather.forecast_days = 8;
        assert!(!config.validate().is_valid());

        config.weather.forecast_days = 7;
        assert!(config.validate().is_valid());
    }

    #[test]
    fn test_zero_refresh_is_warning() {
        let mut config = Config::default();
        config.weather.refresh_minutes = 0;
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "weather.refresh_minutes"));
    }

    #[test]
    fn test_empty_fallback_city_is_error() {
        let mut config = Config::default();
        config.weather.fallback_city = "  ".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
    }

    #[test]
    fn test_validation_result_error_summary() {
        let mut result = ValidationResult::default();
        result.add_error("field1", "error1");
        result.add_error("field2", "error2");
        let summary = result.error_summary();
        assert!(summary.contains("field1"));
        assert!(summary.contains("field2"));
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.config_dir, dir.path().join("nested"));
        assert_eq!(config.weather.fallback_city, "Paris");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[weather]\ntemperature_unit = \"fahrenheit\"\nprovider = \"weatherapi\"\n\n[clock]\nuse_12_hour = true\n",
        )
        .unwrap();

        let (config, _) = Config::load_validated_from(&path).unwrap();
        assert_eq!(config.weather.temperature_unit, TemperatureUnit::Fahrenheit);
        assert_eq!(config.weather.provider, ProviderKind::WeatherApi);
        assert!(config.clock.use_12_hour);
        assert_eq!(config.clock.weekday_names.len(), DAYS_IN_WEEK);
        assert_eq!(config.weather.forecast_days, 5);
    }

    #[test]
    fn test_load_validated_rejects_bad_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[clock]\nweekday_names = [\"Mon\", \"Tue\"]\n").unwrap();

        let err = Config::load_validated_from(&path).unwrap_err();
        assert!(err.to_string().contains("clock.weekday_names"));
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[weather\nprovider = 3\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::Malformed(_))
        ));
    }

    #[test]
    fn test_api_keys_ignore_blank_values() {
        let keys = ApiKeys::from_lookup(|name| match name {
            OPENWEATHER_KEY_ENV => Some("abc".to_string()),
            GOOGLE_KEY_ENV => Some("   ".to_string()),
            _ => None,
        });
        assert_eq!(keys.for_provider(ProviderKind::OpenWeatherMap), Some("abc"));
        assert_eq!(keys.for_provider(ProviderKind::WeatherApi), None);
        assert!(keys.google.is_none());
    }

    #[test]
    fn test_api_keys_debug_masks_values() {
        let keys = ApiKeys {
            openweathermap: Some("secret".to_string()),
            ..ApiKeys::default()
        };
        let rendered = format!("{:?}", keys);
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<set>"));
    }

    #[test]
    fn test_unit_parsing_and_toggle() {
        assert_eq!("F".parse::<TemperatureUnit>().unwrap(), TemperatureUnit::Fahrenheit);
        assert_eq!("metric".parse::<TemperatureUnit>().unwrap(), TemperatureUnit::Celsius);
        assert!("kelvin".parse::<TemperatureUnit>().is_err());
        assert_eq!(TemperatureUnit::Celsius.toggled(), TemperatureUnit::Fahrenheit);
        assert_eq!(TemperatureUnit::Fahrenheit.query_units(), "imperial");
    }
}
