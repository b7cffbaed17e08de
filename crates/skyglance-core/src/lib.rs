pub mod app;
pub mod config;
pub mod error;

pub use app::App;
pub use config::{
    ApiKeys, ClockConfig, Config, ProviderKind, ServiceConfig, TemperatureUnit, ValidationResult,
    WeatherConfig, DAYS_IN_WEEK, MAX_FORECAST_DAYS,
};
pub use error::{AppError, ConfigError, NetworkError, WeatherError};

use anyhow::Result;

/// Initialize tracing/logging.
///
/// `RUST_LOG` wins when set; otherwise `default_level` (e.g. `"info"`) is used.
pub fn init(default_level: &str) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    tracing::debug!("Skyglance core initialized");
    Ok(())
}
