//! Weather provider abstraction.
//!
//! Each backend implements [`WeatherProvider`] once; the dashboard only ever
//! talks to the trait object.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use skyglance_core::{ApiKeys, Config, ProviderKind};

use crate::error::ProviderError;
use crate::openweathermap::OpenWeatherMapProvider;
use crate::types::{CurrentConditions, DayForecast, LocationQuery, TemperatureUnit};
use crate::weatherapi::WeatherApiProvider;

pub(crate) const USER_AGENT: &str = concat!("Skyglance/", env!("CARGO_PKG_VERSION"));

/// Source of current conditions and daily forecasts
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Short provider name for logs
    fn name(&self) -> &'static str;

    /// Current conditions at `query`, in `unit`
    async fn fetch_current(
        &self,
        query: &LocationQuery,
        unit: TemperatureUnit,
    ) -> Result<CurrentConditions, ProviderError>;

    /// Daily forecast at `query`, one entry per local date, starting with today.
    ///
    /// `days` counts the days wanted after today; providers may return fewer.
    async fn fetch_forecast(
        &self,
        query: &LocationQuery,
        unit: TemperatureUnit,
        days: u8,
    ) -> Result<Vec<DayForecast>, ProviderError>;
}

/// Connection settings shared by the HTTP providers
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl ProviderSettings {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            timeout,
        }
    }

    pub(crate) fn build_client(&self) -> Result<Arc<Client>, reqwest::Error> {
        let client = Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Arc::new(client))
    }
}

/// Construct the provider selected in config.
///
/// Fails with [`ProviderError::MissingApiKey`] when the provider's key isn't set.
pub fn build_provider(
    kind: ProviderKind,
    config: &Config,
    keys: &ApiKeys,
) -> Result<Arc<dyn WeatherProvider>, ProviderError> {
    let api_key = keys
        .for_provider(kind)
        .ok_or(ProviderError::MissingApiKey(kind.key_env()))?;
    let timeout = Duration::from_secs(config.services.request_timeout_secs);

    let provider: Arc<dyn WeatherProvider> = match kind {
        ProviderKind::OpenWeatherMap => Arc::new(OpenWeatherMapProvider::new(
            ProviderSettings::new(&config.services.openweathermap_url, api_key, timeout),
        )?),
        ProviderKind::WeatherApi => Arc::new(WeatherApiProvider::new(ProviderSettings::new(
            &config.services.weatherapi_url,
            api_key,
            timeout,
        ))?),
    };

    tracing::info!("Using weather provider: {}", provider.name());
    Ok(provider)
}

/// Read a non-success response into a classified error
pub(crate) async fn error_for_response(
    response: reqwest::Response,
    query: &LocationQuery,
) -> ProviderError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    tracing::debug!("Provider returned {} for {}: {}", status, query, body);
    ProviderError::from_status(status, body, &query.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_provider_requires_key() {
        let config = Config::default();
        let keys = ApiKeys::default();
        let err = build_provider(ProviderKind::WeatherApi, &config, &keys)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            ProviderError::MissingApiKey(skyglance_core::config::WEATHERAPI_KEY_ENV)
        ));
    }

    #[test]
    fn test_build_provider_picks_backend() {
        let config = Config::default();
        let keys = ApiKeys {
            openweathermap: Some("owm".into()),
            weatherapi: Some("wapi".into()),
            google: None,
        };
        let owm = build_provider(ProviderKind::OpenWeatherMap, &config, &keys).unwrap();
        assert_eq!(owm.name(), "openweathermap");
        let wapi = build_provider(ProviderKind::WeatherApi, &config, &keys).unwrap();
        assert_eq!(wapi.name(), "weatherapi");
    }

    #[test]
    fn test_settings_trim_trailing_slash() {
        let settings = ProviderSettings::new("http://localhost:1234/", "k", Duration::from_secs(1));
        assert_eq!(settings.base_url, "http://localhost:1234");
    }
}
