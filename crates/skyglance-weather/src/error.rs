//! Weather-crate error types.

use skyglance_core::{AppError, ConfigError, NetworkError, WeatherError};
use thiserror::Error;

/// Location service errors
#[derive(Debug, Error)]
pub enum LocationError {
    #[error("Location service unavailable: {0}")]
    Unavailable(String),

    #[error("Location request timed out")]
    Timeout,

    #[error("Invalid coordinates: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Weather provider errors
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("No API key configured (set {0})")]
    MissingApiKey(&'static str),

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Location not found: {0}")]
    LocationNotFound(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl ProviderError {
    /// Whether trying again later could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited | Self::Network(_) => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Short message for the "data unavailable" display
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::MissingApiKey(env) => ConfigError::MissingApiKey(env.to_string()).user_message(),
            Self::Network(e) => NetworkError::classify(e).user_message(),
            other => other.weather_error().user_message(),
        }
    }

    /// Provider-side failure as the user sees it. Transport and setup
    /// failures land on `Unavailable` and `KeyRejected`.
    fn weather_error(&self) -> WeatherError {
        match self {
            Self::MissingApiKey(_) | Self::InvalidApiKey => WeatherError::KeyRejected,
            Self::LocationNotFound(query) => WeatherError::LocationNotFound(query.clone()),
            Self::RateLimited => WeatherError::RateLimited,
            Self::Network(_) => WeatherError::Unavailable,
            Self::Api { status, message } => WeatherError::Provider(format!("{status}: {message}")),
            Self::Parse(message) => WeatherError::Provider(message.clone()),
        }
    }

    /// Classify a non-success HTTP response.
    pub(crate) fn from_status(status: reqwest::StatusCode, body: String, query: &str) -> Self {
        match status.as_u16() {
            401 => Self::InvalidApiKey,
            404 => Self::LocationNotFound(query.to_string()),
            429 => Self::RateLimited,
            code => Self::Api {
                status: code,
                message: body,
            },
        }
    }
}

impl From<ProviderError> for WeatherError {
    fn from(e: ProviderError) -> Self {
        e.weather_error()
    }
}

impl From<ProviderError> for AppError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::MissingApiKey(env) => ConfigError::MissingApiKey(env.to_string()).into(),
            ProviderError::Network(e) => NetworkError::from(e).into(),
            other => other.weather_error().into(),
        }
    }
}

/// Timezone lookup errors
#[derive(Debug, Error)]
pub enum TimezoneError {
    #[error("Timezone service returned status {status}: {message}")]
    Status { status: String, message: String },

    #[error("No UTC offset available for this location")]
    NoOffset,

    #[error("HTTP {0}")]
    Http(u16),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Dashboard operation errors
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("Enter a city name")]
    EmptySearch,

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl DashboardError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::EmptySearch => "Enter a city name",
            Self::Provider(e) => e.user_message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            ProviderError::from_status(StatusCode::UNAUTHORIZED, String::new(), "x"),
            ProviderError::InvalidApiKey
        ));
        assert!(matches!(
            ProviderError::from_status(StatusCode::NOT_FOUND, String::new(), "Atlantis"),
            ProviderError::LocationNotFound(q) if q == "Atlantis"
        ));
        assert!(matches!(
            ProviderError::from_status(StatusCode::TOO_MANY_REQUESTS, String::new(), "x"),
            ProviderError::RateLimited
        ));
        assert!(matches!(
            ProviderError::from_status(StatusCode::BAD_GATEWAY, "oops".into(), "x"),
            ProviderError::Api { status: 502, .. }
        ));
    }

    #[test]
    fn test_is_retryable() {
        assert!(ProviderError::RateLimited.is_retryable());
        assert!(ProviderError::Api {
            status: 503,
            message: String::new()
        }
        .is_retryable());
        assert!(!ProviderError::InvalidApiKey.is_retryable());
        assert!(!ProviderError::LocationNotFound("x".into()).is_retryable());
    }

    #[test]
    fn test_core_error_mapping() {
        let core: WeatherError = ProviderError::InvalidApiKey.into();
        assert!(matches!(core, WeatherError::KeyRejected));

        let core: WeatherError = ProviderError::LocationNotFound("Nowhere".into()).into();
        assert!(matches!(core, WeatherError::LocationNotFound(ref q) if q == "Nowhere"));

        let core: WeatherError = ProviderError::Api {
            status: 502,
            message: "bad gateway".into(),
        }
        .into();
        assert_eq!(core.to_string(), "provider error: 502: bad gateway");
    }

    #[test]
    fn test_app_error_mapping() {
        let app: AppError = ProviderError::MissingApiKey("SKYGLANCE_OPENWEATHER_KEY").into();
        assert!(matches!(
            app,
            AppError::Config(ConfigError::MissingApiKey(ref env)) if env == "SKYGLANCE_OPENWEATHER_KEY"
        ));

        let app: AppError = ProviderError::RateLimited.into();
        assert!(matches!(app, AppError::Weather(WeatherError::RateLimited)));
    }

    #[test]
    fn test_user_message_matches_app_error() {
        let errors = [
            ProviderError::MissingApiKey("SKYGLANCE_WEATHERAPI_KEY"),
            ProviderError::InvalidApiKey,
            ProviderError::RateLimited,
            ProviderError::LocationNotFound("x".into()),
            ProviderError::Parse("bad".into()),
        ];
        for err in errors {
            let message = err.user_message();
            let app: AppError = err.into();
            assert_eq!(message, app.user_message());
        }
    }

    #[tokio::test]
    async fn test_slow_provider_maps_to_network_timeout() {
        use std::time::Duration;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .unwrap();
        let err = ProviderError::from(client.get(server.uri()).send().await.unwrap_err());
        let message = err.user_message();

        let app: AppError = err.into();
        assert!(matches!(app, AppError::Network(NetworkError::Timeout)));
        assert_eq!(message, app.user_message());
    }
}
