//! Errors surfaced to the person at the terminal.
//!
//! Crates keep their own detailed error enums and convert into [`AppError`]
//! at the edge. `user_message()` is the one-line text shown on screen.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Weather(#[from] WeatherError),
}

impl AppError {
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Network(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::Weather(e) => e.user_message(),
        }
    }
}

/// Transport failures talking to a weather, timezone or location service
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("request timed out")]
    Timeout,

    #[error("could not reach service: {0}")]
    Unreachable(String),

    #[error("unreadable response body: {0}")]
    Decode(String),
}

impl NetworkError {
    /// Sort a reqwest failure by what the user can do about it.
    pub fn classify(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() || err.is_body() {
            Self::Decode(err.to_string())
        } else {
            Self::Unreachable(err.to_string())
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::Timeout => "The weather service took too long to answer.",
            NetworkError::Unreachable(_) => {
                "No connection to the weather service. Are you online?"
            }
            NetworkError::Decode(_) => "The weather service sent something unreadable.",
        }
    }
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        Self::classify(&err)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file is not valid TOML: {0}")]
    Malformed(String),

    #[error("config rejected: {0}")]
    Invalid(String),

    /// Holds the environment variable that should carry the key
    #[error("no API key in {0}")]
    MissingApiKey(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Malformed(_) | ConfigError::Invalid(_) => {
                "The config file has errors. Run `skyglance config validate`."
            }
            ConfigError::MissingApiKey(_) => {
                "No API key for the selected weather provider. Set its SKYGLANCE_*_KEY variable."
            }
        }
    }
}

/// Weather lookups that reached the provider and failed there
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("no weather for {0:?}")]
    LocationNotFound(String),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("API key rejected")]
    KeyRejected,

    #[error("request quota exhausted")]
    RateLimited,

    #[error("provider unavailable")]
    Unavailable,
}

impl WeatherError {
    pub fn user_message(&self) -> &'static str {
        match self {
            WeatherError::LocationNotFound(_) => {
                "No weather found for that place. Check the spelling."
            }
            WeatherError::Provider(_) => "The weather service returned an error. Try again shortly.",
            WeatherError::KeyRejected => "The weather service rejected the API key.",
            WeatherError::RateLimited => {
                "Too many weather requests. Wait a minute before refreshing."
            }
            WeatherError::Unavailable => "The weather service is unavailable right now.",
        }
    }
}
