use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::LocationError;

pub use skyglance_core::TemperatureUnit;

/// Unit a provider reports wind speed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindUnit {
    MetersPerSecond,
    KilometersPerHour,
    MilesPerHour,
}

impl WindUnit {
    pub fn label(self) -> &'static str {
        match self {
            WindUnit::MetersPerSecond => "m/s",
            WindUnit::KilometersPerHour => "km/h",
            WindUnit::MilesPerHour => "mph",
        }
    }
}

/// Weather condition categories, shared across providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    #[default]
    Clear,
    PartlyCloudy,
    Cloudy,
    Fog,
    Drizzle,
    Rain,
    Snow,
    Sleet,
    Thunderstorm,
}

impl WeatherCondition {
    /// Map an OpenWeatherMap icon code (`"10d"`, `"50n"`, ...)
    /// See: https://openweathermap.org/weather-conditions
    pub fn from_owm_icon(icon: &str) -> Self {
        match icon.get(..2).unwrap_or_default() {
            "01" => Self::Clear,
            "02" => Self::PartlyCloudy,
            "03" | "04" => Self::Cloudy,
            "09" => Self::Drizzle,
            "10" => Self::Rain,
            "11" => Self::Thunderstorm,
            "13" => Self::Snow,
            "50" => Self::Fog,
            _ => Self::Clear,
        }
    }

    /// Map a WeatherAPI.com condition code
    /// See: https://www.weatherapi.com/docs/weather_conditions.json
    pub fn from_weatherapi_code(code: i32) -> Self {
        match code {
            1000 => Self::Clear,
            1003 => Self::PartlyCloudy,
            1006 | 1009 => Self::Cloudy,
            1030 | 1135 | 1147 => Self::Fog,
            1072 | 1150 | 1153 | 1168 | 1171 => Self::Drizzle,
            1063 | 1180..=1201 | 1240..=1246 => Self::Rain,
            1069 | 1204..=1207 | 1237 | 1249..=1252 | 1261 | 1264 => Self::Sleet,
            1066 | 1114 | 1117 | 1210..=1225 | 1255 | 1258 => Self::Snow,
            1087 | 1273..=1282 => Self::Thunderstorm,
            _ => Self::Clear,
        }
    }

    /// Single-glyph symbol for text renderers
    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Clear => "☀",
            Self::PartlyCloudy => "⛅",
            Self::Cloudy => "☁",
            Self::Fog => "🌫",
            Self::Drizzle | Self::Rain => "🌧",
            Self::Snow | Self::Sleet => "🌨",
            Self::Thunderstorm => "⛈",
        }
    }
}

/// Geographic position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Build coordinates, rejecting values outside ±90 / ±180
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, LocationError> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(LocationError::InvalidCoordinates {
                latitude,
                longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4},{:.4}", self.latitude, self.longitude)
    }
}

/// What to ask a weather provider about
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    Coordinates(Coordinates),
    City(String),
}

impl fmt::Display for LocationQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationQuery::Coordinates(c) => write!(f, "{}", c),
            LocationQuery::City(name) => f.write_str(name),
        }
    }
}

/// Current weather conditions at one place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    /// Place name as reported by the provider
    pub location_name: String,
    pub coordinates: Coordinates,
    pub temperature: f64,
    pub unit: TemperatureUnit,
    pub description: String,
    pub condition: WeatherCondition,
    /// Relative humidity, percent
    pub humidity: u8,
    pub wind_speed: f64,
    pub wind_unit: WindUnit,
    pub icon_url: Option<String>,
    /// Provider-reported shift from UTC, when it sends one
    pub utc_offset_seconds: Option<i32>,
}

/// Daily forecast entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayForecast {
    pub date: NaiveDate,
    pub high: f64,
    pub low: f64,
    pub description: String,
    pub condition: WeatherCondition,
    pub icon_url: Option<String>,
}
