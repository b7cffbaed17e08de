//! WeatherAPI.com backend (`/v1/current.json` and `/v1/forecast.json`).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use tracing::instrument;

use crate::error::ProviderError;
use crate::provider::{error_for_response, ProviderSettings, WeatherProvider};
use crate::types::{
    Coordinates, CurrentConditions, DayForecast, LocationQuery, TemperatureUnit, WeatherCondition,
    WindUnit,
};

/// Offsets are reported to the minute; real zones sit on quarter hours
const OFFSET_GRANULARITY_SECS: i64 = 900;

/// WeatherAPI.com caps forecasts at 14 days including today
const MAX_FORECAST_DAYS: u8 = 14;

#[derive(Debug, Deserialize)]
struct ApiLocation {
    name: String,
    lat: f64,
    lon: f64,
    localtime_epoch: Option<i64>,
    localtime: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiCondition {
    text: String,
    icon: String,
    code: i32,
}

#[derive(Debug, Deserialize)]
struct ApiCurrent {
    temp_c: f64,
    temp_f: f64,
    condition: ApiCondition,
    wind_kph: f64,
    wind_mph: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct ApiCurrentResponse {
    location: ApiLocation,
    current: ApiCurrent,
}

#[derive(Debug, Deserialize)]
struct ApiDay {
    maxtemp_c: f64,
    maxtemp_f: f64,
    mintemp_c: f64,
    mintemp_f: f64,
    condition: ApiCondition,
}

#[derive(Debug, Deserialize)]
struct ApiForecastDay {
    date: String,
    day: ApiDay,
}

#[derive(Debug, Deserialize)]
struct ApiForecast {
    forecastday: Vec<ApiForecastDay>,
}

#[derive(Debug, Deserialize)]
struct ApiForecastResponse {
    forecast: ApiForecast,
}

/// Icons come back protocol-relative (`//cdn.weatherapi.com/...`)
fn icon_url(icon: &str) -> Option<String> {
    if icon.is_empty() {
        None
    } else if icon.starts_with("//") {
        Some(format!("https:{}", icon))
    } else {
        Some(icon.to_string())
    }
}

/// Derive the UTC offset from the location's local time and epoch.
fn utc_offset_seconds(location: &ApiLocation) -> Option<i32> {
    let epoch = location.localtime_epoch?;
    let local = NaiveDateTime::parse_from_str(location.localtime.as_deref()?, "%Y-%m-%d %H:%M").ok()?;
    let raw = local.and_utc().timestamp() - epoch;
    let rounded = (raw as f64 / OFFSET_GRANULARITY_SECS as f64).round() as i64 * OFFSET_GRANULARITY_SECS;
    i32::try_from(rounded).ok()
}

fn pick(unit: TemperatureUnit, celsius: f64, fahrenheit: f64) -> f64 {
    match unit {
        TemperatureUnit::Celsius => celsius,
        TemperatureUnit::Fahrenheit => fahrenheit,
    }
}

#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    client: Arc<Client>,
    settings: ProviderSettings,
}

impl WeatherApiProvider {
    pub fn new(settings: ProviderSettings) -> Result<Self, ProviderError> {
        let client = settings.build_client()?;
        Ok(Self { client, settings })
    }

    fn request(&self, endpoint: &str, query: &LocationQuery) -> RequestBuilder {
        let q = match query {
            LocationQuery::Coordinates(c) => format!("{},{}", c.latitude, c.longitude),
            LocationQuery::City(name) => name.clone(),
        };
        self.client
            .get(format!("{}/v1/{}", self.settings.base_url, endpoint))
            .query(&[("key", self.settings.api_key.as_str()), ("q", q.as_str())])
    }

    fn into_conditions(
        body: ApiCurrentResponse,
        unit: TemperatureUnit,
    ) -> Result<CurrentConditions, ProviderError> {
        let utc_offset = utc_offset_seconds(&body.location);
        let coordinates = Coordinates::new(body.location.lat, body.location.lon)
            .map_err(|e| ProviderError::Parse(e.to_string()))?;
        let current = body.current;

        let (wind_speed, wind_unit) = match unit {
            TemperatureUnit::Celsius => (current.wind_kph, WindUnit::KilometersPerHour),
            TemperatureUnit::Fahrenheit => (current.wind_mph, WindUnit::MilesPerHour),
        };

        Ok(CurrentConditions {
            location_name: body.location.name,
            coordinates,
            temperature: pick(unit, current.temp_c, current.temp_f),
            unit,
            condition: WeatherCondition::from_weatherapi_code(current.condition.code),
            icon_url: icon_url(&current.condition.icon),
            description: current.condition.text,
            humidity: current.humidity,
            wind_speed,
            wind_unit,
            utc_offset_seconds: utc_offset,
        })
    }

    fn into_days(
        body: ApiForecastResponse,
        unit: TemperatureUnit,
    ) -> Result<Vec<DayForecast>, ProviderError> {
        body.forecast
            .forecastday
            .into_iter()
            .map(|entry| {
                let date = NaiveDate::parse_from_str(&entry.date, "%Y-%m-%d")
                    .map_err(|e| ProviderError::Parse(format!("Invalid date {}: {}", entry.date, e)))?;
                let day = entry.day;
                Ok(DayForecast {
                    date,
                    high: pick(unit, day.maxtemp_c, day.maxtemp_f),
                    low: pick(unit, day.mintemp_c, day.mintemp_f),
                    condition: WeatherCondition::from_weatherapi_code(day.condition.code),
                    icon_url: icon_url(&day.condition.icon),
                    description: day.condition.text,
                })
            })
            .collect()
    }
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    fn name(&self) -> &'static str {
        "weatherapi"
    }

    #[instrument(skip(self), level = "info")]
    async fn fetch_current(
        &self,
        query: &LocationQuery,
        unit: TemperatureUnit,
    ) -> Result<CurrentConditions, ProviderError> {
        let response = self.request("current.json", query).send().await?;
        if !response.status().is_success() {
            return Err(error_for_response(response, query).await);
        }

        let body: ApiCurrentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;
        Self::into_conditions(body, unit)
    }

    #[instrument(skip(self), level = "info")]
    async fn fetch_forecast(
        &self,
        query: &LocationQuery,
        unit: TemperatureUnit,
        days: u8,
    ) -> Result<Vec<DayForecast>, ProviderError> {
        let total_days = days.saturating_add(1).min(MAX_FORECAST_DAYS);
        let response = self
            .request("forecast.json", query)
            .query(&[("days", total_days.to_string().as_str()), ("aqi", "no"), ("alerts", "no")])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(error_for_response(response, query).await);
        }

        let body: ApiForecastResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;
        Self::into_days(body, unit)
    }
}
