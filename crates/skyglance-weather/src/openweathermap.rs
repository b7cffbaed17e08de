//! OpenWeatherMap backend (`/data/2.5/weather` and `/data/2.5/forecast`).

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Timelike};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use tracing::instrument;

use crate::error::ProviderError;
use crate::provider::{error_for_response, ProviderSettings, WeatherProvider};
use crate::types::{
    Coordinates, CurrentConditions, DayForecast, LocationQuery, TemperatureUnit, WeatherCondition,
    WindUnit,
};

const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";

/// Forecast entries are 3 hours apart, so 8 per day and 40 at most
const ENTRIES_PER_DAY: u32 = 8;
const MAX_ENTRIES: u32 = 40;

#[derive(Debug, Deserialize)]
struct OwmCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwmWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    #[serde(default)]
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwmWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwmCurrentResponse {
    coord: OwmCoord,
    weather: Vec<OwmWeather>,
    main: OwmMain,
    wind: OwmWind,
    timezone: Option<i32>,
    name: String,
}

#[derive(Debug, Deserialize)]
struct OwmForecastMain {
    temp_min: f64,
    temp_max: f64,
}

#[derive(Debug, Deserialize)]
struct OwmForecastEntry {
    dt: i64,
    main: OwmForecastMain,
    weather: Vec<OwmWeather>,
}

#[derive(Debug, Deserialize)]
struct OwmCity {
    #[serde(default)]
    timezone: i32,
}

#[derive(Debug, Deserialize)]
struct OwmForecastResponse {
    list: Vec<OwmForecastEntry>,
    city: OwmCity,
}

fn icon_url(icon: &str) -> String {
    format!("{}/{}@2x.png", ICON_BASE_URL, icon)
}

fn wind_unit(unit: TemperatureUnit) -> WindUnit {
    match unit {
        TemperatureUnit::Celsius => WindUnit::MetersPerSecond,
        TemperatureUnit::Fahrenheit => WindUnit::MilesPerHour,
    }
}

#[derive(Debug, Clone)]
pub struct OpenWeatherMapProvider {
    client: Arc<Client>,
    settings: ProviderSettings,
}

impl OpenWeatherMapProvider {
    pub fn new(settings: ProviderSettings) -> Result<Self, ProviderError> {
        let client = settings.build_client()?;
        Ok(Self { client, settings })
    }

    fn request(&self, endpoint: &str, query: &LocationQuery, unit: TemperatureUnit) -> RequestBuilder {
        let url = format!("{}/data/2.5/{}", self.settings.base_url, endpoint);
        let request = match query {
            LocationQuery::Coordinates(c) => self.client.get(&url).query(&[
                ("lat", c.latitude.to_string()),
                ("lon", c.longitude.to_string()),
            ]),
            LocationQuery::City(name) => self.client.get(&url).query(&[("q", name.as_str())]),
        };
        request.query(&[
            ("units", unit.query_units()),
            ("appid", self.settings.api_key.as_str()),
        ])
    }

    fn into_conditions(
        body: OwmCurrentResponse,
        unit: TemperatureUnit,
    ) -> Result<CurrentConditions, ProviderError> {
        let weather = body
            .weather
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Parse("response has no weather entry".into()))?;
        let coordinates = Coordinates::new(body.coord.lat, body.coord.lon)
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        Ok(CurrentConditions {
            location_name: body.name,
            coordinates,
            temperature: body.main.temp,
            unit,
            condition: WeatherCondition::from_owm_icon(&weather.icon),
            icon_url: Some(icon_url(&weather.icon)),
            description: weather.description,
            humidity: body.main.humidity,
            wind_speed: body.wind.speed,
            wind_unit: wind_unit(unit),
            utc_offset_seconds: body.timezone,
        })
    }

    /// Fold 3-hourly entries into one entry per local date.
    ///
    /// High/low span every entry of the date; description and icon come from
    /// the entry closest to local noon.
    fn aggregate_days(body: OwmForecastResponse) -> Vec<DayForecast> {
        struct Acc {
            high: f64,
            low: f64,
            noon_distance: u32,
            weather: Option<OwmWeather>,
        }

        let mut by_date: BTreeMap<NaiveDate, Acc> = BTreeMap::new();
        for entry in body.list {
            let Some(local) = DateTime::from_timestamp(entry.dt + i64::from(body.city.timezone), 0)
            else {
                tracing::debug!("Skipping forecast entry with bad timestamp {}", entry.dt);
                continue;
            };
            let noon_distance = local.hour().abs_diff(12);
            let acc = by_date.entry(local.date_naive()).or_insert(Acc {
                high: f64::MIN,
                low: f64::MAX,
                noon_distance: u32::MAX,
                weather: None,
            });
            acc.high = acc.high.max(entry.main.temp_max);
            acc.low = acc.low.min(entry.main.temp_min);
            if noon_distance < acc.noon_distance {
                if let Some(weather) = entry.weather.into_iter().next() {
                    acc.noon_distance = noon_distance;
                    acc.weather = Some(weather);
                }
            }
        }

        by_date
            .into_iter()
            .map(|(date, acc)| {
                let (description, condition, icon) = match acc.weather {
                    Some(w) => (
                        w.description,
                        WeatherCondition::from_owm_icon(&w.icon),
                        Some(icon_url(&w.icon)),
                    ),
                    None => (String::new(), WeatherCondition::default(), None),
                };
                DayForecast {
                    date,
                    high: acc.high,
                    low: acc.low,
                    description,
                    condition,
                    icon_url: icon,
                }
            })
            .collect()
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherMapProvider {
    fn name(&self) -> &'static str {
        "openweathermap"
    }

    #[instrument(skip(self), level = "info")]
    async fn fetch_current(
        &self,
        query: &LocationQuery,
        unit: TemperatureUnit,
    ) -> Result<CurrentConditions, ProviderError> {
        let response = self.request("weather", query, unit).send().await?;
        if !response.status().is_success() {
            return Err(error_for_response(response, query).await);
        }

        let body: OwmCurrentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;
        let conditions = Self::into_conditions(body, unit)?;
        tracing::debug!(
            "Current weather for {}: {} {}",
            conditions.location_name,
            conditions.temperature,
            unit.symbol()
        );
        Ok(conditions)
    }

    #[instrument(skip(self), level = "info")]
    async fn fetch_forecast(
        &self,
        query: &LocationQuery,
        unit: TemperatureUnit,
        days: u8,
    ) -> Result<Vec<DayForecast>, ProviderError> {
        let count = ((u32::from(days) + 1) * ENTRIES_PER_DAY).min(MAX_ENTRIES);
        let response = self
            .request("forecast", query, unit)
            .query(&[("cnt", count)])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(error_for_response(response, query).await);
        }

        let body: OwmForecastResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;
        let mut forecast = Self::aggregate_days(body);
        forecast.truncate(usize::from(days) + 1);
        Ok(forecast)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> OpenWeatherMapProvider {
        OpenWeatherMapProvider::new(ProviderSettings::new(
            server.uri(),
            "test_key",
            Duration::from_secs(5),
        ))
        .unwrap()
    }

    fn current_body() -> serde_json::Value {
        serde_json::json!({
            "coord": {"lon": 2.3488, "lat": 48.8534},
            "weather": [{"id": 500, "main": "Rain", "description": "light rain", "icon": "10d"}],
            "main": {"temp": 14.62, "feels_like": 14.1, "humidity": 82},
            "wind": {"speed": 4.12, "deg": 240},
            "timezone": 7200,
            "name": "Paris",
            "cod": 200
        })
    }

    // 2024-01-15 00:00 UTC
    const DAY_ONE: i64 = 1_705_276_800;

    fn forecast_entry(dt: i64, min: f64, max: f64, icon: &str, desc: &str) -> serde_json::Value {
        serde_json::json!({
            "dt": dt,
            "main": {"temp": (min + max) / 2.0, "temp_min": min, "temp_max": max},
            "weather": [{"description": desc, "icon": icon}]
        })
    }

    #[tokio::test]
    async fn test_fetch_current_by_coordinates() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("lat", "48.8567"))
            .and(query_param("lon", "2.3508"))
            .and(query_param("units", "metric"))
            .and(query_param("appid", "test_key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
            .mount(&server)
            .await;

        let query = LocationQuery::Coordinates(Coordinates::new(48.8567, 2.3508).unwrap());
        let current = provider(&server)
            .fetch_current(&query, TemperatureUnit::Celsius)
            .await
            .unwrap();

        assert_eq!(current.location_name, "Paris");
        assert_eq!(current.description, "light rain");
        assert_eq!(current.condition, WeatherCondition::Rain);
        assert_eq!(current.humidity, 82);
        assert_eq!(current.wind_unit, WindUnit::MetersPerSecond);
        assert_eq!(current.utc_offset_seconds, Some(7200));
        assert_eq!(
            current.icon_url.as_deref(),
            Some("https://openweathermap.org/img/wn/10d@2x.png")
        );
    }

    #[tokio::test]
    async fn test_fetch_current_by_city_imperial() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("q", "New York"))
            .and(query_param("units", "imperial"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
            .mount(&server)
            .await;

        let current = provider(&server)
            .fetch_current(&LocationQuery::City("New York".into()), TemperatureUnit::Fahrenheit)
            .await
            .unwrap();

        assert_eq!(current.unit, TemperatureUnit::Fahrenheit);
        assert_eq!(current.wind_unit, WindUnit::MilesPerHour);
    }

    #[tokio::test]
    async fn test_unknown_city_is_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "cod": "404", "message": "city not found"
            })))
            .mount(&server)
            .await;

        let result = provider(&server)
            .fetch_current(&LocationQuery::City("Atlantis".into()), TemperatureUnit::Celsius)
            .await;

        assert!(matches!(result, Err(ProviderError::LocationNotFound(q)) if q == "Atlantis"));
    }

    #[tokio::test]
    async fn test_bad_key_is_reported() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let result = provider(&server)
            .fetch_current(&LocationQuery::City("Paris".into()), TemperatureUnit::Celsius)
            .await;

        assert!(matches!(result, Err(ProviderError::InvalidApiKey)));
    }

    #[tokio::test]
    async fn test_missing_weather_entry_is_parse_error() {
        let server = MockServer::start().await;
        let mut body = current_body();
        body["weather"] = serde_json::json!([]);

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let result = provider(&server)
            .fetch_current(&LocationQuery::City("Paris".into()), TemperatureUnit::Celsius)
            .await;

        assert!(matches!(result, Err(ProviderError::Parse(_))));
    }

    #[tokio::test]
    async fn test_forecast_groups_by_local_date() {
        let server = MockServer::start().await;
        let hour = 3600;

        // Timezone +3h: 21:00 UTC on day one is already day two locally
        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .and(query_param("cnt", "24"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "list": [
                    forecast_entry(DAY_ONE + 3 * hour, 4.0, 6.0, "04d", "broken clouds"),
                    forecast_entry(DAY_ONE + 9 * hour, 7.0, 11.0, "01d", "clear sky"),
                    forecast_entry(DAY_ONE + 21 * hour, 2.0, 3.0, "01n", "clear sky"),
                    forecast_entry(DAY_ONE + 33 * hour, 8.0, 12.5, "10d", "light rain"),
                    forecast_entry(DAY_ONE + 45 * hour, 1.0, 2.0, "13n", "snow"),
                ],
                "city": {"name": "Moscow", "timezone": 3 * hour}
            })))
            .mount(&server)
            .await;

        let forecast = provider(&server)
            .fetch_forecast(&LocationQuery::City("Moscow".into()), TemperatureUnit::Celsius, 2)
            .await
            .unwrap();

        assert_eq!(forecast.len(), 3);
        assert_eq!(forecast[0].date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(forecast[0].high, 11.0);
        assert_eq!(forecast[0].low, 4.0);
        assert_eq!(forecast[0].description, "clear sky");

        assert_eq!(forecast[1].date, NaiveDate::from_ymd_opt(2024, 1, 16).unwrap());
        assert_eq!(forecast[1].high, 12.5);
        assert_eq!(forecast[1].low, 2.0);
        assert_eq!(forecast[1].condition, WeatherCondition::Rain);

        assert_eq!(forecast[2].date, NaiveDate::from_ymd_opt(2024, 1, 17).unwrap());
        assert_eq!(forecast[2].condition, WeatherCondition::Snow);
    }

    #[tokio::test]
    async fn test_forecast_server_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let result = provider(&server)
            .fetch_forecast(&LocationQuery::City("Paris".into()), TemperatureUnit::Celsius, 5)
            .await;

        let err = result.unwrap_err();
        assert!(matches!(err, ProviderError::Api { status: 503, .. }));
        assert!(err.is_retryable());
    }
}
