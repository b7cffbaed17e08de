//! Dashboard orchestration.
//!
//! Fetches current conditions, resolves the remote wall clock, and lines the
//! daily forecast up with weekday labels, pushing each part to a
//! [`RenderPort`]. Current-conditions failures abort a refresh; clock and
//! forecast failures degrade to a fallback and the refresh carries on.

use std::sync::Arc;

use chrono::Days;
use skyglance_core::Config;

use crate::clock::{
    format_timestamp, resolve_remote_wall_clock, rotate_weekdays, ClockError, FormattedTimestamp,
    Instant, TimezoneOffset, WeekdayTable,
};
use crate::error::{DashboardError, TimezoneError};
use crate::location::Geolocator;
use crate::provider::WeatherProvider;
use crate::render::{ForecastCard, RenderPort, Section, Unavailable};
use crate::timezone::TimezoneLookup;
use crate::types::{CurrentConditions, DayForecast, LocationQuery, TemperatureUnit};

/// Display settings and session state the dashboard runs with
#[derive(Debug, Clone)]
pub struct DashboardContext {
    pub weekday_table: WeekdayTable,
    pub use_12_hour: bool,
    /// Forecast cards shown after today
    pub forecast_days: u8,
    pub fallback_city: String,
    pub unit: TemperatureUnit,
}

impl DashboardContext {
    pub fn from_config(config: &Config) -> Result<Self, ClockError> {
        Ok(Self {
            weekday_table: WeekdayTable::new(config.clock.weekday_names.iter())?,
            use_12_hour: config.clock.use_12_hour,
            forecast_days: config.weather.forecast_days,
            fallback_city: config.weather.fallback_city.clone(),
            unit: config.weather.temperature_unit,
        })
    }
}

impl Default for DashboardContext {
    fn default() -> Self {
        Self {
            weekday_table: WeekdayTable::english(),
            use_12_hour: false,
            forecast_days: 5,
            fallback_city: "Paris".to_string(),
            unit: TemperatureUnit::Celsius,
        }
    }
}

/// Everything one refresh produced
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub current: CurrentConditions,
    pub clock: FormattedTimestamp,
    /// Remote wall clock the clock and cards were derived from
    pub wall_clock: Instant,
    pub cards: Vec<ForecastCard>,
}

pub struct Dashboard {
    provider: Arc<dyn WeatherProvider>,
    timezone: Option<Arc<dyn TimezoneLookup>>,
    geolocator: Arc<dyn Geolocator>,
    context: DashboardContext,
    last_query: Option<LocationQuery>,
}

impl Dashboard {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        timezone: Option<Arc<dyn TimezoneLookup>>,
        geolocator: Arc<dyn Geolocator>,
        context: DashboardContext,
    ) -> Self {
        Self {
            provider,
            timezone,
            geolocator,
            context,
            last_query: None,
        }
    }

    pub fn context(&self) -> &DashboardContext {
        &self.context
    }

    pub fn unit(&self) -> TemperatureUnit {
        self.context.unit
    }

    /// Location of the most recent refresh
    pub fn last_query(&self) -> Option<&LocationQuery> {
        self.last_query.as_ref()
    }

    /// Show weather where this device is, or at the fallback city when
    /// geolocation fails.
    pub async fn show_current_location(
        &mut self,
        renderer: &mut dyn RenderPort,
    ) -> Result<Snapshot, DashboardError> {
        let query = match self.geolocator.locate().await {
            Ok(coordinates) => LocationQuery::Coordinates(coordinates),
            Err(e) => {
                tracing::warn!(
                    "Geolocation failed, falling back to {}: {}",
                    self.context.fallback_city,
                    e
                );
                renderer.render_unavailable(&Unavailable::new(
                    Section::Location,
                    format!("Location unavailable; showing {}", self.context.fallback_city),
                ));
                LocationQuery::City(self.context.fallback_city.clone())
            }
        };
        self.refresh(query, renderer).await
    }

    /// Show weather for a city name. With `reset_unit` the search starts
    /// over in Celsius.
    pub async fn search_city(
        &mut self,
        name: &str,
        reset_unit: bool,
        renderer: &mut dyn RenderPort,
    ) -> Result<Snapshot, DashboardError> {
        let name = name.trim();
        if name.is_empty() {
            let err = DashboardError::EmptySearch;
            renderer.render_unavailable(&Unavailable::new(Section::Weather, err.user_message()));
            return Err(err);
        }

        if reset_unit && self.context.unit != TemperatureUnit::Celsius {
            self.context.unit = TemperatureUnit::Celsius;
            renderer.render_unit(TemperatureUnit::Celsius);
        }
        self.refresh(LocationQuery::City(name.to_string()), renderer)
            .await
    }

    /// Switch units and re-fetch the current location.
    pub async fn set_unit(
        &mut self,
        unit: TemperatureUnit,
        renderer: &mut dyn RenderPort,
    ) -> Result<Snapshot, DashboardError> {
        self.context.unit = unit;
        renderer.render_unit(unit);

        let query = self
            .last_query
            .clone()
            .unwrap_or_else(|| LocationQuery::City(self.context.fallback_city.clone()));
        self.refresh(query, renderer).await
    }

    pub async fn refresh(
        &mut self,
        query: LocationQuery,
        renderer: &mut dyn RenderPort,
    ) -> Result<Snapshot, DashboardError> {
        self.refresh_at(query, Instant::now(), renderer).await
    }

    /// [`Dashboard::refresh`] against a fixed reference instant.
    pub async fn refresh_at(
        &mut self,
        query: LocationQuery,
        now: Instant,
        renderer: &mut dyn RenderPort,
    ) -> Result<Snapshot, DashboardError> {
        let unit = self.context.unit;
        let current = match self.provider.fetch_current(&query, unit).await {
            Ok(current) => current,
            Err(e) => {
                tracing::error!("Current conditions for {} failed: {}", query, e);
                renderer.render_unavailable(&Unavailable::new(Section::Weather, e.user_message()));
                return Err(e.into());
            }
        };
        self.last_query = Some(query.clone());
        renderer.render_current(&current);

        let wall_clock = match self.resolve_offset(&current, now).await {
            Ok(offset) => resolve_remote_wall_clock(now, offset),
            Err(e) => {
                tracing::warn!("No offset for {}, showing local time: {}", current.location_name, e);
                renderer.render_unavailable(&Unavailable::new(
                    Section::Clock,
                    "Local time unavailable; showing this device's time",
                ));
                now.to_local_wall_clock()
            }
        };
        let clock = format_timestamp(
            wall_clock,
            &self.context.weekday_table,
            self.context.use_12_hour,
        );
        renderer.render_clock(&clock);

        let days = self.context.forecast_days;
        let forecast = match self.provider.fetch_forecast(&query, unit, days).await {
            Ok(forecast) => forecast,
            Err(e) => {
                tracing::warn!("Forecast for {} failed: {}", query, e);
                renderer.render_unavailable(&Unavailable::new(Section::Forecast, e.user_message()));
                Vec::new()
            }
        };
        let cards = align_forecast(
            wall_clock,
            &self.context.weekday_table,
            usize::from(days),
            &forecast,
        );
        renderer.render_forecast(&cards);

        Ok(Snapshot {
            current,
            clock,
            wall_clock,
            cards,
        })
    }

    /// Timezone service first, then the provider's own offset.
    async fn resolve_offset(
        &self,
        current: &CurrentConditions,
        now: Instant,
    ) -> Result<TimezoneOffset, TimezoneError> {
        if let Some(lookup) = &self.timezone {
            match lookup.lookup(current.coordinates, now).await {
                Ok(offset) => return Ok(offset),
                Err(e) => tracing::warn!("Timezone lookup failed: {}", e),
            }
        }
        current
            .utc_offset_seconds
            .map(|raw| TimezoneOffset::new(raw, 0))
            .ok_or(TimezoneError::NoOffset)
    }
}

/// Label the `count` days after `wall_clock`'s date and attach the forecast
/// for each date, if any.
pub fn align_forecast(
    wall_clock: Instant,
    table: &WeekdayTable,
    count: usize,
    forecast: &[DayForecast],
) -> Vec<ForecastCard> {
    let today = wall_clock.utc_date();
    rotate_weekdays(wall_clock, table, count)
        .into_iter()
        .enumerate()
        .map(|(i, day_name)| {
            let date = today.and_then(|d| d.checked_add_days(Days::new(i as u64 + 1)));
            let forecast = date.and_then(|d| forecast.iter().find(|f| f.date == d).cloned());
            ForecastCard {
                day_name,
                date,
                forecast,
            }
        })
        .collect()
}
