//! Rendering port.
//!
//! The dashboard decides what to show; a [`RenderPort`] decides how. The
//! terminal front end implements it, and tests record calls through it.

use std::fmt;

use chrono::NaiveDate;

use crate::clock::FormattedTimestamp;
use crate::types::{CurrentConditions, DayForecast, TemperatureUnit};

/// One forecast slot: a weekday label and the forecast for that date, if the
/// provider returned one.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastCard {
    pub day_name: String,
    pub date: Option<NaiveDate>,
    pub forecast: Option<DayForecast>,
}

/// Dashboard section a failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Location,
    Weather,
    Forecast,
    Clock,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Location => "location",
            Self::Weather => "weather",
            Self::Forecast => "forecast",
            Self::Clock => "clock",
        };
        f.write_str(label)
    }
}

/// "Data unavailable" notice for a section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unavailable {
    pub section: Section,
    pub message: String,
}

impl Unavailable {
    pub fn new(section: Section, message: impl Into<String>) -> Self {
        Self {
            section,
            message: message.into(),
        }
    }
}

pub trait RenderPort: Send {
    fn render_current(&mut self, current: &CurrentConditions);

    fn render_clock(&mut self, clock: &FormattedTimestamp);

    fn render_forecast(&mut self, cards: &[ForecastCard]);

    /// Active temperature unit changed
    fn render_unit(&mut self, unit: TemperatureUnit);

    fn render_unavailable(&mut self, unavailable: &Unavailable);
}

/// Whole-number value for display. Halves round up.
pub fn display_round(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}
