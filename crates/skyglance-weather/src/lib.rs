//! Weather dashboard for Skyglance
//!
//! Current conditions and daily forecasts from OpenWeatherMap or WeatherAPI,
//! remote wall-clock alignment via a timezone lookup, and IP geolocation.

pub mod clock;
pub mod dashboard;
pub mod error;
pub mod location;
pub mod openweathermap;
pub mod provider;
pub mod render;
pub mod timezone;
pub mod types;
pub mod weatherapi;

pub use clock::{
    format_timestamp, resolve_remote_wall_clock, rotate_weekdays, ClockError, FormattedTimestamp,
    Instant, Meridiem, TimezoneOffset, WeekdayTable,
};
pub use dashboard::{align_forecast, Dashboard, DashboardContext, Snapshot};
pub use error::{DashboardError, LocationError, ProviderError, TimezoneError};
pub use location::{Geolocator, IpGeolocator};
pub use provider::{build_provider, ProviderSettings, WeatherProvider};
pub use render::{display_round, ForecastCard, RenderPort, Section, Unavailable};
pub use timezone::{build_timezone_lookup, GoogleTimezoneClient, TimezoneLookup};
pub use types::*;
