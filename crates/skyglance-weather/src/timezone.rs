//! UTC/DST offset lookup for a coordinate (Google Time Zone API).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use skyglance_core::{ApiKeys, Config};
use tracing::instrument;

use crate::clock::{Instant, TimezoneOffset};
use crate::error::TimezoneError;
use crate::provider::ProviderSettings;
use crate::types::Coordinates;

#[async_trait]
pub trait TimezoneLookup: Send + Sync {
    /// Offsets in effect at `coordinates` at the instant `at`
    async fn lookup(
        &self,
        coordinates: Coordinates,
        at: Instant,
    ) -> Result<TimezoneOffset, TimezoneError>;
}

/// Google client when a key is configured, otherwise `None`.
///
/// Without a lookup the dashboard relies on the offset the weather provider reports.
pub fn build_timezone_lookup(
    config: &Config,
    keys: &ApiKeys,
) -> Result<Option<Arc<dyn TimezoneLookup>>, TimezoneError> {
    let Some(key) = keys.google.as_deref() else {
        tracing::info!("No Google API key; using provider-reported UTC offsets");
        return Ok(None);
    };
    let settings = ProviderSettings::new(
        &config.services.timezone_url,
        key,
        Duration::from_secs(config.services.request_timeout_secs),
    );
    Ok(Some(Arc::new(GoogleTimezoneClient::new(settings)?)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleTimezoneResponse {
    status: String,
    #[serde(default)]
    raw_offset: Option<i32>,
    #[serde(default)]
    dst_offset: Option<i32>,
    #[serde(default)]
    time_zone_id: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GoogleTimezoneClient {
    client: Arc<Client>,
    settings: ProviderSettings,
}

impl GoogleTimezoneClient {
    pub fn new(settings: ProviderSettings) -> Result<Self, TimezoneError> {
        let client = settings.build_client()?;
        Ok(Self { client, settings })
    }
}

#[async_trait]
impl TimezoneLookup for GoogleTimezoneClient {
    #[instrument(skip(self), level = "debug")]
    async fn lookup(
        &self,
        coordinates: Coordinates,
        at: Instant,
    ) -> Result<TimezoneOffset, TimezoneError> {
        let url = format!("{}/maps/api/timezone/json", self.settings.base_url);
        let location = format!("{},{}", coordinates.latitude, coordinates.longitude);
        let timestamp = at.epoch_millis().div_euclid(1000).to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("location", location.as_str()),
                ("timestamp", timestamp.as_str()),
                ("key", self.settings.api_key.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TimezoneError::Http(response.status().as_u16()));
        }

        let body: GoogleTimezoneResponse = response.json().await?;
        if body.status != "OK" {
            return Err(TimezoneError::Status {
                status: body.status,
                message: body.error_message.unwrap_or_default(),
            });
        }

        let offset = TimezoneOffset::new(
            body.raw_offset.ok_or(TimezoneError::NoOffset)?,
            body.dst_offset.unwrap_or(0),
        );
        tracing::debug!(
            "Timezone {} at {}: raw {}s, dst {}s",
            body.time_zone_id.as_deref().unwrap_or("?"),
            coordinates,
            offset.raw_offset_seconds,
            offset.dst_offset_seconds
        );
        Ok(offset)
    }
}
