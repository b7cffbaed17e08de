//! Device location via IP geolocation (ip-api.com compatible endpoint).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use skyglance_core::Config;

use crate::error::LocationError;
use crate::provider::USER_AGENT;
use crate::types::Coordinates;

#[async_trait]
pub trait Geolocator: Send + Sync {
    /// Best guess at where this device is
    async fn locate(&self) -> Result<Coordinates, LocationError>;
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    #[serde(default)]
    city: Option<String>,
}

#[derive(Debug, Clone)]
pub struct IpGeolocator {
    client: Arc<Client>,
    base_url: String,
}

impl IpGeolocator {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, LocationError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, LocationError> {
        Self::new(
            &config.services.geolocation_url,
            Duration::from_secs(config.services.request_timeout_secs),
        )
    }
}

#[async_trait]
impl Geolocator for IpGeolocator {
    async fn locate(&self) -> Result<Coordinates, LocationError> {
        let url = format!("{}/json", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("fields", "status,message,lat,lon,city")])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LocationError::Timeout
                } else {
                    LocationError::Network(e)
                }
            })?;

        if !response.status().is_success() {
            return Err(LocationError::Unavailable(format!(
                "geolocation service returned {}",
                response.status()
            )));
        }

        let body: IpApiResponse = response.json().await?;
        if body.status != "success" {
            return Err(LocationError::Unavailable(
                body.message.unwrap_or_else(|| body.status.clone()),
            ));
        }

        let (Some(lat), Some(lon)) = (body.lat, body.lon) else {
            return Err(LocationError::Unavailable("response has no coordinates".into()));
        };
        let coordinates = Coordinates::new(lat, lon)?;
        tracing::info!(
            "Got location: {} ({})",
            coordinates,
            body.city.as_deref().unwrap_or("unknown city")
        );
        Ok(coordinates)
    }
}
