//! Reverse-geocoding client (OpenWeatherMap geocoding API).
//!
//! `GET {base}/geo/1.0/reverse?lat=..&lon=..&limit=1&appid=..` returns a JSON
//! array of candidate places, best match first.

use std::future::Future;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use crate::config::Config;
use crate::geolocation::Coordinates;
use crate::shared::{build_http_client, missing_api_key_message, resolve_api_key, resolve_base_url};

/// Default base URL for the geocoding API.
pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";
const BASE_URL_ENV: &str = "OPENWEATHER_BASE_URL";
const REVERSE_PATH: &str = "/geo/1.0/reverse";
const RESULT_LIMIT: u32 = 1;

/// One candidate place from a reverse lookup.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Place {
    pub name: String,
    /// Administrative area (state, province). Absent for some countries.
    #[serde(default)]
    pub state: Option<String>,
    /// ISO 3166 country code.
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

/// Resolves coordinates to candidate places.
pub trait ReverseGeocoder {
    fn reverse(&self, coords: Coordinates) -> impl Future<Output = Result<Vec<Place>>> + Send;
}

/// Runtime config for the geocoding client.
#[derive(Debug, Clone)]
pub struct GeocodeConfig {
    pub base_url: String,
    /// Missing keys only fail the request that needs one.
    pub api_key: Option<String>,
}

impl GeocodeConfig {
    /// Resolves the geocoding settings.
    ///
    /// API key: `[geocoding] api_key`, then `OPENWEATHER_API_KEY`.
    /// Base URL: `OPENWEATHER_BASE_URL`, then `[geocoding] base_url`, then the default.
    ///
    /// # Errors
    /// Returns an error if a configured base URL is malformed.
    pub fn from_config(config: &Config) -> Result<Self> {
        let base_url = resolve_base_url(
            config.geocoding.base_url.as_deref(),
            BASE_URL_ENV,
            DEFAULT_BASE_URL,
            "geocoding",
        )?;
        let api_key = resolve_api_key(config.geocoding.api_key.as_deref(), API_KEY_ENV);
        Ok(Self { base_url, api_key })
    }
}

/// HTTP reverse-geocoding client.
#[derive(Debug, Clone)]
pub struct GeocodeClient {
    config: GeocodeConfig,
    http: reqwest::Client,
}

impl GeocodeClient {
    pub fn new(config: GeocodeConfig, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    /// Builds a client from the app config.
    ///
    /// # Errors
    /// Returns an error if the settings are invalid or the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            GeocodeConfig::from_config(config)?,
            build_http_client(config.http_timeout())?,
        ))
    }

    fn reverse_url(&self) -> String {
        format!("{}{REVERSE_PATH}", self.config.base_url)
    }
}

impl ReverseGeocoder for GeocodeClient {
    async fn reverse(&self, coords: Coordinates) -> Result<Vec<Place>> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            anyhow::bail!(missing_api_key_message(API_KEY_ENV, "geocoding"));
        };

        debug!(
            lat = coords.latitude,
            lon = coords.longitude,
            "reverse geocoding"
        );

        let response = self
            .http
            .get(self.reverse_url())
            .query(&[
                ("lat", coords.latitude.to_string()),
                ("lon", coords.longitude.to_string()),
                ("limit", RESULT_LIMIT.to_string()),
                ("appid", api_key.to_string()),
            ])
            .send()
            .await
            .context("Geocoding request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Geocoding API returned HTTP {status}: {body}");
        }

        response
            .json::<Vec<Place>>()
            .await
            .context("Failed to parse geocoding response")
    }
}
