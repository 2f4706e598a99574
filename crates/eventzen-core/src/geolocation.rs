//! Device position lookup.
//!
//! A terminal has no platform geolocation API, so the capability is chosen by
//! config: fixed coordinates, an IP geolocation lookup, or none at all.

use std::fmt;
use std::future::Future;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use crate::config::{Config, LocationSourceKind};
use crate::shared::{build_http_client, resolve_base_url};

/// Default IP geolocation endpoint.
pub const DEFAULT_IP_LOOKUP_URL: &str = "http://ip-api.com/json";

/// Latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Validates and builds a coordinate pair.
    ///
    /// # Errors
    /// Fails when either value is out of range or not finite.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            anyhow::bail!("Latitude must be between -90 and 90 (got {latitude})");
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            anyhow::bail!("Longitude must be between -180 and 180 (got {longitude})");
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// Why the current position could not be obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PositionError {
    /// No geolocation capability is available.
    Unsupported,
    /// The capability exists but the lookup failed.
    Unavailable(String),
}

impl fmt::Display for PositionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionError::Unsupported => f.write_str("geolocation unsupported"),
            PositionError::Unavailable(reason) => write!(f, "position unavailable: {reason}"),
        }
    }
}

/// One-shot "get current position" capability.
pub trait Geolocator {
    fn current_position(&self) -> impl Future<Output = Result<Coordinates, PositionError>> + Send;
}

/// Geolocation capability selected from config.
#[derive(Debug, Clone)]
pub enum LocationSource {
    Unsupported,
    Fixed(Coordinates),
    IpLookup { url: String, http: reqwest::Client },
}

impl LocationSource {
    /// Builds the configured source.
    ///
    /// # Errors
    /// Fails when `fixed` is selected without valid coordinates, or the lookup
    /// URL is malformed.
    pub fn from_config(config: &Config) -> Result<Self> {
        let location = &config.location;
        match location.source {
            LocationSourceKind::None => Ok(LocationSource::Unsupported),
            LocationSourceKind::Fixed => {
                let (Some(lat), Some(lon)) = (location.latitude, location.longitude) else {
                    anyhow::bail!(
                        "[location] source = \"fixed\" requires latitude and longitude"
                    );
                };
                Ok(LocationSource::Fixed(Coordinates::new(lat, lon)?))
            }
            LocationSourceKind::Ip => {
                let url = resolve_base_url(
                    location.ip_lookup_url.as_deref(),
                    "EVENTZEN_IP_LOOKUP_URL",
                    DEFAULT_IP_LOOKUP_URL,
                    "IP lookup",
                )?;
                Ok(LocationSource::IpLookup {
                    url,
                    http: build_http_client(config.http_timeout())?,
                })
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
}

async fn lookup_ip_position(http: &reqwest::Client, url: &str) -> Result<Coordinates> {
    let response = http
        .get(url)
        .send()
        .await
        .context("IP lookup request failed")?;

    if !response.status().is_success() {
        anyhow::bail!("IP lookup returned HTTP {}", response.status());
    }

    let body: IpLookupResponse = response
        .json()
        .await
        .context("Failed to parse IP lookup response")?;

    if let Some(status) = body.status.as_deref()
        && status != "success"
    {
        let reason = body.message.unwrap_or_else(|| status.to_string());
        anyhow::bail!("IP lookup failed: {reason}");
    }

    match (body.lat, body.lon) {
        (Some(lat), Some(lon)) => Coordinates::new(lat, lon),
        _ => anyhow::bail!("IP lookup response has no coordinates"),
    }
}

impl Geolocator for LocationSource {
    async fn current_position(&self) -> Result<Coordinates, PositionError> {
        match self {
            LocationSource::Unsupported => Err(PositionError::Unsupported),
            LocationSource::Fixed(coords) => Ok(*coords),
            LocationSource::IpLookup { url, http } => {
                debug!(url = %url, "looking up position from IP");
                lookup_ip_position(http, url)
                    .await
                    .map_err(|e| PositionError::Unavailable(format!("{e:#}")))
            }
        }
    }
}
