//! Locate command handler.

use anyhow::Result;
use eventzen_core::config::{Config, LocationSourceKind};
use eventzen_core::geocode::GeocodeClient;
use eventzen_core::geolocation::LocationSource;
use eventzen_core::location;
use eventzen_tui::location::location_line;

/// Resolves and prints the current city and state.
///
/// `coords` replaces the configured location source with a fixed position.
pub async fn run(config: &Config, coords: Option<(f64, f64)>) -> Result<()> {
    let mut config = config.clone();
    if let Some((lat, lon)) = coords {
        config.location.source = LocationSourceKind::Fixed;
        config.location.latitude = Some(lat);
        config.location.longitude = Some(lon);
    }

    let geolocator = LocationSource::from_config(&config)?;
    let geocoder = GeocodeClient::from_config(&config)?;

    match location::detect(&geolocator, &geocoder).await {
        Ok(detected) => {
            println!("{}", location_line(&detected));
            Ok(())
        }
        Err(failure) => anyhow::bail!(failure.message()),
    }
}
