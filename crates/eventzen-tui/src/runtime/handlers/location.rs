use eventzen_core::geocode::ReverseGeocoder;
use eventzen_core::geolocation::Geolocator;
use eventzen_core::location;

use crate::events::UiEvent;

/// Runs one detection attempt.
pub async fn detect_location<G, R>(geolocator: &G, geocoder: &R) -> UiEvent
where
    G: Geolocator + Sync,
    R: ReverseGeocoder + Sync,
{
    UiEvent::LocationResolved(location::detect(geolocator, geocoder).await)
}
