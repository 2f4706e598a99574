//! Location detection: position lookup, reverse geocode, first candidate.
//!
//! `detect` performs exactly one position query and at most one geocoding
//! request. Every failure collapses to a `LocationFailure` whose message is
//! what the user sees; the underlying cause is logged.

use std::fmt;

use tracing::{info, warn};

use crate::geocode::{Place, ReverseGeocoder};
use crate::geolocation::{Geolocator, PositionError};

/// Human-readable place resolved from the device position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedLocation {
    pub city: String,
    pub state: Option<String>,
    pub country: Option<String>,
}

impl DetectedLocation {
    fn from_place(place: Place) -> Self {
        Self {
            city: place.name,
            state: place.state,
            country: place.country,
        }
    }

    /// State when the place has one, otherwise the country code.
    pub fn region(&self) -> Option<&str> {
        self.state.as_deref().or(self.country.as_deref())
    }
}

impl fmt::Display for DetectedLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.region() {
            Some(region) => write!(f, "{}, {region}", self.city),
            None => f.write_str(&self.city),
        }
    }
}

/// Failure classes of the detection flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationFailure {
    /// No geolocation capability; no network call was made.
    Unsupported,
    /// The position lookup failed (permission, positioning, lookup error).
    Position,
    /// The geocoding request failed (transport, HTTP status, decode, missing key).
    Geocoding,
    /// The geocoder returned no candidates.
    NoResults,
}

impl LocationFailure {
    /// Message shown in the view.
    pub fn message(self) -> &'static str {
        match self {
            LocationFailure::Unsupported => "Geolocation is not supported on this device.",
            LocationFailure::Position => "Unable to retrieve your location.",
            LocationFailure::Geocoding => "Unable to retrieve location.",
            LocationFailure::NoResults => "Unable to retrieve city and state.",
        }
    }
}

impl fmt::Display for LocationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Resolves the current city/state.
///
/// # Errors
/// Returns the `LocationFailure` for whichever step failed first.
pub async fn detect<G, R>(geolocator: &G, geocoder: &R) -> Result<DetectedLocation, LocationFailure>
where
    G: Geolocator + Sync,
    R: ReverseGeocoder + Sync,
{
    let coords = match geolocator.current_position().await {
        Ok(coords) => coords,
        Err(PositionError::Unsupported) => {
            warn!("Location error: geolocation unsupported");
            return Err(LocationFailure::Unsupported);
        }
        Err(PositionError::Unavailable(reason)) => {
            warn!("Location error: {reason}");
            return Err(LocationFailure::Position);
        }
    };

    let places = match geocoder.reverse(coords).await {
        Ok(places) => places,
        Err(err) => {
            warn!("Geocoding error: {err:#}");
            return Err(LocationFailure::Geocoding);
        }
    };

    let Some(first) = places.into_iter().next() else {
        warn!(
            lat = coords.latitude,
            lon = coords.longitude,
            "Geocoding returned no places"
        );
        return Err(LocationFailure::NoResults);
    };

    let location = DetectedLocation::from_place(first);
    info!(location = %location, "location detected");
    Ok(location)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::geolocation::Coordinates;

    struct FakeGeolocator(Result<Coordinates, PositionError>);

    impl Geolocator for FakeGeolocator {
        async fn current_position(&self) -> Result<Coordinates, PositionError> {
            self.0.clone()
        }
    }

    /// Geocoder that records calls and replays a canned response.
    struct FakeGeocoder {
        calls: AtomicUsize,
        response: Result<Vec<Place>, String>,
    }

    impl FakeGeocoder {
        fn returning(places: Vec<Place>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                response: Ok(places),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                response: Err(message.to_string()),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ReverseGeocoder for FakeGeocoder {
        async fn reverse(&self, _coords: Coordinates) -> anyhow::Result<Vec<Place>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response.clone().map_err(anyhow::Error::msg)
        }
    }

    fn place(name: &str, state: Option<&str>, country: Option<&str>) -> Place {
        Place {
            name: name.to_string(),
            state: state.map(str::to_string),
            country: country.map(str::to_string),
            lat: None,
            lon: None,
        }
    }

    fn at(lat: f64, lon: f64) -> FakeGeolocator {
        FakeGeolocator(Ok(Coordinates::new(lat, lon).unwrap()))
    }

    #[tokio::test]
    async fn test_unsupported_makes_no_network_call() {
        let geocoder = FakeGeocoder::returning(vec![place("X", None, None)]);
        let result = detect(&FakeGeolocator(Err(PositionError::Unsupported)), &geocoder).await;

        assert_eq!(result, Err(LocationFailure::Unsupported));
        assert_eq!(geocoder.calls(), 0);
    }

    #[tokio::test]
    async fn test_position_failure_skips_geocoding() {
        let geocoder = FakeGeocoder::returning(vec![]);
        let geolocator = FakeGeolocator(Err(PositionError::Unavailable("denied".into())));
        let result = detect(&geolocator, &geocoder).await;

        assert_eq!(result, Err(LocationFailure::Position));
        assert_eq!(
            LocationFailure::Position.message(),
            "Unable to retrieve your location."
        );
        assert_eq!(geocoder.calls(), 0);
    }

    #[tokio::test]
    async fn test_first_place_is_published() {
        let geocoder = FakeGeocoder::returning(vec![
            place("Springfield", Some("IL"), Some("US")),
            place("Shelbyville", Some("IL"), Some("US")),
        ]);
        let location = detect(&at(10.0, 20.0), &geocoder).await.unwrap();

        assert_eq!(location.to_string(), "Springfield, IL");
        assert_eq!(geocoder.calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_result() {
        let geocoder = FakeGeocoder::returning(vec![]);
        let result = detect(&at(10.0, 20.0), &geocoder).await;

        assert_eq!(result, Err(LocationFailure::NoResults));
        assert_eq!(
            LocationFailure::NoResults.message(),
            "Unable to retrieve city and state."
        );
    }

    #[tokio::test]
    async fn test_geocoding_failure() {
        let geocoder = FakeGeocoder::failing("Geocoding API returned HTTP 500");
        let result = detect(&at(10.0, 20.0), &geocoder).await;

        assert_eq!(result, Err(LocationFailure::Geocoding));
        assert_eq!(
            LocationFailure::Geocoding.message(),
            "Unable to retrieve location."
        );
    }

    #[test]
    fn test_display_falls_back_to_country() {
        let location = DetectedLocation {
            city: "Monaco".into(),
            state: None,
            country: Some("MC".into()),
        };
        assert_eq!(location.to_string(), "Monaco, MC");

        let bare = DetectedLocation {
            city: "Nowhere".into(),
            state: None,
            country: None,
        };
        assert_eq!(bare.to_string(), "Nowhere");
    }
}
