use crate::domain::model::{GeoPoint, LocationSelection, LocationSide};
use crate::domain::ports::{Geocoder, PositionOptions, PositionSource};
use crate::utils::error::{QuoteError, Result};
use crate::utils::validation::validate_non_empty_string;

const LOCATION_UNAVAILABLE_MESSAGE: &str =
    "Unable to retrieve your location. Please make sure location services are enabled.";

/// How the user pointed at a place.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationInput {
    /// Free-text address to search for.
    Address(String),
    /// A clicked or typed coordinate to reverse geocode.
    Coordinates(GeoPoint),
    /// The device's current fix.
    CurrentPosition,
}

/// Turns clicks, searches and device fixes into [`LocationSelection`]s.
///
/// Every call is a single attempt; nothing is retried.
pub struct LocationResolver<G: Geocoder, P: PositionSource> {
    geocoder: G,
    position: P,
    position_options: PositionOptions,
}

impl<G: Geocoder, P: PositionSource> LocationResolver<G, P> {
    pub fn new(geocoder: G, position: P) -> Self {
        Self {
            geocoder,
            position,
            position_options: PositionOptions::default(),
        }
    }

    pub fn with_position_options(mut self, options: PositionOptions) -> Self {
        self.position_options = options;
        self
    }

    /// Never fails: when the lookup does, the address falls back to the coordinate text.
    pub async fn reverse_geocode(&self, point: GeoPoint) -> LocationSelection {
        tracing::debug!("🔎 Reverse geocoding {}", point);
        match self.geocoder.reverse(point).await {
            Ok(address) if !address.trim().is_empty() => LocationSelection::new(point, address),
            Ok(_) => {
                tracing::warn!("⚠️ Reverse geocoding returned no name for {}, using coordinates", point);
                LocationSelection::new(point, point.fallback_address())
            }
            Err(e) => {
                tracing::warn!("⚠️ Reverse geocoding failed for {}: {}, using coordinates", point, e);
                LocationSelection::new(point, point.fallback_address())
            }
        }
    }

    pub async fn forward_geocode(&self, query: &str) -> Result<LocationSelection> {
        if validate_non_empty_string("address", query).is_err() {
            return Err(QuoteError::invalid_input(
                "address",
                "Please enter an address to search",
            ));
        }

        let query = query.trim();
        tracing::debug!("🔎 Searching for address: {}", query);
        let hits = self.geocoder.search(query).await?;

        match hits.into_iter().next() {
            Some(hit) => {
                tracing::debug!("📍 '{}' resolved to {} ({})", query, hit.display_name, hit.point);
                Ok(LocationSelection::new(hit.point, hit.display_name))
            }
            None => {
                tracing::info!("No geocoding results for '{}'", query);
                Err(QuoteError::NotFound {
                    query: query.to_string(),
                })
            }
        }
    }

    /// Reads the device fix (bounded by the configured timeout), then reverse geocodes it.
    pub async fn resolve_current_device_position(&self) -> Result<LocationSelection> {
        let options = self.position_options;
        let fix = tokio::time::timeout(options.timeout, self.position.current_position(options)).await;

        let point = match fix {
            Ok(Ok(point)) => point,
            Ok(Err(QuoteError::LocationUnavailable { message })) => {
                tracing::warn!("📡 Device position unavailable: {}", message);
                return Err(QuoteError::LocationUnavailable { message });
            }
            Ok(Err(e)) => {
                tracing::warn!("📡 Device position failed: {}", e);
                return Err(QuoteError::LocationUnavailable {
                    message: LOCATION_UNAVAILABLE_MESSAGE.to_string(),
                });
            }
            Err(_) => {
                tracing::warn!("📡 Device position timed out after {:?}", options.timeout);
                return Err(QuoteError::LocationUnavailable {
                    message: LOCATION_UNAVAILABLE_MESSAGE.to_string(),
                });
            }
        };

        Ok(self.reverse_geocode(point).await)
    }

    pub async fn resolve(&self, input: &LocationInput) -> Result<LocationSelection> {
        match input {
            LocationInput::Address(query) => self.forward_geocode(query).await,
            LocationInput::Coordinates(point) => Ok(self.reverse_geocode(*point).await),
            LocationInput::CurrentPosition => self.resolve_current_device_position().await,
        }
    }
}

/// Identifies one lookup issued for a side of the trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupTicket {
    pub side: LocationSide,
    seq: u64,
}

/// Last-issued lookup per side. Results from older tickets are stale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupSequencer {
    pickup: u64,
    dropoff: u64,
}

impl LookupSequencer {
    fn counter(&mut self, side: LocationSide) -> &mut u64 {
        match side {
            LocationSide::Pickup => &mut self.pickup,
            LocationSide::Dropoff => &mut self.dropoff,
        }
    }

    pub fn issue(&mut self, side: LocationSide) -> LookupTicket {
        let counter = self.counter(side);
        *counter += 1;
        LookupTicket { side, seq: *counter }
    }

    pub fn is_current(&self, ticket: LookupTicket) -> bool {
        let latest = match ticket.side {
            LocationSide::Pickup => self.pickup,
            LocationSide::Dropoff => self.dropoff,
        };
        ticket.seq == latest
    }

    /// Makes every outstanding ticket stale.
    pub fn invalidate_all(&mut self) {
        self.pickup += 1;
        self.dropoff += 1;
    }
}
