use crate::domain::model::GeoPoint;
use crate::domain::ports::{ConfigProvider, GeocodeHit, Geocoder};
use crate::utils::error::{QuoteError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_USER_AGENT: &str = concat!("courier-quote/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_REVERSE_ZOOM: u8 = 18;

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
    error: Option<String>,
}

/// Nominatim returns coordinates as strings; some mirrors send numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Coordinate {
    Text(String),
    Number(f64),
}

impl Coordinate {
    fn value(&self) -> Option<f64> {
        match self {
            Coordinate::Text(text) => text.trim().parse().ok(),
            Coordinate::Number(n) => Some(*n),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    lat: Coordinate,
    lon: Coordinate,
    display_name: String,
}

/// Forward and reverse geocoding against a Nominatim-compatible HTTP API.
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
    reverse_zoom: u8,
}

impl NominatimGeocoder {
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self> {
        // Nominatim 的使用政策要求帶上可識別的 User-Agent
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            reverse_zoom: DEFAULT_REVERSE_ZOOM,
        })
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        let geocoder = Self::new(
            config.geocoder_base_url(),
            config.geocoder_user_agent(),
            config.geocoder_timeout(),
        )?;
        Ok(geocoder.with_reverse_zoom(config.reverse_zoom()))
    }

    pub fn with_reverse_zoom(mut self, zoom: u8) -> Self {
        self.reverse_zoom = zoom;
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn reverse(&self, point: GeoPoint) -> Result<String> {
        let endpoint = self.endpoint("reverse");
        tracing::debug!("Making reverse geocoding request to: {}", endpoint);

        let response = self
            .client
            .get(&endpoint)
            .query(&[
                ("format", "json".to_string()),
                ("lat", point.lat.to_string()),
                ("lon", point.lng.to_string()),
                ("zoom", self.reverse_zoom.to_string()),
                ("addressdetails", "1".to_string()),
            ])
            .send()
            .await?;

        tracing::debug!("Reverse geocoding response status: {}", response.status());
        if !response.status().is_success() {
            return Err(QuoteError::network(format!(
                "Geocoding request failed with HTTP {}",
                response.status()
            )));
        }

        let body: ReverseResponse = response.json().await?;
        if let Some(error) = body.error {
            return Err(QuoteError::network(format!("Geocoding service error: {}", error)));
        }
        body.display_name
            .ok_or_else(|| QuoteError::network("Geocoding response has no display_name"))
    }

    async fn search(&self, query: &str) -> Result<Vec<GeocodeHit>> {
        let endpoint = self.endpoint("search");
        tracing::debug!("Making address search request to: {} (q={})", endpoint, query);

        let response = self
            .client
            .get(&endpoint)
            .query(&[("format", "json"), ("q", query), ("limit", "1")])
            .send()
            .await?;

        tracing::debug!("Address search response status: {}", response.status());
        if !response.status().is_success() {
            return Err(QuoteError::network(format!(
                "Address search failed with HTTP {}",
                response.status()
            )));
        }

        let results: Vec<SearchResult> = response.json().await?;
        results
            .into_iter()
            .map(|result| {
                let (lat, lng) = match (result.lat.value(), result.lon.value()) {
                    (Some(lat), Some(lng)) => (lat, lng),
                    _ => {
                        return Err(QuoteError::network(format!(
                            "Malformed coordinates for '{}'",
                            result.display_name
                        )))
                    }
                };
                let point = GeoPoint::new(lat, lng).map_err(|e| {
                    QuoteError::network(format!("Out-of-range coordinates in search result: {}", e))
                })?;
                Ok(GeocodeHit {
                    point,
                    display_name: result.display_name,
                })
            })
            .collect()
    }
}
