use crate::domain::model::{GeoPoint, QuoteReference, QuoteRequest};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use std::time::Duration;

/// One candidate returned by a forward geocoding lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeHit {
    pub point: GeoPoint,
    pub display_name: String,
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Display name for a coordinate. Errors cover transport, status and payload failures.
    async fn reverse(&self, point: GeoPoint) -> Result<String>;

    /// Candidates for a free-text query, best first. An empty vector means no match.
    async fn search(&self, query: &str) -> Result<Vec<GeocodeHit>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::ZERO,
        }
    }
}

#[async_trait]
pub trait PositionSource: Send + Sync {
    async fn current_position(&self, options: PositionOptions) -> Result<GeoPoint>;
}

#[async_trait]
pub trait QuoteSubmitter: Send + Sync {
    async fn submit(&self, request: &QuoteRequest) -> Result<QuoteReference>;
}

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;

    fn current_year(&self) -> i32 {
        self.today().year()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// A clock pinned to one date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

pub trait ConfigProvider: Send + Sync {
    fn geocoder_base_url(&self) -> &str;
    fn geocoder_user_agent(&self) -> &str;
    fn geocoder_timeout(&self) -> Duration;
    fn reverse_zoom(&self) -> u8;
    fn average_speed_kmh(&self) -> f64;
    fn device_position(&self) -> Option<GeoPoint>;
    fn device_timeout(&self) -> Duration;
    fn submission_delay(&self) -> Duration;
    fn reference_prefix(&self) -> &str;
    fn state_dir(&self) -> &str;
}
