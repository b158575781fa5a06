use crate::utils::error::{QuoteError, Result};
use crate::utils::validation::validate_range;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A latitude/longitude pair in signed degrees.
///
/// Construct through [`GeoPoint::new`] to reject NaN and out-of-range values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGeoPoint")]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Unchecked wire form; deserialized points go through [`GeoPoint::new`].
#[derive(Deserialize)]
struct RawGeoPoint {
    lat: f64,
    lng: f64,
}

impl TryFrom<RawGeoPoint> for GeoPoint {
    type Error = QuoteError;

    fn try_from(raw: RawGeoPoint) -> Result<Self> {
        GeoPoint::new(raw.lat, raw.lng)
    }
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Result<Self> {
        validate_range("latitude", lat, -90.0, 90.0)?;
        validate_range("longitude", lng, -180.0, 180.0)?;
        Ok(Self { lat, lng })
    }

    /// Parses `"lat,lng"` (whitespace around either number is ignored).
    pub fn parse(input: &str) -> Result<Self> {
        let (lat, lng) = input.split_once(',').ok_or_else(|| {
            QuoteError::invalid_input("coordinates", format!("Expected LAT,LNG but got '{}'", input))
        })?;
        let lat = lat.trim().parse::<f64>().map_err(|e| {
            QuoteError::invalid_input("latitude", format!("'{}' is not a number: {}", lat.trim(), e))
        })?;
        let lng = lng.trim().parse::<f64>().map_err(|e| {
            QuoteError::invalid_input("longitude", format!("'{}' is not a number: {}", lng.trim(), e))
        })?;
        Self::new(lat, lng)
    }

    /// Coordinate text used when no address could be resolved.
    pub fn fallback_address(&self) -> String {
        format!("{:.6}, {:.6}", self.lat, self.lng)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lat, self.lng)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSelection {
    pub id: u32,
    pub title: String,
    pub description: String,
    pub image: String,
}

/// A coordinate together with its resolved address. Always replaced as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSelection {
    pub point: GeoPoint,
    pub address: String,
}

impl LocationSelection {
    pub fn new(point: GeoPoint, address: impl Into<String>) -> Self {
        Self {
            point,
            address: address.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationSide {
    Pickup,
    Dropoff,
}

impl fmt::Display for LocationSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pickup => f.write_str("pickup"),
            Self::Dropoff => f.write_str("dropoff"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteEstimate {
    pub distance_km: f64,
    pub duration_minutes: u32,
    pub midpoint: GeoPoint,
}

impl RouteEstimate {
    pub fn formatted_distance(&self) -> String {
        format!("{:.1} km", self.distance_km)
    }

    pub fn formatted_duration(&self) -> String {
        format!("{} minutes", self.duration_minutes)
    }

    /// Short form shown on the map overlay.
    pub fn compact_duration(&self) -> String {
        if self.duration_minutes < 60 {
            format!("{} min", self.duration_minutes)
        } else {
            format!(
                "{} hr {} min",
                self.duration_minutes / 60,
                self.duration_minutes % 60
            )
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SizeCategory {
    Small,
    Medium,
    Large,
    ExtraLarge,
}

impl SizeCategory {
    pub const MAX_VOLUME_M3: f64 = 10.0;

    /// Maps a slider volume (0-10 m³) onto its category.
    pub fn from_volume_m3(volume: f64) -> Result<Self> {
        validate_range("volume", volume, 0.0, Self::MAX_VOLUME_M3)?;
        Ok(if volume <= 1.0 {
            Self::Small
        } else if volume <= 3.0 {
            Self::Medium
        } else if volume <= 6.0 {
            Self::Large
        } else {
            Self::ExtraLarge
        })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Small => "Small (< 1m³)",
            Self::Medium => "Medium (1-3m³)",
            Self::Large => "Large (3-6m³)",
            Self::ExtraLarge => "Extra Large (> 6m³)",
        }
    }
}

impl Default for SizeCategory {
    fn default() -> Self {
        Self::Medium
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WeightCategory {
    Light,
    Medium,
    Heavy,
    VeryHeavy,
}

impl WeightCategory {
    pub const MAX_WEIGHT_KG: f64 = 20.0;

    /// Maps a slider mass (0-20 kg) onto its category.
    pub fn from_weight_kg(weight: f64) -> Result<Self> {
        validate_range("weight", weight, 0.0, Self::MAX_WEIGHT_KG)?;
        Ok(if weight <= 1.0 {
            Self::Light
        } else if weight <= 5.0 {
            Self::Medium
        } else if weight <= 15.0 {
            Self::Heavy
        } else {
            Self::VeryHeavy
        })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Light => "Light (< 1kg)",
            Self::Medium => "Medium (1-5kg)",
            Self::Heavy => "Heavy (5-15kg)",
            Self::VeryHeavy => "Very Heavy (> 15kg)",
        }
    }
}

impl Default for WeightCategory {
    fn default() -> Self {
        Self::Medium
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PackageType {
    SmallParcel,
    MediumBox,
    LargeBox,
    DocumentEnvelope,
    FragileItem,
    Electronics,
    Other,
}

impl Default for PackageType {
    fn default() -> Self {
        Self::Other
    }
}

/// Package attributes while the details step is being edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageDraft {
    pub pickup_date: NaiveDate,
    pub pickup_time: Option<NaiveTime>,
    pub size: SizeCategory,
    pub weight: WeightCategory,
    pub package_type: PackageType,
    pub special_instructions: Option<String>,
}

impl PackageDraft {
    /// Tomorrow at 10:00, medium size and weight.
    pub fn defaults_for(today: NaiveDate) -> Self {
        Self {
            pickup_date: today.succ_opt().unwrap_or(today),
            pickup_time: NaiveTime::from_hms_opt(10, 0, 0),
            size: SizeCategory::default(),
            weight: WeightCategory::default(),
            package_type: PackageType::default(),
            special_instructions: None,
        }
    }
}

/// Package attributes that passed the details gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageDetails {
    pub pickup_date: NaiveDate,
    pub pickup_time: NaiveTime,
    pub size: SizeCategory,
    pub weight: WeightCategory,
    pub package_type: PackageType,
    pub special_instructions: Option<String>,
}

impl From<PackageDetails> for PackageDraft {
    fn from(details: PackageDetails) -> Self {
        Self {
            pickup_date: details.pickup_date,
            pickup_time: Some(details.pickup_time),
            size: details.size,
            weight: details.weight,
            package_type: details.package_type,
            special_instructions: details.special_instructions,
        }
    }
}

/// The finished aggregate handed to review and submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub service: ServiceSelection,
    pub pickup: LocationSelection,
    pub dropoff: LocationSelection,
    pub route: RouteEstimate,
    pub package: PackageDetails,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteReference(pub String);

impl fmt::Display for QuoteReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the success view shows once a quote has been accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmittedQuote {
    pub reference: QuoteReference,
    pub request: QuoteRequest,
}

impl SubmittedQuote {
    pub fn summary(&self) -> QuoteSummary {
        QuoteSummary {
            reference: self.reference.0.clone(),
            service: self.request.service.title.clone(),
            pickup_location: self.request.pickup.address.clone(),
            dropoff_location: self.request.dropoff.address.clone(),
            date: self.request.package.pickup_date.format("%Y-%m-%d").to_string(),
            time: self.request.package.pickup_time.format("%H:%M").to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteSummary {
    pub reference: String,
    pub service: String,
    pub pickup_location: String,
    pub dropoff_location: String,
    pub date: String,
    pub time: String,
}
