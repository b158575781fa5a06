pub mod geo;
pub mod onboarding;
pub mod resolver;
pub mod submission;
pub mod wizard;

pub use crate::domain::model::{
    GeoPoint, LocationSelection, LocationSide, QuoteRequest, RouteEstimate, ServiceSelection,
};
pub use crate::domain::ports::{ConfigProvider, Geocoder, PositionSource, QuoteSubmitter, Storage};
pub use crate::utils::error::Result;
