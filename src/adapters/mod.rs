// Adapters layer: concrete implementations of the domain ports (http geocoding, device position)

pub mod nominatim;
pub mod position;

pub use nominatim::NominatimGeocoder;
pub use position::ConfiguredPosition;
