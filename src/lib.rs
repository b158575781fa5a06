pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{LocalStorage, TomlConfig};

pub use adapters::{ConfiguredPosition, NominatimGeocoder};
pub use app::{QuoteFlow, QuoteInputs};
pub use core::resolver::{LocationInput, LocationResolver};
pub use core::submission::SimulatedSubmitter;
pub use core::wizard::{QuoteWizard, WizardStage};
pub use utils::error::{QuoteError, Result};
