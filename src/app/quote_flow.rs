use crate::core::resolver::{LocationInput, LocationResolver};
use crate::core::wizard::QuoteWizard;
use crate::domain::catalogue::find_service;
use crate::domain::model::{
    LocationSide, PackageType, QuoteRequest, SizeCategory, SubmittedQuote, WeightCategory,
};
use crate::domain::ports::{Clock, Geocoder, PositionSource, QuoteSubmitter, SystemClock};
use crate::utils::error::{QuoteError, Result};
use chrono::{NaiveDate, NaiveTime};

/// Everything needed to fill in the wizard in one go. Unset fields keep the step defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteInputs {
    pub service_id: u32,
    pub pickup: LocationInput,
    pub dropoff: LocationInput,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub volume_m3: Option<f64>,
    pub weight_kg: Option<f64>,
    pub package_type: Option<PackageType>,
    pub notes: Option<String>,
}

impl QuoteInputs {
    pub fn new(service_id: u32, pickup: LocationInput, dropoff: LocationInput) -> Self {
        Self {
            service_id,
            pickup,
            dropoff,
            date: None,
            time: None,
            volume_m3: None,
            weight_kg: None,
            package_type: None,
            notes: None,
        }
    }
}

/// Drives a [`QuoteWizard`] from service selection through submission.
pub struct QuoteFlow<G: Geocoder, P: PositionSource, S: QuoteSubmitter, C: Clock = SystemClock> {
    resolver: LocationResolver<G, P>,
    submitter: S,
    wizard: QuoteWizard<C>,
}

impl<G: Geocoder, P: PositionSource, S: QuoteSubmitter, C: Clock> QuoteFlow<G, P, S, C> {
    pub fn new(resolver: LocationResolver<G, P>, submitter: S, wizard: QuoteWizard<C>) -> Self {
        Self {
            resolver,
            submitter,
            wizard,
        }
    }

    pub fn wizard(&self) -> &QuoteWizard<C> {
        &self.wizard
    }

    /// Walks the wizard up to the review step and returns the request to confirm.
    pub async fn prepare(&mut self, inputs: QuoteInputs) -> Result<&QuoteRequest> {
        tracing::info!("🚀 Starting quote for service {}", inputs.service_id);
        self.wizard.restart();

        let service = find_service(inputs.service_id).ok_or_else(|| {
            QuoteError::invalid_input(
                "service",
                format!("Unknown service id {}. Run `courier-quote services` to list them.", inputs.service_id),
            )
        })?;
        self.wizard.select_service(service)?;
        self.wizard.next()?;

        self.fill_location(LocationSide::Pickup, &inputs.pickup).await?;
        self.fill_location(LocationSide::Dropoff, &inputs.dropoff).await?;
        if let Some(route) = self.wizard.preview_route() {
            tracing::info!(
                "📏 {} / about {}",
                route.formatted_distance(),
                route.compact_duration()
            );
        }
        tracing::debug!("Map centred on {}", self.wizard.map_center());
        self.wizard.next()?;

        let package = self.wizard.package_mut()?;
        if let Some(date) = inputs.date {
            package.pickup_date = date;
        }
        if let Some(time) = inputs.time {
            package.pickup_time = Some(time);
        }
        if let Some(volume) = inputs.volume_m3 {
            package.size = SizeCategory::from_volume_m3(volume)?;
        }
        if let Some(weight) = inputs.weight_kg {
            package.weight = WeightCategory::from_weight_kg(weight)?;
        }
        if let Some(package_type) = inputs.package_type {
            package.package_type = package_type;
        }
        if inputs.notes.is_some() {
            package.special_instructions = inputs.notes;
        }
        self.wizard.next()?;

        self.wizard.request().ok_or_else(|| QuoteError::InvalidTransition {
            from: self.wizard.stage().to_string(),
            action: "review".to_string(),
        })
    }

    async fn fill_location(&mut self, side: LocationSide, input: &LocationInput) -> Result<()> {
        let ticket = self.wizard.begin_lookup(side)?;
        let selection = self.resolver.resolve(input).await?;
        tracing::info!("📍 {}: {}", side, selection.address);
        if !self.wizard.complete_lookup(ticket, selection) {
            tracing::warn!("⚠️ {} lookup was superseded", side);
        }
        Ok(())
    }

    /// Submits the reviewed request.
    pub async fn submit(&mut self) -> Result<SubmittedQuote> {
        let quote = self.wizard.submit(&self.submitter).await?;
        Ok(quote.clone())
    }

    pub async fn run(&mut self, inputs: QuoteInputs) -> Result<SubmittedQuote> {
        self.prepare(inputs).await?;
        self.submit().await
    }
}
