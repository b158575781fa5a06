//! The four-step quote wizard.
//!
//! Each [`WizardState`] variant carries exactly the fields that are valid at that
//! step. Forward moves are gated: the gate is checked only when `next` is
//! called, and a rejected move leaves the state untouched. Backward moves never
//! lose data; whatever a later step held is kept aside and offered again when
//! the user comes forward.

use crate::core::geo::{route_estimate, DEFAULT_AVERAGE_SPEED_KMH, DEFAULT_MAP_CENTER};
use crate::core::resolver::{LookupSequencer, LookupTicket};
use crate::domain::model::{
    GeoPoint, LocationSelection, LocationSide, PackageDetails, PackageDraft, QuoteRequest, RouteEstimate,
    ServiceSelection, SubmittedQuote,
};
use crate::domain::ports::{Clock, QuoteSubmitter, SystemClock};
use crate::utils::error::{QuoteError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WizardStage {
    ServiceSelection,
    LocationSelection,
    Details,
    Review,
    Submitted,
}

impl fmt::Display for WizardStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WizardStage::ServiceSelection => "ServiceSelection",
            WizardStage::LocationSelection => "LocationSelection",
            WizardStage::Details => "Details",
            WizardStage::Review => "Review",
            WizardStage::Submitted => "Submitted",
        };
        f.write_str(name)
    }
}

/// Later-step data held while the user is on an earlier step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CarriedState {
    pub pickup: Option<LocationSelection>,
    pub dropoff: Option<LocationSelection>,
    pub package: Option<PackageDraft>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceStep {
    pub selected: Option<ServiceSelection>,
    pub carried: CarriedState,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationStep {
    pub service: ServiceSelection,
    pub pickup: Option<LocationSelection>,
    pub dropoff: Option<LocationSelection>,
    /// Which slot a map click or device fix fills.
    pub active_side: LocationSide,
    pub carried_package: Option<PackageDraft>,
}

impl LocationStep {
    fn new(
        service: ServiceSelection,
        pickup: Option<LocationSelection>,
        dropoff: Option<LocationSelection>,
        carried_package: Option<PackageDraft>,
    ) -> Self {
        Self {
            service,
            pickup,
            dropoff,
            active_side: LocationSide::Pickup,
            carried_package,
        }
    }

    fn slot_mut(&mut self, side: LocationSide) -> &mut Option<LocationSelection> {
        match side {
            LocationSide::Pickup => &mut self.pickup,
            LocationSide::Dropoff => &mut self.dropoff,
        }
    }

    pub fn location(&self, side: LocationSide) -> Option<&LocationSelection> {
        match side {
            LocationSide::Pickup => self.pickup.as_ref(),
            LocationSide::Dropoff => self.dropoff.as_ref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailsStep {
    pub service: ServiceSelection,
    pub pickup: LocationSelection,
    pub dropoff: LocationSelection,
    pub route: RouteEstimate,
    pub package: PackageDraft,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewStep {
    pub request: QuoteRequest,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WizardState {
    ServiceSelection(ServiceStep),
    LocationSelection(LocationStep),
    Details(DetailsStep),
    Review(ReviewStep),
    Submitted(SubmittedQuote),
}

impl WizardState {
    pub fn stage(&self) -> WizardStage {
        match self {
            WizardState::ServiceSelection(_) => WizardStage::ServiceSelection,
            WizardState::LocationSelection(_) => WizardStage::LocationSelection,
            WizardState::Details(_) => WizardStage::Details,
            WizardState::Review(_) => WizardStage::Review,
            WizardState::Submitted(_) => WizardStage::Submitted,
        }
    }
}

impl Default for WizardState {
    fn default() -> Self {
        WizardState::ServiceSelection(ServiceStep::default())
    }
}

/// Loosely-typed navigation payload, e.g. a deep link or restored session.
///
/// Validated by [`QuoteWizard::enter`] before it becomes a [`WizardState`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryState {
    pub service: Option<ServiceSelection>,
    pub pickup: Option<LocationSelection>,
    pub dropoff: Option<LocationSelection>,
    pub package: Option<PackageDraft>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    Entered(WizardStage),
    /// Predecessor state was missing; the wizard restarted at service selection.
    Redirected { missing: Vec<String> },
}

pub struct QuoteWizard<C: Clock = SystemClock> {
    state: WizardState,
    /// Outlives every visit to the location step so tickets are never reissued.
    lookups: LookupSequencer,
    clock: C,
    average_speed_kmh: f64,
}

impl QuoteWizard<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for QuoteWizard<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> QuoteWizard<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            state: WizardState::default(),
            lookups: LookupSequencer::default(),
            clock,
            average_speed_kmh: DEFAULT_AVERAGE_SPEED_KMH,
        }
    }

    pub fn with_average_speed(mut self, average_speed_kmh: f64) -> Self {
        self.average_speed_kmh = average_speed_kmh;
        self
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn stage(&self) -> WizardStage {
        self.state.stage()
    }

    /// Discards everything and returns to the first step.
    pub fn restart(&mut self) {
        tracing::info!("🔄 Quote wizard restarted");
        self.replace_state(WizardState::default());
    }

    /// Every state change makes lookups still in flight stale.
    fn replace_state(&mut self, state: WizardState) {
        self.lookups.invalidate_all();
        self.state = state;
    }

    fn wrong_step(&self, action: &str) -> QuoteError {
        QuoteError::InvalidTransition {
            from: self.stage().to_string(),
            action: action.to_string(),
        }
    }

    // Service selection

    pub fn select_service(&mut self, service: ServiceSelection) -> Result<()> {
        if let WizardState::ServiceSelection(step) = &mut self.state {
            tracing::debug!("Selected service {} ({})", service.id, service.title);
            step.selected = Some(service);
            return Ok(());
        }
        Err(self.wrong_step("select a service"))
    }

    // Location selection

    fn location_step_mut(&mut self, action: &str) -> Result<&mut LocationStep> {
        let stage = self.stage();
        match &mut self.state {
            WizardState::LocationSelection(step) => Ok(step),
            _ => Err(QuoteError::InvalidTransition {
                from: stage.to_string(),
                action: action.to_string(),
            }),
        }
    }

    pub fn set_active_side(&mut self, side: LocationSide) -> Result<()> {
        self.location_step_mut("choose a side")?.active_side = side;
        Ok(())
    }

    /// Registers a lookup for `side`; any earlier lookup for that side becomes stale.
    pub fn begin_lookup(&mut self, side: LocationSide) -> Result<LookupTicket> {
        self.location_step_mut("look up a location")?;
        Ok(self.lookups.issue(side))
    }

    /// Starts a lookup for whichever side the map is currently filling.
    pub fn begin_active_lookup(&mut self) -> Result<LookupTicket> {
        let side = self.location_step_mut("look up a location")?.active_side;
        Ok(self.lookups.issue(side))
    }

    /// Applies a lookup result if it is still the latest for its side.
    ///
    /// Returns `false` when the result was discarded, including when the
    /// wizard has already left the location step.
    pub fn complete_lookup(&mut self, ticket: LookupTicket, selection: LocationSelection) -> bool {
        let step = match &mut self.state {
            WizardState::LocationSelection(step) => step,
            _ => {
                tracing::debug!("Discarding {} lookup that finished after leaving the step", ticket.side);
                return false;
            }
        };
        if !self.lookups.is_current(ticket) {
            tracing::debug!("Discarding superseded {} lookup: {}", ticket.side, selection.address);
            return false;
        }
        *step.slot_mut(ticket.side) = Some(selection);
        true
    }

    /// Replaces one side outright, invalidating any lookup still in flight for it.
    pub fn set_location(&mut self, side: LocationSide, selection: LocationSelection) -> Result<()> {
        *self.location_step_mut("set a location")?.slot_mut(side) = Some(selection);
        self.lookups.issue(side);
        Ok(())
    }

    /// Swaps pickup and dropoff when both are set; otherwise does nothing.
    pub fn swap_locations(&mut self) -> Result<bool> {
        let step = self.location_step_mut("swap locations")?;
        if step.pickup.is_none() || step.dropoff.is_none() {
            return Ok(false);
        }
        std::mem::swap(&mut step.pickup, &mut step.dropoff);
        self.lookups.invalidate_all();
        Ok(true)
    }

    /// Route overlay for the map while both points are chosen.
    pub fn preview_route(&self) -> Option<RouteEstimate> {
        match &self.state {
            WizardState::LocationSelection(LocationStep {
                pickup: Some(pickup),
                dropoff: Some(dropoff),
                ..
            }) => Some(route_estimate(pickup.point, dropoff.point, self.average_speed_kmh)),
            WizardState::Details(step) => Some(step.route),
            WizardState::Review(step) => Some(step.request.route),
            _ => None,
        }
    }

    /// Where the map should be centred: the route midpoint, else the one chosen
    /// point, else the default centre.
    pub fn map_center(&self) -> GeoPoint {
        if let Some(route) = self.preview_route() {
            return route.midpoint;
        }
        match &self.state {
            WizardState::LocationSelection(step) => step
                .pickup
                .as_ref()
                .or(step.dropoff.as_ref())
                .map(|selection| selection.point)
                .unwrap_or(DEFAULT_MAP_CENTER),
            _ => DEFAULT_MAP_CENTER,
        }
    }

    // Details

    pub fn package_mut(&mut self) -> Result<&mut PackageDraft> {
        let stage = self.stage();
        match &mut self.state {
            WizardState::Details(step) => Ok(&mut step.package),
            _ => Err(QuoteError::InvalidTransition {
                from: stage.to_string(),
                action: "edit package details".to_string(),
            }),
        }
    }

    pub fn request(&self) -> Option<&QuoteRequest> {
        match &self.state {
            WizardState::Review(step) => Some(&step.request),
            WizardState::Submitted(quote) => Some(&quote.request),
            _ => None,
        }
    }

    // Transitions

    /// Moves one step forward if the current step's gate passes.
    pub fn next(&mut self) -> Result<WizardStage> {
        let from = self.stage();
        let next_state = match &self.state {
            WizardState::ServiceSelection(step) => {
                let service = step.selected.clone().ok_or_else(|| {
                    QuoteError::invalid_input("service", "Please select a service to continue")
                })?;
                WizardState::LocationSelection(LocationStep::new(
                    service,
                    step.carried.pickup.clone(),
                    step.carried.dropoff.clone(),
                    step.carried.package.clone(),
                ))
            }
            WizardState::LocationSelection(step) => {
                let pickup = require_location(step.pickup.as_ref(), LocationSide::Pickup)?;
                let dropoff = require_location(step.dropoff.as_ref(), LocationSide::Dropoff)?;
                let route = route_estimate(pickup.point, dropoff.point, self.average_speed_kmh);
                tracing::info!(
                    "🗺️ Route {} -> {}: {} / {}",
                    pickup.address,
                    dropoff.address,
                    route.formatted_distance(),
                    route.formatted_duration()
                );
                let package = step
                    .carried_package
                    .clone()
                    .unwrap_or_else(|| PackageDraft::defaults_for(self.clock.today()));
                WizardState::Details(DetailsStep {
                    service: step.service.clone(),
                    pickup: pickup.clone(),
                    dropoff: dropoff.clone(),
                    route,
                    package,
                })
            }
            WizardState::Details(step) => {
                let package = check_details(&step.package, self.clock.today())?;
                WizardState::Review(ReviewStep {
                    request: QuoteRequest {
                        service: step.service.clone(),
                        pickup: step.pickup.clone(),
                        dropoff: step.dropoff.clone(),
                        route: step.route,
                        package,
                    },
                })
            }
            WizardState::Review(_) => return Err(self.wrong_step("continue without submitting")),
            WizardState::Submitted(_) => return Err(self.wrong_step("continue")),
        };

        self.replace_state(next_state);
        tracing::info!("➡️ Wizard {} -> {}", from, self.stage());
        Ok(self.stage())
    }

    /// Moves one step back, keeping everything entered so far.
    pub fn back(&mut self) -> Result<WizardStage> {
        let from = self.stage();
        let previous = match &self.state {
            WizardState::ServiceSelection(_) => return Err(self.wrong_step("go back")),
            WizardState::Submitted(_) => return Err(self.wrong_step("go back after submitting")),
            WizardState::LocationSelection(step) => WizardState::ServiceSelection(ServiceStep {
                selected: Some(step.service.clone()),
                carried: CarriedState {
                    pickup: step.pickup.clone(),
                    dropoff: step.dropoff.clone(),
                    package: step.carried_package.clone(),
                },
            }),
            WizardState::Details(step) => WizardState::LocationSelection(LocationStep::new(
                step.service.clone(),
                Some(step.pickup.clone()),
                Some(step.dropoff.clone()),
                Some(step.package.clone()),
            )),
            WizardState::Review(step) => {
                let request = step.request.clone();
                WizardState::Details(DetailsStep {
                    service: request.service,
                    pickup: request.pickup,
                    dropoff: request.dropoff,
                    route: request.route,
                    package: request.package.into(),
                })
            }
        };

        self.replace_state(previous);
        tracing::info!("⬅️ Wizard {} -> {}", from, self.stage());
        Ok(self.stage())
    }

    /// Hands the reviewed request to `submitter` and freezes it on success.
    ///
    /// A failed submission leaves the wizard on the review step.
    pub async fn submit<S: QuoteSubmitter>(&mut self, submitter: &S) -> Result<&SubmittedQuote> {
        let request = match &self.state {
            WizardState::Review(step) => step.request.clone(),
            _ => return Err(self.wrong_step("submit")),
        };

        tracing::info!("📨 Submitting quote request for {}", request.service.title);
        let reference = submitter.submit(&request).await?;
        tracing::info!("✅ Quote accepted with reference {}", reference);

        self.replace_state(WizardState::Submitted(SubmittedQuote { reference, request }));
        match &self.state {
            WizardState::Submitted(quote) => Ok(quote),
            _ => Err(self.wrong_step("read the submitted quote")),
        }
    }

    /// Jumps straight to `stage` with a loosely-typed payload.
    ///
    /// When the payload lacks what `stage` needs, the wizard restarts at
    /// service selection instead of failing.
    pub fn enter(&mut self, stage: WizardStage, entry: EntryState) -> EntryOutcome {
        match self.build_entry_state(stage, entry) {
            Ok(state) => {
                self.replace_state(state);
                tracing::info!("Entered wizard at {}", stage);
                EntryOutcome::Entered(stage)
            }
            Err(e) => {
                let missing = rejected_fields(e);
                tracing::info!("↩️ Cannot enter {} (missing: {}), restarting", stage, missing.join(", "));
                self.replace_state(WizardState::default());
                EntryOutcome::Redirected { missing }
            }
        }
    }

    fn build_entry_state(&self, stage: WizardStage, entry: EntryState) -> Result<WizardState> {
        let invalid = |missing: Vec<&str>| QuoteError::InvalidWizardEntry {
            stage: stage.to_string(),
            missing: missing.into_iter().map(String::from).collect(),
        };

        let mut missing = Vec::new();
        let needs_locations = matches!(stage, WizardStage::Details | WizardStage::Review);
        if stage != WizardStage::ServiceSelection && entry.service.is_none() {
            missing.push("service");
        }
        // Carried locations are checked at every stage, not only where they are required.
        for (field, location) in [("pickup", &entry.pickup), ("dropoff", &entry.dropoff)] {
            match location {
                None if needs_locations => missing.push(field),
                Some(selection) if !is_valid_entry_location(selection) => missing.push(field),
                _ => {}
            }
        }
        if stage == WizardStage::Review {
            match &entry.package {
                None => missing.extend(["pickup_date", "pickup_time"]),
                Some(package) if package.pickup_time.is_none() => missing.push("pickup_time"),
                Some(_) => {}
            }
        }
        if stage == WizardStage::Submitted {
            missing.push("submission");
        }
        if !missing.is_empty() {
            return Err(invalid(missing));
        }

        let EntryState {
            service,
            pickup,
            dropoff,
            package,
        } = entry;

        let state = match (stage, service, pickup, dropoff) {
            (WizardStage::ServiceSelection, service, pickup, dropoff) => {
                WizardState::ServiceSelection(ServiceStep {
                    selected: service,
                    carried: CarriedState {
                        pickup,
                        dropoff,
                        package,
                    },
                })
            }
            (WizardStage::LocationSelection, Some(service), pickup, dropoff) => {
                WizardState::LocationSelection(LocationStep::new(service, pickup, dropoff, package))
            }
            (WizardStage::Details, Some(service), Some(pickup), Some(dropoff)) => {
                let route = route_estimate(pickup.point, dropoff.point, self.average_speed_kmh);
                WizardState::Details(DetailsStep {
                    service,
                    pickup,
                    dropoff,
                    route,
                    package: package.unwrap_or_else(|| PackageDraft::defaults_for(self.clock.today())),
                })
            }
            (WizardStage::Review, Some(service), Some(pickup), Some(dropoff)) => {
                let draft = package.ok_or_else(|| invalid(vec!["pickup_date", "pickup_time"]))?;
                let package = check_details(&draft, self.clock.today()).map_err(|e| {
                    QuoteError::InvalidWizardEntry {
                        stage: stage.to_string(),
                        missing: rejected_fields(e),
                    }
                })?;
                let route = route_estimate(pickup.point, dropoff.point, self.average_speed_kmh);
                WizardState::Review(ReviewStep {
                    request: QuoteRequest {
                        service,
                        pickup,
                        dropoff,
                        route,
                        package,
                    },
                })
            }
            _ => return Err(invalid(vec!["service"])),
        };
        Ok(state)
    }
}

/// Field names to report when an entry payload is turned away.
fn rejected_fields(error: QuoteError) -> Vec<String> {
    match error {
        QuoteError::InvalidWizardEntry { missing, .. } => missing,
        QuoteError::InvalidInput { field, .. } => vec![field],
        _ => vec!["entry".to_string()],
    }
}

/// Payloads built in code skip [`GeoPoint::new`].
fn is_valid_entry_location(selection: &LocationSelection) -> bool {
    !selection.address.trim().is_empty()
        && GeoPoint::new(selection.point.lat, selection.point.lng).is_ok()
}

fn require_location(
    location: Option<&LocationSelection>,
    side: LocationSide,
) -> Result<&LocationSelection> {
    match location {
        Some(selection) if !selection.address.trim().is_empty() => Ok(selection),
        _ => Err(QuoteError::invalid_input(
            side.to_string(),
            format!("Please choose a {} location", side),
        )),
    }
}

/// The details gate: the date may not be in the past and a time must be set.
fn check_details(draft: &PackageDraft, today: NaiveDate) -> Result<PackageDetails> {
    if draft.pickup_date < today {
        return Err(QuoteError::invalid_input(
            "pickup_date",
            format!("Pickup date {} is in the past", draft.pickup_date),
        ));
    }
    let pickup_time = draft
        .pickup_time
        .ok_or_else(|| QuoteError::invalid_input("pickup_time", "Please choose a pickup time"))?;

    Ok(PackageDetails {
        pickup_date: draft.pickup_date,
        pickup_time,
        size: draft.size,
        weight: draft.weight,
        package_type: draft.package_type,
        special_instructions: draft
            .special_instructions
            .as_ref()
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalogue::find_service;
    use crate::domain::model::{GeoPoint, PackageType, QuoteReference, SizeCategory};
    use crate::domain::ports::FixedClock;
    use async_trait::async_trait;
    use chrono::NaiveTime;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
    }

    fn wizard() -> QuoteWizard<FixedClock> {
        QuoteWizard::with_clock(FixedClock(today()))
    }

    fn pickup() -> LocationSelection {
        LocationSelection::new(GeoPoint::new(-33.8688, 151.2093).unwrap(), "Sydney CBD")
    }

    fn dropoff() -> LocationSelection {
        LocationSelection::new(GeoPoint::new(-33.8568, 151.2153).unwrap(), "Sydney Opera House")
    }

    fn at_locations() -> QuoteWizard<FixedClock> {
        let mut wizard = wizard();
        wizard.select_service(find_service(1).unwrap()).unwrap();
        wizard.next().unwrap();
        wizard
    }

    fn at_details() -> QuoteWizard<FixedClock> {
        let mut wizard = at_locations();
        wizard.set_location(LocationSide::Pickup, pickup()).unwrap();
        wizard.set_location(LocationSide::Dropoff, dropoff()).unwrap();
        wizard.next().unwrap();
        wizard
    }

    struct AcceptAll;

    #[async_trait]
    impl QuoteSubmitter for AcceptAll {
        async fn submit(&self, _request: &QuoteRequest) -> Result<QuoteReference> {
            Ok(QuoteReference("MOT-0042-2026".to_string()))
        }
    }

    struct RejectAll;

    #[async_trait]
    impl QuoteSubmitter for RejectAll {
        async fn submit(&self, _request: &QuoteRequest) -> Result<QuoteReference> {
            Err(QuoteError::network("backend down"))
        }
    }

    #[test]
    fn test_service_gate_requires_selection() {
        let mut wizard = wizard();
        let err = wizard.next().unwrap_err();
        assert!(matches!(err, QuoteError::InvalidInput { .. }));
        assert_eq!(wizard.stage(), WizardStage::ServiceSelection);
    }

    #[test]
    fn test_missing_dropoff_rejected_without_mutation() {
        let mut wizard = at_locations();
        wizard.set_location(LocationSide::Pickup, pickup()).unwrap();
        let before = wizard.state().clone();

        let err = wizard.next().unwrap_err();

        assert!(matches!(err, QuoteError::InvalidInput { ref field, .. } if field == "dropoff"));
        assert_eq!(wizard.state(), &before);
    }

    #[test]
    fn test_route_computed_at_transition() {
        let wizard = at_details();
        match wizard.state() {
            WizardState::Details(step) => {
                assert_eq!(step.route.duration_minutes, 2);
                assert_eq!(step.route.formatted_distance(), "1.4 km");
                assert_eq!(step.service.id, 1);
                assert_eq!(step.package, PackageDraft::defaults_for(today()));
            }
            other => panic!("expected details, got {:?}", other.stage()),
        }
    }

    #[test]
    fn test_back_and_forth_keeps_details() {
        let mut wizard = at_details();
        {
            let package = wizard.package_mut().unwrap();
            package.size = SizeCategory::Large;
            package.package_type = PackageType::Electronics;
            package.special_instructions = Some("Leave at reception".to_string());
        }
        let before = wizard.state().clone();

        assert_eq!(wizard.back().unwrap(), WizardStage::LocationSelection);
        assert_eq!(wizard.next().unwrap(), WizardStage::Details);

        assert_eq!(wizard.state(), &before);
    }

    #[test]
    fn test_back_to_service_keeps_everything() {
        let mut wizard = at_details();
        wizard.back().unwrap();
        wizard.back().unwrap();
        assert_eq!(wizard.stage(), WizardStage::ServiceSelection);
        assert!(wizard.back().is_err());

        wizard.next().unwrap();
        match wizard.state() {
            WizardState::LocationSelection(step) => {
                assert_eq!(step.pickup.as_ref(), Some(&pickup()));
                assert_eq!(step.dropoff.as_ref(), Some(&dropoff()));
                assert!(step.carried_package.is_some());
            }
            other => panic!("expected location step, got {:?}", other.stage()),
        }
    }

    #[test]
    fn test_details_gate_rejects_past_date_and_missing_time() {
        let mut wizard = at_details();
        wizard.package_mut().unwrap().pickup_date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let before = wizard.state().clone();
        let err = wizard.next().unwrap_err();
        assert!(matches!(err, QuoteError::InvalidInput { ref field, .. } if field == "pickup_date"));
        assert_eq!(wizard.state(), &before);

        wizard.package_mut().unwrap().pickup_date = today();
        wizard.package_mut().unwrap().pickup_time = None;
        let err = wizard.next().unwrap_err();
        assert!(matches!(err, QuoteError::InvalidInput { ref field, .. } if field == "pickup_time"));

        wizard.package_mut().unwrap().pickup_time = NaiveTime::from_hms_opt(9, 30, 0);
        assert_eq!(wizard.next().unwrap(), WizardStage::Review);
        let request = wizard.request().unwrap();
        assert_eq!(request.package.pickup_date, today());
        assert_eq!(request.package.pickup_time, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
    }

    #[test]
    fn test_stale_lookup_is_discarded() {
        let mut wizard = at_locations();
        let slow = wizard.begin_lookup(LocationSide::Pickup).unwrap();
        let fast = wizard.begin_lookup(LocationSide::Pickup).unwrap();

        assert!(wizard.complete_lookup(fast, pickup()));
        assert!(!wizard.complete_lookup(slow, dropoff()));

        match wizard.state() {
            WizardState::LocationSelection(step) => assert_eq!(step.pickup.as_ref(), Some(&pickup())),
            other => panic!("expected location step, got {:?}", other.stage()),
        }
    }

    #[test]
    fn test_active_side_decides_the_slot() {
        let mut wizard = at_locations();
        wizard.set_active_side(LocationSide::Dropoff).unwrap();
        let ticket = wizard.begin_active_lookup().unwrap();
        assert_eq!(ticket.side, LocationSide::Dropoff);
        assert!(wizard.complete_lookup(ticket, dropoff()));

        match wizard.state() {
            WizardState::LocationSelection(step) => {
                assert!(step.location(LocationSide::Pickup).is_none());
                assert_eq!(step.location(LocationSide::Dropoff), Some(&dropoff()));
            }
            other => panic!("expected location step, got {:?}", other.stage()),
        }
    }

    #[test]
    fn test_lookup_after_leaving_step_is_discarded() {
        let mut wizard = at_locations();
        let ticket = wizard.begin_lookup(LocationSide::Dropoff).unwrap();
        wizard.back().unwrap();
        assert!(!wizard.complete_lookup(ticket, dropoff()));
    }

    #[test]
    fn test_direct_set_supersedes_pending_lookup() {
        let mut wizard = at_locations();
        let pending = wizard.begin_lookup(LocationSide::Dropoff).unwrap();
        wizard.set_location(LocationSide::Dropoff, dropoff()).unwrap();
        assert!(!wizard.complete_lookup(pending, pickup()));
    }

    #[test]
    fn test_lookup_from_earlier_visit_is_discarded() {
        let mut wizard = at_locations();
        wizard.set_location(LocationSide::Pickup, pickup()).unwrap();
        wizard.set_location(LocationSide::Dropoff, dropoff()).unwrap();
        let earlier = wizard.begin_lookup(LocationSide::Pickup).unwrap();

        wizard.next().unwrap();
        wizard.back().unwrap();
        wizard.begin_lookup(LocationSide::Pickup).unwrap();
        let latest = wizard.begin_lookup(LocationSide::Pickup).unwrap();

        let fresh = LocationSelection::new(GeoPoint::new(-33.8610, 151.2108).unwrap(), "Circular Quay");
        let stale = LocationSelection::new(GeoPoint::new(-33.8915, 151.2767).unwrap(), "Bondi Beach");
        assert!(wizard.complete_lookup(latest, fresh.clone()));
        assert!(!wizard.complete_lookup(earlier, stale));

        match wizard.state() {
            WizardState::LocationSelection(step) => assert_eq!(step.pickup.as_ref(), Some(&fresh)),
            other => panic!("expected location step, got {:?}", other.stage()),
        }
    }

    #[test]
    fn test_map_center_follows_selection() {
        let mut wizard = at_locations();
        assert_eq!(wizard.map_center(), DEFAULT_MAP_CENTER);

        wizard.set_location(LocationSide::Dropoff, dropoff()).unwrap();
        assert_eq!(wizard.map_center(), dropoff().point);

        wizard.set_location(LocationSide::Pickup, pickup()).unwrap();
        assert_eq!(wizard.map_center(), wizard.preview_route().unwrap().midpoint);
    }

    #[test]
    fn test_swap_requires_both_sides() {
        let mut wizard = at_locations();
        wizard.set_location(LocationSide::Pickup, pickup()).unwrap();
        assert!(!wizard.swap_locations().unwrap());

        wizard.set_location(LocationSide::Dropoff, dropoff()).unwrap();
        let before = wizard.preview_route().unwrap();
        assert!(wizard.swap_locations().unwrap());
        match wizard.state() {
            WizardState::LocationSelection(step) => {
                assert_eq!(step.pickup.as_ref(), Some(&dropoff()));
                assert_eq!(step.dropoff.as_ref(), Some(&pickup()));
            }
            other => panic!("expected location step, got {:?}", other.stage()),
        }
        assert_eq!(wizard.preview_route().unwrap().distance_km, before.distance_km);
    }

    #[test]
    fn test_step_specific_actions_are_rejected_elsewhere() {
        let mut wizard = wizard();
        assert!(matches!(
            wizard.set_location(LocationSide::Pickup, pickup()),
            Err(QuoteError::InvalidTransition { .. })
        ));
        assert!(wizard.package_mut().is_err());
        assert!(wizard.swap_locations().is_err());
    }

    #[tokio::test]
    async fn test_submit_freezes_request() {
        let mut wizard = at_details();
        wizard.next().unwrap();

        let quote = wizard.submit(&AcceptAll).await.unwrap();
        assert_eq!(quote.reference.0, "MOT-0042-2026");
        assert_eq!(wizard.stage(), WizardStage::Submitted);
        assert!(wizard.back().is_err());
        assert!(wizard.next().is_err());
    }

    #[tokio::test]
    async fn test_failed_submit_stays_on_review() {
        let mut wizard = at_details();
        wizard.next().unwrap();
        let before = wizard.state().clone();

        assert!(wizard.submit(&RejectAll).await.is_err());
        assert_eq!(wizard.state(), &before);
    }

    #[tokio::test]
    async fn test_submit_outside_review_is_rejected() {
        let mut wizard = at_details();
        let err = wizard.submit(&AcceptAll).await.unwrap_err();
        assert!(matches!(err, QuoteError::InvalidTransition { .. }));
    }

    #[test]
    fn test_enter_review_without_state_redirects() {
        let mut wizard = at_details();
        let outcome = wizard.enter(WizardStage::Review, EntryState::default());
        match outcome {
            EntryOutcome::Redirected { missing } => {
                assert!(missing.contains(&"service".to_string()));
                assert!(missing.contains(&"pickup_time".to_string()));
            }
            other => panic!("expected redirect, got {:?}", other),
        }
        assert_eq!(wizard.state(), &WizardState::default());
    }

    #[test]
    fn test_enter_details_with_full_payload() {
        let mut wizard = wizard();
        let entry = EntryState {
            service: find_service(5),
            pickup: Some(pickup()),
            dropoff: Some(dropoff()),
            package: None,
        };
        assert_eq!(
            wizard.enter(WizardStage::Details, entry),
            EntryOutcome::Entered(WizardStage::Details)
        );
        assert_eq!(wizard.preview_route().unwrap().duration_minutes, 2);
    }

    #[test]
    fn test_enter_location_without_service_redirects() {
        let mut wizard = wizard();
        let entry = EntryState {
            pickup: Some(pickup()),
            ..Default::default()
        };
        assert!(matches!(
            wizard.enter(WizardStage::LocationSelection, entry),
            EntryOutcome::Redirected { .. }
        ));
        assert_eq!(wizard.stage(), WizardStage::ServiceSelection);
    }

    #[test]
    fn test_enter_review_with_past_date_redirects() {
        let mut wizard = wizard();
        let mut package = PackageDraft::defaults_for(today());
        package.pickup_date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let entry = EntryState {
            service: find_service(1),
            pickup: Some(pickup()),
            dropoff: Some(dropoff()),
            package: Some(package),
        };
        assert_eq!(
            wizard.enter(WizardStage::Review, entry),
            EntryOutcome::Redirected {
                missing: vec!["pickup_date".to_string()]
            }
        );
    }

    #[test]
    fn test_enter_with_out_of_range_point_redirects() {
        let mut wizard = wizard();
        let entry = EntryState {
            service: find_service(1),
            pickup: Some(LocationSelection {
                point: GeoPoint { lat: 500.0, lng: -999.0 },
                address: "Nowhere".to_string(),
            }),
            dropoff: Some(dropoff()),
            package: None,
        };
        assert_eq!(
            wizard.enter(WizardStage::Details, entry),
            EntryOutcome::Redirected {
                missing: vec!["pickup".to_string()]
            }
        );
        assert_eq!(wizard.stage(), WizardStage::ServiceSelection);
        assert!(wizard.preview_route().is_none());
    }

    #[test]
    fn test_enter_with_blank_address_redirects() {
        let mut wizard = wizard();
        let entry = EntryState {
            service: find_service(1),
            pickup: Some(pickup()),
            dropoff: Some(LocationSelection::new(dropoff().point, "   ")),
            package: None,
        };
        assert_eq!(
            wizard.enter(WizardStage::LocationSelection, entry),
            EntryOutcome::Redirected {
                missing: vec!["dropoff".to_string()]
            }
        );
    }

    #[test]
    fn test_entry_json_with_out_of_range_point_is_rejected() {
        let parsed = serde_json::from_str::<EntryState>(
            r#"{"pickup": {"point": {"lat": 500.0, "lng": -999.0}, "address": "Nowhere"}}"#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn test_entry_state_from_json() {
        let entry: EntryState = serde_json::from_str(
            r#"{"service": {"id": 1, "title": "Parcel Delivery", "description": "", "image": ""}}"#,
        )
        .unwrap();
        let mut wizard = wizard();
        assert_eq!(
            wizard.enter(WizardStage::LocationSelection, entry),
            EntryOutcome::Entered(WizardStage::LocationSelection)
        );
    }
}
