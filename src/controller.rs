//! # Estimator Controller
//!
//! Owns all application state for one estimating session: the address label,
//! the drawn ring, its area, the property conditions, the current result, and
//! the user's saved estimates.
//!
//! UI code reports changes through explicit notifications (`ring_changed`,
//! `set_condition`, ...). Every notification recomputes the estimate
//! synchronously and the new result fully supersedes the old one; there is
//! no partial update and nothing to cancel. Any change to the draft record
//! marks the session unsaved again.
//!
//! External collaborators sit behind traits:
//! - [`Geocoder`] resolves an address to a focus coordinate
//! - [`EstimateSink`] writes a record to durable storage
//!
//! Their failures are logged and reported, but never touch the
//! (ring, conditions, estimate) state.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::area::ring_area;
use crate::conditions::{ConditionCategory, ConditionsUpdate, PropertyConditions};
use crate::error::{GeometryError, ParseLevelError};
use crate::estimate::{calculate_estimate_with, Estimate, EstimateOutcome, PricingConfig};
use crate::record::{EstimateRecord, NewEstimateRecord};
use crate::ring::CoordinateRing;
use crate::{Coordinate, SquareFeet};

/// Error type reported by external collaborators.
pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync>;

/// Zoom level used when flying to a geocoded address.
pub const ADDRESS_ZOOM: f64 = 18.0;

/// Resolves a free-text address to its best-match coordinate.
pub trait Geocoder {
    /// `Ok(None)` means the service found no match.
    fn geocode(&self, address: &str) -> Result<Option<Coordinate>, CollaboratorError>;
}

/// Durable storage for saved estimates.
pub trait EstimateSink {
    /// Write a record and return the stored version (with its id).
    fn save_estimate(&mut self, record: NewEstimateRecord)
        -> Result<EstimateRecord, CollaboratorError>;
}

/// Where the map should be centered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapFocus {
    pub center: Coordinate,
    pub zoom: f64,
}

/// Outcome of the most recent save attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SaveStatus {
    /// Nothing saved since the estimate last changed.
    Unsaved,
    Saved { id: String },
    /// The estimate stays visible and unsaved; saving can be retried.
    Failed { reason: String },
}

/// Everything the results panel shows. Derived on demand, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateView {
    pub address: String,
    pub square_footage: SquareFeet,
    pub conditions: PropertyConditions,
    pub estimate: Estimate,
    pub average: u64,
    pub per_square_foot_low: f64,
    pub per_square_foot_high: f64,
    pub base_rate: f64,
}

/// Single owner of estimator state.
#[derive(Debug, Clone)]
pub struct EstimatorController {
    pricing: PricingConfig,

    address: String,
    map_focus: Option<MapFocus>,

    // Last valid geometry
    ring: Vec<Coordinate>,
    area: SquareFeet,

    conditions: PropertyConditions,
    outcome: EstimateOutcome,

    // Set while the most recent ring was rejected
    geometry_error: Option<GeometryError>,
    is_drawing: bool,

    user_id: Option<String>,
    saved: Vec<EstimateRecord>,
    save_status: SaveStatus,
}

impl Default for EstimatorController {
    fn default() -> Self {
        Self::new()
    }
}

impl EstimatorController {
    /// Create a controller with the default rate card.
    pub fn new() -> Self {
        Self {
            pricing: PricingConfig::default(),
            address: String::new(),
            map_focus: None,
            ring: Vec::new(),
            area: SquareFeet::ZERO,
            conditions: PropertyConditions::default(),
            outcome: EstimateOutcome::NoEstimate,
            geometry_error: None,
            is_drawing: false,
            user_id: None,
            saved: Vec::new(),
            save_status: SaveStatus::Unsaved,
        }
    }

    /// Create a controller with a custom rate card.
    pub fn with_pricing(pricing: PricingConfig) -> crate::Result<Self> {
        pricing.validate()?;
        Ok(Self {
            pricing,
            ..Self::new()
        })
    }

    // ========================================================================
    // Address
    // ========================================================================

    /// Set the address label. Blank input is ignored.
    pub fn set_address(&mut self, address: &str) {
        let trimmed = address.trim();
        if trimmed.is_empty() || trimmed == self.address {
            return;
        }
        self.address = trimmed.to_string();
        self.save_status = SaveStatus::Unsaved;
    }

    /// Set the address and ask the geocoder where to point the map.
    ///
    /// Geocoding failures are logged and leave all other state untouched.
    pub fn locate_address<G: Geocoder + ?Sized>(&mut self, geocoder: &G, address: &str) {
        if address.trim().is_empty() {
            return;
        }
        self.set_address(address);

        match geocoder.geocode(&self.address) {
            Ok(Some(center)) => {
                debug!("[Controller] Geocoded '{}' -> {:?}", self.address, center);
                self.map_focus = Some(MapFocus {
                    center,
                    zoom: ADDRESS_ZOOM,
                });
            }
            Ok(None) => {
                info!("[Controller] No geocoding match for '{}'", self.address);
            }
            Err(e) => {
                warn!("[Controller] Geocoding error for '{}': {}", self.address, e);
            }
        }
    }

    // ========================================================================
    // Drawing
    // ========================================================================

    /// A ring was created or edited on the drawing surface.
    ///
    /// A malformed ring hides the results and surfaces a redraw prompt; the
    /// last valid ring and area are kept. A valid ring recenters the map on
    /// its bounding box, keeping the current zoom.
    pub fn ring_changed(&mut self, ring: Vec<Coordinate>) -> Result<SquareFeet, GeometryError> {
        self.is_drawing = false;

        match CoordinateRing::normalize(&ring) {
            Ok(normalized) => {
                let area = match &normalized {
                    Some(drawn) => {
                        self.map_focus = Some(MapFocus {
                            center: drawn.bounds().center(),
                            zoom: self.map_focus.map_or(ADDRESS_ZOOM, |focus| focus.zoom),
                        });
                        ring_area(drawn)
                    }
                    None => SquareFeet::ZERO,
                };
                debug!("[Controller] Ring of {} vertices -> {} sq ft", ring.len(), area);

                self.ring = ring;
                self.area = area;
                self.geometry_error = None;
                self.recompute();
                Ok(area)
            }
            Err(e) => {
                warn!("[Controller] Rejected drawn ring: {}", e);
                self.geometry_error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// The drawn ring was deleted.
    pub fn ring_deleted(&mut self) {
        self.ring.clear();
        self.area = SquareFeet::ZERO;
        self.geometry_error = None;
        self.is_drawing = false;
        self.recompute();
    }

    /// Drawing mode toggled on the map.
    pub fn set_drawing(&mut self, is_drawing: bool) {
        self.is_drawing = is_drawing;
    }

    // ========================================================================
    // Conditions
    // ========================================================================

    /// Select a level for one category by its wire name.
    pub fn set_condition(
        &mut self,
        category: ConditionCategory,
        value: &str,
    ) -> Result<(), ParseLevelError> {
        self.conditions.set_level(category, value)?;
        self.recompute();
        Ok(())
    }

    /// Merge a partial conditions update.
    pub fn update_conditions(&mut self, update: ConditionsUpdate) {
        self.conditions.apply(update);
        self.recompute();
    }

    /// Replace the outcome. The draft record changed, so any earlier save no
    /// longer describes it.
    fn recompute(&mut self) {
        self.outcome = calculate_estimate_with(self.area, &self.conditions, &self.pricing);
        self.save_status = SaveStatus::Unsaved;
    }

    // ========================================================================
    // Results
    // ========================================================================

    /// Results panel contents, or `None` when it should be hidden.
    pub fn results(&self) -> Option<EstimateView> {
        if self.geometry_error.is_some() {
            return None;
        }
        let estimate = self.outcome.estimate()?;
        let (per_square_foot_low, per_square_foot_high) =
            estimate.per_square_foot(self.area)?;

        Some(EstimateView {
            address: self.address.clone(),
            square_footage: self.area,
            conditions: self.conditions,
            estimate,
            average: estimate.average(),
            per_square_foot_low,
            per_square_foot_high,
            base_rate: self.pricing.base_rate,
        })
    }

    /// Prompt to show instead of results after a rejected ring.
    pub fn redraw_prompt(&self) -> Option<&'static str> {
        self.geometry_error.as_ref().map(GeometryError::user_message)
    }

    // ========================================================================
    // Saving
    // ========================================================================

    /// Set (or clear) the identity saved estimates are owned by.
    pub fn set_user(&mut self, user_id: Option<String>) {
        self.user_id = user_id.filter(|id| !id.trim().is_empty());
    }

    /// Record for the current estimate, if one is showing and a user is set.
    pub fn draft_record(&self) -> Option<NewEstimateRecord> {
        let user_id = self.user_id.as_ref()?;
        let view = self.results()?;

        Some(NewEstimateRecord::new(
            user_id.clone(),
            self.address.clone(),
            self.ring.clone(),
            view.square_footage,
            view.conditions,
            view.estimate,
        ))
    }

    /// Write the current estimate. Never alters the computed estimate.
    pub fn save<S: EstimateSink + ?Sized>(&mut self, sink: &mut S) -> &SaveStatus {
        let status = match self.draft_record() {
            None => {
                let reason = if self.user_id.is_none() {
                    "sign in to save estimates"
                } else {
                    "no estimate to save"
                };
                SaveStatus::Failed {
                    reason: reason.to_string(),
                }
            }
            Some(record) => match sink.save_estimate(record) {
                Ok(saved) => {
                    info!("[Controller] Saved estimate {}", saved.id);
                    let id = saved.id.clone();
                    self.saved.push(saved);
                    SaveStatus::Saved { id }
                }
                Err(e) => {
                    warn!("[Controller] Save failed: {}", e);
                    SaveStatus::Failed {
                        reason: e.to_string(),
                    }
                }
            },
        };

        self.save_status = status;
        &self.save_status
    }

    /// Start over. The user identity and saved estimates are kept.
    pub fn clear(&mut self) {
        self.address.clear();
        self.map_focus = None;
        self.ring.clear();
        self.area = SquareFeet::ZERO;
        self.conditions = PropertyConditions::default();
        self.outcome = EstimateOutcome::NoEstimate;
        self.geometry_error = None;
        self.is_drawing = false;
        self.save_status = SaveStatus::Unsaved;
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn map_focus(&self) -> Option<MapFocus> {
        self.map_focus
    }

    pub fn ring(&self) -> &[Coordinate] {
        &self.ring
    }

    pub fn area(&self) -> SquareFeet {
        self.area
    }

    pub fn conditions(&self) -> PropertyConditions {
        self.conditions
    }

    pub fn outcome(&self) -> EstimateOutcome {
        self.outcome
    }

    pub fn geometry_error(&self) -> Option<&GeometryError> {
        self.geometry_error.as_ref()
    }

    pub fn is_drawing(&self) -> bool {
        self.is_drawing
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn saved_estimates(&self) -> &[EstimateRecord] {
        &self.saved
    }

    pub fn save_status(&self) -> &SaveStatus {
        &self.save_status
    }

    pub fn pricing(&self) -> &PricingConfig {
        &self.pricing
    }
}
