//! Delivery location records.

use serde::{Deserialize, Serialize};

use super::{RecordId, ValidationError};

/// A delivery location attached to a route.
///
/// `is_new` is client-side state only and never reaches the wire; the
/// create payload is `NewLocation`, which also drops the placeholder ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: RecordId,
    #[serde(default)]
    pub no: Option<i64>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub delivery: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub power_mode: Option<String>,
    pub route_id: RecordId,
    #[serde(default)]
    pub qr_code_image_url: Option<String>,
    #[serde(default)]
    pub qr_code_destination_url: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, skip_serializing)]
    pub is_new: bool,
}

impl Location {
    /// Build a not-yet-persisted location for the given route.
    pub fn draft(location: &str, route_id: RecordId) -> Self {
        Self {
            id: RecordId::new_pending(),
            no: None,
            code: None,
            location: location.to_string(),
            delivery: None,
            images: Vec::new(),
            power_mode: None,
            route_id,
            qr_code_image_url: None,
            qr_code_destination_url: None,
            latitude: None,
            longitude: None,
            address: None,
            is_new: true,
        }
    }

    /// Whether saving this record means a create rather than an update.
    pub fn needs_create(&self) -> bool {
        self.is_new || self.id.is_pending()
    }

    /// Check the invariants the backend requires before a create is attempted.
    ///
    /// A location must name its site and must reference a route the backend
    /// already knows about; a placeholder `route_id` means the parent route
    /// has not been saved yet.
    pub fn validate_for_create(&self) -> Result<(), ValidationError> {
        if self.route_id.is_pending() {
            return Err(ValidationError::UnsavedRoute);
        }
        if self.location.trim().is_empty() {
            return Err(ValidationError::MissingLocationField("location"));
        }
        Ok(())
    }
}

/// Create payload: a location stripped of `id` and `is_new`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLocation {
    pub no: Option<i64>,
    pub code: Option<String>,
    pub location: String,
    pub delivery: Option<String>,
    pub images: Vec<String>,
    pub power_mode: Option<String>,
    pub route_id: RecordId,
    pub qr_code_image_url: Option<String>,
    pub qr_code_destination_url: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
}

impl From<&Location> for NewLocation {
    fn from(loc: &Location) -> Self {
        Self {
            no: loc.no,
            code: loc.code.clone(),
            location: loc.location.clone(),
            delivery: loc.delivery.clone(),
            images: loc.images.clone(),
            power_mode: loc.power_mode.clone(),
            route_id: loc.route_id,
            qr_code_image_url: loc.qr_code_image_url.clone(),
            qr_code_destination_url: loc.qr_code_destination_url.clone(),
            latitude: loc.latitude,
            longitude: loc.longitude,
            address: loc.address.clone(),
        }
    }
}
