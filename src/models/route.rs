//! Delivery route records.

use serde::{Deserialize, Serialize};

use super::{RecordId, ValidationError};

/// A delivery route as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: RecordId,
    pub route: String,
    pub shift: String,
    pub warehouse: String,
    #[serde(default)]
    pub description: String,
}

impl Route {
    /// Build a not-yet-persisted route with a placeholder ID.
    pub fn draft(route: &str, shift: &str, warehouse: &str) -> Self {
        Self {
            id: RecordId::new_pending(),
            route: route.to_string(),
            shift: shift.to_string(),
            warehouse: warehouse.to_string(),
            description: String::new(),
        }
    }

    /// Check the fields the backend requires before a create is attempted.
    pub fn validate_for_create(&self) -> Result<(), ValidationError> {
        for (name, value) in [
            ("route", &self.route),
            ("shift", &self.shift),
            ("warehouse", &self.warehouse),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingRouteField(name));
            }
        }
        Ok(())
    }
}

/// Create payload: a route without its client-side placeholder ID.
#[derive(Debug, Clone, Serialize)]
pub struct NewRoute {
    pub route: String,
    pub shift: String,
    pub warehouse: String,
    pub description: String,
}

impl From<&Route> for NewRoute {
    fn from(route: &Route) -> Self {
        Self {
            route: route.route.clone(),
            shift: route.shift.clone(),
            warehouse: route.warehouse.clone(),
            description: route.description.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_for_create_rejects_blank_fields() {
        let mut route = Route::draft("R-12", "morning", "north");
        assert!(route.validate_for_create().is_ok());

        route.shift = "  ".to_string();
        let err = route.validate_for_create().unwrap_err();
        assert!(err.to_string().contains("shift"));
    }

    #[test]
    fn test_new_route_payload_has_no_id() {
        let route = Route::draft("R-1", "night", "south");
        let payload = serde_json::to_value(NewRoute::from(&route)).unwrap();
        assert!(payload.get("id").is_none());
        assert_eq!(payload["route"], "R-1");
    }
}
