//! Built-in dataset served when the network fails and no cache exists.
//!
//! Keeps the UI populated with something plausible instead of an empty
//! screen on first launch without connectivity.

use crate::models::{Location, RecordId, Route};

pub fn routes() -> Vec<Route> {
    vec![
        Route {
            id: RecordId::Persisted(1),
            route: "R-101".to_string(),
            shift: "morning".to_string(),
            warehouse: "North Depot".to_string(),
            description: "City center loop".to_string(),
        },
        Route {
            id: RecordId::Persisted(2),
            route: "R-102".to_string(),
            shift: "evening".to_string(),
            warehouse: "North Depot".to_string(),
            description: "Industrial park".to_string(),
        },
        Route {
            id: RecordId::Persisted(3),
            route: "R-201".to_string(),
            shift: "night".to_string(),
            warehouse: "South Depot".to_string(),
            description: String::new(),
        },
    ]
}

pub fn locations() -> Vec<Location> {
    vec![
        location(1, 1, "Central Market", "Loading dock B", 52.2297, 21.0122),
        location(2, 1, "Station Kiosk", "Front entrance", 52.2319, 21.0067),
        location(3, 2, "Assembly Hall 3", "Gate 12, ring first", 52.1942, 21.0347),
    ]
}

/// The fallback locations for one route.
pub fn route_locations(route_id: i64) -> Vec<Location> {
    locations()
        .into_iter()
        .filter(|l| l.route_id.raw() == route_id)
        .collect()
}

fn location(id: i64, route_id: i64, name: &str, delivery: &str, lat: f64, lon: f64) -> Location {
    Location {
        id: RecordId::Persisted(id),
        no: Some(id),
        code: Some(format!("LOC-{:03}", id)),
        location: name.to_string(),
        delivery: Some(delivery.to_string()),
        images: Vec::new(),
        power_mode: None,
        route_id: RecordId::Persisted(route_id),
        qr_code_image_url: None,
        qr_code_destination_url: None,
        latitude: Some(lat),
        longitude: Some(lon),
        address: None,
        is_new: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_ids_are_persisted() {
        assert!(routes().iter().all(|r| !r.id.is_pending()));
        assert!(locations().iter().all(|l| !l.id.is_pending()));
    }

    #[test]
    fn test_route_locations_filters() {
        assert_eq!(route_locations(1).len(), 2);
        assert_eq!(route_locations(3).len(), 0);
    }
}
