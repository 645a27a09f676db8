//! In-memory TTL cache for route and location reads.
//!
//! Three slot kinds: the full route list, the full location list, and one
//! slot per route holding that route's filtered locations. Each kind has its
//! own time-to-live. Entries are never evicted; they expire in place and are
//! cleared explicitly when a mutation touches the entity type.
//!
//! Locks are plain `std::sync::Mutex` and are never held across an await
//! point.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::models::{Location, Route};

/// Route list entries stay fresh for 10 minutes.
pub const ROUTES_TTL_MINUTES: i64 = 10;

/// The unfiltered location list stays fresh for 5 minutes.
pub const LOCATIONS_TTL_MINUTES: i64 = 5;

/// Per-route location slots stay fresh for 8 minutes.
pub const ROUTE_LOCATIONS_TTL_MINUTES: i64 = 8;

/// One cached value with its fetch timestamp.
/// The etag is carried for future conditional requests but not used yet.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
    pub etag: Option<String>,
}

impl<T> CacheEntry<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
            etag: None,
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.cached_at).num_minutes()
    }

    pub fn is_fresh(&self, ttl_minutes: i64) -> bool {
        Utc::now() - self.cached_at < Duration::minutes(ttl_minutes)
    }
}

/// The in-memory cache owned by a `DataService`.
///
/// Constructed once per service instance and injected, never kept as a
/// process-wide singleton.
#[derive(Default)]
pub struct CacheStore {
    routes: Mutex<Option<CacheEntry<Vec<Route>>>>,
    locations: Mutex<Option<CacheEntry<Vec<Location>>>>,
    route_locations: Mutex<HashMap<i64, CacheEntry<Vec<Location>>>>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ===== Routes =====

    /// The cached route list, only if within its TTL.
    pub fn fresh_routes(&self) -> Option<Vec<Route>> {
        let guard = self.routes.lock().unwrap();
        guard
            .as_ref()
            .filter(|entry| entry.is_fresh(ROUTES_TTL_MINUTES))
            .map(|entry| entry.data.clone())
    }

    /// The cached route list regardless of age, for network-failure fallback.
    pub fn any_routes(&self) -> Option<Vec<Route>> {
        let guard = self.routes.lock().unwrap();
        guard.as_ref().map(|entry| {
            debug!(age_minutes = entry.age_minutes(), "Serving routes from cache fallback");
            entry.data.clone()
        })
    }

    pub fn put_routes(&self, routes: Vec<Route>) {
        *self.routes.lock().unwrap() = Some(CacheEntry::new(routes));
    }

    pub fn invalidate_routes(&self) {
        *self.routes.lock().unwrap() = None;
    }

    // ===== Locations (unfiltered) =====

    pub fn fresh_locations(&self) -> Option<Vec<Location>> {
        let guard = self.locations.lock().unwrap();
        guard
            .as_ref()
            .filter(|entry| entry.is_fresh(LOCATIONS_TTL_MINUTES))
            .map(|entry| entry.data.clone())
    }

    pub fn any_locations(&self) -> Option<Vec<Location>> {
        let guard = self.locations.lock().unwrap();
        guard.as_ref().map(|entry| entry.data.clone())
    }

    pub fn put_locations(&self, locations: Vec<Location>) {
        *self.locations.lock().unwrap() = Some(CacheEntry::new(locations));
    }

    // ===== Locations (per route) =====

    pub fn fresh_route_locations(&self, route_id: i64) -> Option<Vec<Location>> {
        let guard = self.route_locations.lock().unwrap();
        guard
            .get(&route_id)
            .filter(|entry| entry.is_fresh(ROUTE_LOCATIONS_TTL_MINUTES))
            .map(|entry| entry.data.clone())
    }

    pub fn any_route_locations(&self, route_id: i64) -> Option<Vec<Location>> {
        let guard = self.route_locations.lock().unwrap();
        guard.get(&route_id).map(|entry| entry.data.clone())
    }

    pub fn put_route_locations(&self, route_id: i64, locations: Vec<Location>) {
        self.route_locations
            .lock()
            .unwrap()
            .insert(route_id, CacheEntry::new(locations));
    }

    /// Clear the unfiltered list and every per-route slot.
    pub fn invalidate_locations(&self) {
        *self.locations.lock().unwrap() = None;
        self.route_locations.lock().unwrap().clear();
    }

    /// Backdate a slot so tests can exercise TTL expiry.
    #[cfg(test)]
    pub fn backdate_routes(&self, minutes: i64) {
        if let Some(entry) = self.routes.lock().unwrap().as_mut() {
            entry.cached_at = Utc::now() - Duration::minutes(minutes);
        }
    }

    #[cfg(test)]
    pub fn backdate_route_locations(&self, route_id: i64, minutes: i64) {
        if let Some(entry) = self.route_locations.lock().unwrap().get_mut(&route_id) {
            entry.cached_at = Utc::now() - Duration::minutes(minutes);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordId;

    fn route(id: i64) -> Route {
        Route {
            id: RecordId::Persisted(id),
            route: format!("R-{}", id),
            shift: "morning".to_string(),
            warehouse: "north".to_string(),
            description: String::new(),
        }
    }

    #[test]
    fn test_entry_freshness() {
        let entry = CacheEntry::new(vec![1, 2, 3]);
        assert!(entry.is_fresh(10));

        let mut old = CacheEntry::new(vec![1]);
        old.cached_at = Utc::now() - Duration::minutes(11);
        assert!(!old.is_fresh(10));
        assert!(old.age_minutes() >= 11);
    }

    #[test]
    fn test_expired_routes_miss_but_fallback_hits() {
        let cache = CacheStore::new();
        cache.put_routes(vec![route(1)]);
        assert!(cache.fresh_routes().is_some());

        cache.backdate_routes(ROUTES_TTL_MINUTES + 1);
        assert!(cache.fresh_routes().is_none());
        assert_eq!(cache.any_routes().unwrap().len(), 1);
    }

    #[test]
    fn test_invalidate_locations_clears_route_slots() {
        let cache = CacheStore::new();
        cache.put_locations(vec![]);
        cache.put_route_locations(5, vec![]);

        cache.invalidate_locations();
        assert!(cache.any_locations().is_none());
        assert!(cache.any_route_locations(5).is_none());
    }

    #[test]
    fn test_route_slots_are_independent() {
        let cache = CacheStore::new();
        cache.put_route_locations(1, vec![]);
        assert!(cache.fresh_route_locations(1).is_some());
        assert!(cache.fresh_route_locations(2).is_none());
    }
}
