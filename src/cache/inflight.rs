//! In-flight request deduplication.
//!
//! Concurrent reads of the same cache slot share one backend request: the
//! first caller installs a shared future, later callers clone and await it,
//! and the installer clears the slot once the request settles. Success or
//! failure, every waiter observes the same outcome.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;

use crate::models::{Location, Route};

/// A cloneable in-flight fetch. `anyhow::Error` is not `Clone`, so failures
/// are shared behind an `Arc`.
pub type SharedFetch<T> = Shared<BoxFuture<'static, Result<Vec<T>, Arc<anyhow::Error>>>>;

/// Pending fetches, one slot per cache key.
#[derive(Default)]
pub struct InflightMap {
    routes: Mutex<Option<SharedFetch<Route>>>,
    locations: Mutex<Option<SharedFetch<Location>>>,
    route_locations: Mutex<HashMap<i64, SharedFetch<Location>>>,
}

impl InflightMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the pending route fetch, or install a new one built by `make`.
    /// Returns the future to await and whether this caller installed it
    /// (and therefore owns clearing the slot).
    pub fn join_routes<F>(&self, make: F) -> (SharedFetch<Route>, bool)
    where
        F: FnOnce() -> BoxFuture<'static, Result<Vec<Route>, Arc<anyhow::Error>>>,
    {
        let mut guard = self.routes.lock().unwrap();
        if let Some(fut) = guard.as_ref() {
            (fut.clone(), false)
        } else {
            let fut = make().shared();
            *guard = Some(fut.clone());
            (fut, true)
        }
    }

    pub fn clear_routes(&self) {
        *self.routes.lock().unwrap() = None;
    }

    pub fn join_locations<F>(&self, make: F) -> (SharedFetch<Location>, bool)
    where
        F: FnOnce() -> BoxFuture<'static, Result<Vec<Location>, Arc<anyhow::Error>>>,
    {
        let mut guard = self.locations.lock().unwrap();
        if let Some(fut) = guard.as_ref() {
            (fut.clone(), false)
        } else {
            let fut = make().shared();
            *guard = Some(fut.clone());
            (fut, true)
        }
    }

    pub fn clear_locations(&self) {
        *self.locations.lock().unwrap() = None;
    }

    pub fn join_route_locations<F>(&self, route_id: i64, make: F) -> (SharedFetch<Location>, bool)
    where
        F: FnOnce() -> BoxFuture<'static, Result<Vec<Location>, Arc<anyhow::Error>>>,
    {
        let mut guard = self.route_locations.lock().unwrap();
        if let Some(fut) = guard.get(&route_id) {
            (fut.clone(), false)
        } else {
            let fut = make().shared();
            guard.insert(route_id, fut.clone());
            (fut, true)
        }
    }

    pub fn clear_route_locations(&self, route_id: i64) {
        self.route_locations.lock().unwrap().remove(&route_id);
    }
}
