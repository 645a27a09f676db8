//! Caching for route and location reads.
//!
//! `CacheStore` holds the TTL'd slots; `InflightMap` deduplicates
//! concurrent fetches for the same slot. Both are owned by a `DataService`
//! instance rather than living in process-global state.

pub mod inflight;
pub mod store;

pub use inflight::{InflightMap, SharedFetch};
pub use store::{
    CacheEntry, CacheStore, LOCATIONS_TTL_MINUTES, ROUTES_TTL_MINUTES,
    ROUTE_LOCATIONS_TTL_MINUTES,
};
