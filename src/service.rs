//! The data access service: the read/write surface the UI talks to.
//!
//! Reads go through the TTL cache and in-flight dedup, and never fail: a
//! network error falls back to the last cached value (fresh or stale), then
//! to the built-in dataset. Writes validate locally first, then talk to the
//! backend and invalidate the affected cache slots. Nothing here retries.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::future::try_join_all;
use futures::FutureExt;
use tracing::{debug, warn};

use crate::api::ApiClient;
use crate::cache::{CacheStore, InflightMap};
use crate::config::Config;
use crate::fallback;
use crate::models::{Location, NewLocation, NewRoute, RecordId, Route};
use crate::store::{Backend, LocalBackend, RemoteBackend};

pub struct DataService {
    backend: Arc<dyn Backend>,
    cache: CacheStore,
    inflight: InflightMap,
}

impl DataService {
    /// Build a service against the backend the configuration selects.
    pub fn new(config: &Config) -> Result<Self> {
        let backend: Arc<dyn Backend> = if config.use_local_store {
            Arc::new(LocalBackend::new(config.local_store_dir()?)?)
        } else {
            Arc::new(RemoteBackend::new(ApiClient::new(&config.api_base_url)?))
        };
        Ok(Self::with_backend(backend))
    }

    /// Build a service over an explicit backend.
    pub fn with_backend(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            cache: CacheStore::new(),
            inflight: InflightMap::new(),
        }
    }

    // ===== Reads =====

    /// All routes. Serves the cache when fresh (unless forced), otherwise
    /// fetches; on failure falls back to stale cache, then to the built-in
    /// dataset. Never returns an error.
    pub async fn get_routes(&self, force_refresh: bool) -> Vec<Route> {
        if !force_refresh {
            if let Some(routes) = self.cache.fresh_routes() {
                debug!(count = routes.len(), "Routes served from cache");
                return routes;
            }
        }

        match self.fetch_routes_shared().await {
            Ok(routes) => {
                self.cache.put_routes(routes.clone());
                routes
            }
            Err(e) => {
                warn!(error = %e, "Route fetch failed, using fallback");
                self.cache.any_routes().unwrap_or_else(fallback::routes)
            }
        }
    }

    /// Locations, either the full list or one route's filtered list.
    /// Same cache/dedup/fallback behavior as `get_routes`.
    pub async fn get_detail_data(
        &self,
        route_id: Option<i64>,
        force_refresh: bool,
    ) -> Vec<Location> {
        match route_id {
            Some(id) => self.get_route_locations(id, force_refresh).await,
            None => self.get_all_locations(force_refresh).await,
        }
    }

    async fn get_all_locations(&self, force_refresh: bool) -> Vec<Location> {
        if !force_refresh {
            if let Some(locations) = self.cache.fresh_locations() {
                debug!(count = locations.len(), "Locations served from cache");
                return locations;
            }
        }

        match self.fetch_locations_shared().await {
            Ok(locations) => {
                self.cache.put_locations(locations.clone());
                locations
            }
            Err(e) => {
                warn!(error = %e, "Location fetch failed, using fallback");
                self.cache.any_locations().unwrap_or_else(fallback::locations)
            }
        }
    }

    async fn get_route_locations(&self, route_id: i64, force_refresh: bool) -> Vec<Location> {
        if !force_refresh {
            if let Some(locations) = self.cache.fresh_route_locations(route_id) {
                debug!(route_id, count = locations.len(), "Route locations served from cache");
                return locations;
            }
        }

        match self.fetch_route_locations_shared(route_id).await {
            Ok(locations) => {
                self.cache.put_route_locations(route_id, locations.clone());
                locations
            }
            Err(e) => {
                warn!(route_id, error = %e, "Route location fetch failed, using fallback");
                self.cache
                    .any_route_locations(route_id)
                    .unwrap_or_else(|| fallback::route_locations(route_id))
            }
        }
    }

    // One backend request per slot at a time; later callers share the same
    // future and the installer clears the slot once it settles.

    async fn fetch_routes_shared(&self) -> Result<Vec<Route>, Arc<anyhow::Error>> {
        let backend = Arc::clone(&self.backend);
        let (fut, owner) = self
            .inflight
            .join_routes(move || async move { backend.fetch_routes().await.map_err(Arc::new) }.boxed());
        let result = fut.await;
        if owner {
            self.inflight.clear_routes();
        }
        result
    }

    async fn fetch_locations_shared(&self) -> Result<Vec<Location>, Arc<anyhow::Error>> {
        let backend = Arc::clone(&self.backend);
        let (fut, owner) = self.inflight.join_locations(move || {
            async move { backend.fetch_locations().await.map_err(Arc::new) }.boxed()
        });
        let result = fut.await;
        if owner {
            self.inflight.clear_locations();
        }
        result
    }

    async fn fetch_route_locations_shared(
        &self,
        route_id: i64,
    ) -> Result<Vec<Location>, Arc<anyhow::Error>> {
        let backend = Arc::clone(&self.backend);
        let (fut, owner) = self.inflight.join_route_locations(route_id, move || {
            async move {
                backend
                    .fetch_route_locations(route_id)
                    .await
                    .map_err(Arc::new)
            }
            .boxed()
        });
        let result = fut.await;
        if owner {
            self.inflight.clear_route_locations(route_id);
        }
        result
    }

    // ===== Writes =====

    /// Save a mixed batch of routes: pending IDs are created, persisted IDs
    /// are batch-updated. An update is only sent for IDs the backend
    /// actually knows about. Any failure fails the whole call.
    pub async fn save_routes(&self, routes: &[Route]) -> Result<()> {
        // Validate creates before anything touches the network.
        for route in routes.iter().filter(|r| r.id.is_pending()) {
            route.validate_for_create()?;
        }

        let existing = self
            .backend
            .fetch_routes()
            .await
            .context("Failed to fetch existing routes")?;
        let existing_ids: HashSet<i64> =
            existing.iter().filter_map(|r| r.id.as_persisted()).collect();

        let mut creates = Vec::new();
        let mut updates = Vec::new();
        for route in routes {
            match route.id {
                RecordId::Pending(_) => creates.push(NewRoute::from(route)),
                RecordId::Persisted(id) => {
                    if existing_ids.contains(&id) {
                        updates.push(route.clone());
                    } else {
                        debug!(id, "Skipping update for route unknown to the backend");
                    }
                }
            }
        }

        try_join_all(creates.iter().map(|c| self.backend.create_route(c)))
            .await
            .context("Failed to create routes")?;
        if !updates.is_empty() {
            self.backend
                .update_routes(&updates)
                .await
                .context("Failed to update routes")?;
        }

        self.cache.invalidate_routes();
        Ok(())
    }

    /// Save a mixed batch of locations. Creates that fail validation (blank
    /// name, or a route that has not been saved yet) are skipped, and the
    /// valid entries still go through. A batch-update failure is logged but
    /// does not fail the call or roll back the created rows.
    pub async fn save_locations(&self, locations: &[Location]) -> Result<()> {
        let mut creates = Vec::new();
        let mut updates = Vec::new();
        for location in locations {
            if location.needs_create() {
                match location.validate_for_create() {
                    Ok(()) => creates.push(NewLocation::from(location)),
                    Err(e) => warn!(id = %location.id, error = %e, "Skipping location create"),
                }
            } else {
                updates.push(location.clone());
            }
        }

        try_join_all(creates.iter().map(|c| self.backend.create_location(c)))
            .await
            .context("Failed to create locations")?;

        if !updates.is_empty() {
            // Intentional partial-success semantics: created rows are kept
            // even when the batch update fails.
            if let Err(e) = self.backend.update_locations(&updates).await {
                warn!(error = %e, "Batch location update failed, created rows were kept");
            }
        }

        // Location counts feed route summaries, so both entity caches go.
        self.cache.invalidate_locations();
        self.cache.invalidate_routes();
        Ok(())
    }

    pub async fn update_route(&self, route: &Route) -> Result<()> {
        self.backend.update_route(route).await?;
        self.cache.invalidate_routes();
        Ok(())
    }

    pub async fn update_location(&self, location: &Location) -> Result<()> {
        self.backend.update_location(location).await?;
        self.cache.invalidate_locations();
        Ok(())
    }

    /// Delete a route. The backend cascades to its locations, so both
    /// entity caches are invalidated.
    pub async fn delete_route(&self, id: i64) -> Result<()> {
        self.backend.delete_route(id).await?;
        self.cache.invalidate_routes();
        self.cache.invalidate_locations();
        Ok(())
    }

    pub async fn delete_location(&self, id: i64) -> Result<()> {
        self.backend.delete_location(id).await?;
        self.cache.invalidate_locations();
        Ok(())
    }

    /// Attach one hosted image URL to a location. Normalized to the batch
    /// call so both shapes produce an identical payload.
    pub async fn add_image_to_location(&self, location_id: i64, url: &str) -> Result<()> {
        self.add_images_to_location(location_id, &[url.to_string()])
            .await
    }

    /// Attach hosted image URLs to a location. The server deduplicates.
    pub async fn add_images_to_location(&self, location_id: i64, urls: &[String]) -> Result<()> {
        self.backend.add_location_images(location_id, urls).await?;
        self.cache.invalidate_locations();
        Ok(())
    }

    pub async fn remove_image_from_location(&self, location_id: i64, url: &str) -> Result<()> {
        self.backend.remove_location_image(location_id, url).await?;
        self.cache.invalidate_locations();
        Ok(())
    }
}
