//! Network-backed storage: delegates straight to the `ApiClient`.

use anyhow::Result;
use async_trait::async_trait;

use crate::api::ApiClient;
use crate::models::{Location, NewLocation, NewRoute, Route};

use super::Backend;

pub struct RemoteBackend {
    api: ApiClient,
}

impl RemoteBackend {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Backend for RemoteBackend {
    async fn fetch_routes(&self) -> Result<Vec<Route>> {
        self.api.fetch_routes().await
    }

    async fn create_route(&self, route: &NewRoute) -> Result<()> {
        self.api.create_route(route).await
    }

    async fn update_routes(&self, routes: &[Route]) -> Result<()> {
        self.api.update_routes(routes).await
    }

    async fn update_route(&self, route: &Route) -> Result<()> {
        self.api.update_route(route).await
    }

    async fn delete_route(&self, id: i64) -> Result<()> {
        self.api.delete_route(id).await
    }

    async fn fetch_locations(&self) -> Result<Vec<Location>> {
        self.api.fetch_locations().await
    }

    async fn fetch_route_locations(&self, route_id: i64) -> Result<Vec<Location>> {
        self.api.fetch_route_locations(route_id).await
    }

    async fn create_location(&self, location: &NewLocation) -> Result<()> {
        self.api.create_location(location).await
    }

    async fn update_locations(&self, locations: &[Location]) -> Result<()> {
        self.api.update_locations(locations).await
    }

    async fn update_location(&self, location: &Location) -> Result<()> {
        self.api.update_location(location).await
    }

    async fn delete_location(&self, id: i64) -> Result<()> {
        self.api.delete_location(id).await
    }

    async fn add_location_images(&self, id: i64, urls: &[String]) -> Result<()> {
        self.api.add_location_images(id, urls).await
    }

    async fn remove_location_image(&self, id: i64, url: &str) -> Result<()> {
        self.api.remove_location_image(id, url).await
    }
}
