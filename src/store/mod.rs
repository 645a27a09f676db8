//! Storage backends for the data service.
//!
//! The `Backend` trait is the seam between the service's cache/validation
//! logic and where records actually live. `RemoteBackend` talks to the REST
//! backend; `LocalBackend` keeps everything in local JSON files for offline
//! use. The implementation is chosen once, at service construction.

pub mod local;
pub mod remote;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Location, NewLocation, NewRoute, Route};

pub use local::LocalBackend;
pub use remote::RemoteBackend;

#[async_trait]
pub trait Backend: Send + Sync {
    async fn fetch_routes(&self) -> Result<Vec<Route>>;
    async fn create_route(&self, route: &NewRoute) -> Result<()>;
    async fn update_routes(&self, routes: &[Route]) -> Result<()>;
    async fn update_route(&self, route: &Route) -> Result<()>;
    async fn delete_route(&self, id: i64) -> Result<()>;

    async fn fetch_locations(&self) -> Result<Vec<Location>>;
    async fn fetch_route_locations(&self, route_id: i64) -> Result<Vec<Location>>;
    async fn create_location(&self, location: &NewLocation) -> Result<()>;
    async fn update_locations(&self, locations: &[Location]) -> Result<()>;
    async fn update_location(&self, location: &Location) -> Result<()>;
    async fn delete_location(&self, id: i64) -> Result<()>;

    async fn add_location_images(&self, id: i64, urls: &[String]) -> Result<()>;
    async fn remove_location_image(&self, id: i64, url: &str) -> Result<()>;
}
