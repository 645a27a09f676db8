//! Local persistent storage: two JSON files instead of a network.
//!
//! Mirrors the backend's observable behavior closely enough that the data
//! service can run against it unchanged: creates assign the next small
//! integer ID, image inserts deduplicate, and deleting a route cascades to
//! its locations.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::models::{Location, NewLocation, NewRoute, RecordId, Route};

use super::Backend;

const ROUTES_FILE: &str = "routes.json";
const LOCATIONS_FILE: &str = "locations.json";

pub struct LocalBackend {
    dir: PathBuf,
    // Serializes read-modify-write cycles on the two files.
    lock: Mutex<()>,
}

impl LocalBackend {
    pub fn new(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create local store directory {}", dir.display()))?;
        Ok(Self {
            dir,
            lock: Mutex::new(()),
        })
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    fn load_file<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    fn save_file<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
        let contents = serde_json::to_string_pretty(items)?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    fn load_routes(&self) -> Result<Vec<Route>> {
        Self::load_file(&self.path(ROUTES_FILE))
    }

    fn save_routes(&self, routes: &[Route]) -> Result<()> {
        Self::save_file(&self.path(ROUTES_FILE), routes)
    }

    fn load_locations(&self) -> Result<Vec<Location>> {
        Self::load_file(&self.path(LOCATIONS_FILE))
    }

    fn save_locations(&self, locations: &[Location]) -> Result<()> {
        Self::save_file(&self.path(LOCATIONS_FILE), locations)
    }

    fn next_id(ids: impl Iterator<Item = RecordId>) -> i64 {
        ids.filter_map(|id| id.as_persisted()).max().unwrap_or(0) + 1
    }
}

#[async_trait]
impl Backend for LocalBackend {
    async fn fetch_routes(&self) -> Result<Vec<Route>> {
        let _guard = self.lock.lock().unwrap();
        self.load_routes()
    }

    async fn create_route(&self, route: &NewRoute) -> Result<()> {
        let _guard = self.lock.lock().unwrap();
        let mut routes = self.load_routes()?;
        let id = Self::next_id(routes.iter().map(|r| r.id));
        debug!(id, route = %route.route, "Creating route in local store");
        routes.push(Route {
            id: RecordId::Persisted(id),
            route: route.route.clone(),
            shift: route.shift.clone(),
            warehouse: route.warehouse.clone(),
            description: route.description.clone(),
        });
        self.save_routes(&routes)
    }

    async fn update_routes(&self, updates: &[Route]) -> Result<()> {
        let _guard = self.lock.lock().unwrap();
        let mut routes = self.load_routes()?;
        for update in updates {
            if let Some(existing) = routes.iter_mut().find(|r| r.id == update.id) {
                *existing = update.clone();
            }
        }
        self.save_routes(&routes)
    }

    async fn update_route(&self, route: &Route) -> Result<()> {
        let _guard = self.lock.lock().unwrap();
        let mut routes = self.load_routes()?;
        let existing = routes
            .iter_mut()
            .find(|r| r.id == route.id)
            .with_context(|| format!("Route {} not found in local store", route.id))?;
        *existing = route.clone();
        self.save_routes(&routes)
    }

    async fn delete_route(&self, id: i64) -> Result<()> {
        let _guard = self.lock.lock().unwrap();
        let mut routes = self.load_routes()?;
        routes.retain(|r| r.id.raw() != id);
        self.save_routes(&routes)?;

        // Cascade, as the real backend does server-side.
        let mut locations = self.load_locations()?;
        let before = locations.len();
        locations.retain(|l| l.route_id.raw() != id);
        if locations.len() != before {
            debug!(route_id = id, removed = before - locations.len(), "Cascaded route delete");
        }
        self.save_locations(&locations)
    }

    async fn fetch_locations(&self) -> Result<Vec<Location>> {
        let _guard = self.lock.lock().unwrap();
        self.load_locations()
    }

    async fn fetch_route_locations(&self, route_id: i64) -> Result<Vec<Location>> {
        let _guard = self.lock.lock().unwrap();
        let locations = self.load_locations()?;
        Ok(locations
            .into_iter()
            .filter(|l| l.route_id.raw() == route_id)
            .collect())
    }

    async fn create_location(&self, location: &NewLocation) -> Result<()> {
        let _guard = self.lock.lock().unwrap();
        let mut locations = self.load_locations()?;
        let id = Self::next_id(locations.iter().map(|l| l.id));
        locations.push(Location {
            id: RecordId::Persisted(id),
            no: location.no,
            code: location.code.clone(),
            location: location.location.clone(),
            delivery: location.delivery.clone(),
            images: location.images.clone(),
            power_mode: location.power_mode.clone(),
            route_id: location.route_id,
            qr_code_image_url: location.qr_code_image_url.clone(),
            qr_code_destination_url: location.qr_code_destination_url.clone(),
            latitude: location.latitude,
            longitude: location.longitude,
            address: location.address.clone(),
            is_new: false,
        });
        self.save_locations(&locations)
    }

    async fn update_locations(&self, updates: &[Location]) -> Result<()> {
        let _guard = self.lock.lock().unwrap();
        let mut locations = self.load_locations()?;
        for update in updates {
            if let Some(existing) = locations.iter_mut().find(|l| l.id == update.id) {
                *existing = update.clone();
            }
        }
        self.save_locations(&locations)
    }

    async fn update_location(&self, location: &Location) -> Result<()> {
        let _guard = self.lock.lock().unwrap();
        let mut locations = self.load_locations()?;
        let existing = locations
            .iter_mut()
            .find(|l| l.id == location.id)
            .with_context(|| format!("Location {} not found in local store", location.id))?;
        *existing = location.clone();
        self.save_locations(&locations)
    }

    async fn delete_location(&self, id: i64) -> Result<()> {
        let _guard = self.lock.lock().unwrap();
        let mut locations = self.load_locations()?;
        locations.retain(|l| l.id.raw() != id);
        self.save_locations(&locations)
    }

    async fn add_location_images(&self, id: i64, urls: &[String]) -> Result<()> {
        let _guard = self.lock.lock().unwrap();
        let mut locations = self.load_locations()?;
        let location = locations
            .iter_mut()
            .find(|l| l.id.raw() == id)
            .with_context(|| format!("Location {} not found in local store", id))?;
        for url in urls {
            if !location.images.contains(url) {
                location.images.push(url.clone());
            }
        }
        self.save_locations(&locations)
    }

    async fn remove_location_image(&self, id: i64, url: &str) -> Result<()> {
        let _guard = self.lock.lock().unwrap();
        let mut locations = self.load_locations()?;
        let location = locations
            .iter_mut()
            .find(|l| l.id.raw() == id)
            .with_context(|| format!("Location {} not found in local store", id))?;
        location.images.retain(|existing| existing != url);
        self.save_locations(&locations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> (tempfile::TempDir, LocalBackend) {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(dir.path().to_path_buf()).unwrap();
        (dir, backend)
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let (_dir, backend) = backend();
        backend
            .create_route(&NewRoute {
                route: "R-1".into(),
                shift: "am".into(),
                warehouse: "north".into(),
                description: String::new(),
            })
            .await
            .unwrap();
        backend
            .create_route(&NewRoute {
                route: "R-2".into(),
                shift: "pm".into(),
                warehouse: "south".into(),
                description: String::new(),
            })
            .await
            .unwrap();

        let routes = backend.fetch_routes().await.unwrap();
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].id, RecordId::Persisted(1));
        assert_eq!(routes[1].id, RecordId::Persisted(2));
    }

    #[tokio::test]
    async fn test_delete_route_cascades_to_locations() {
        let (_dir, backend) = backend();
        let draft = Location::draft("Dock 4", RecordId::Persisted(1));
        backend
            .create_location(&NewLocation::from(&draft))
            .await
            .unwrap();
        let other = Location::draft("Dock 9", RecordId::Persisted(2));
        backend
            .create_location(&NewLocation::from(&other))
            .await
            .unwrap();

        backend.delete_route(1).await.unwrap();
        let remaining = backend.fetch_locations().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].route_id, RecordId::Persisted(2));
    }

    #[tokio::test]
    async fn test_add_images_deduplicates() {
        let (_dir, backend) = backend();
        let draft = Location::draft("Dock 4", RecordId::Persisted(1));
        backend
            .create_location(&NewLocation::from(&draft))
            .await
            .unwrap();

        let url = "https://i.ibb.co/abc/dock.jpg".to_string();
        backend.add_location_images(1, &[url.clone()]).await.unwrap();
        backend
            .add_location_images(1, &[url.clone(), "https://i.ibb.co/def/door.jpg".into()])
            .await
            .unwrap();

        let locations = backend.fetch_locations().await.unwrap();
        assert_eq!(locations[0].images.len(), 2);
        assert_eq!(locations[0].images[0], url);
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let backend = LocalBackend::new(dir.path().to_path_buf()).unwrap();
            backend
                .create_route(&NewRoute {
                    route: "R-1".into(),
                    shift: "am".into(),
                    warehouse: "north".into(),
                    description: String::new(),
                })
                .await
                .unwrap();
        }

        let reopened = LocalBackend::new(dir.path().to_path_buf()).unwrap();
        let routes = reopened.fetch_routes().await.unwrap();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].route, "R-1");
    }

    #[tokio::test]
    async fn test_fetch_route_locations_filters() {
        let (_dir, backend) = backend();
        for (name, route_id) in [("Dock 1", 1), ("Dock 2", 1), ("Dock 3", 2)] {
            let draft = Location::draft(name, RecordId::Persisted(route_id));
            backend
                .create_location(&NewLocation::from(&draft))
                .await
                .unwrap();
        }

        let for_one = backend.fetch_route_locations(1).await.unwrap();
        assert_eq!(for_one.len(), 2);
    }
}
