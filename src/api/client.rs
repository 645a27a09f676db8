//! API client for the waybill REST backend.
//!
//! This module provides the `ApiClient` struct for the route and location
//! CRUD endpoints. All bodies are JSON; reads tolerate both bare-array and
//! wrapped (`{"data": [...]}`) response shapes.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::models::{Location, NewLocation, NewRoute, Route};

use super::ApiError;

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// API client for the waybill backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

/// Shape some mutation responses take on 2xx: `{"success": false, ...}`.
#[derive(Debug, Deserialize)]
struct MutationBody {
    success: Option<bool>,
    message: Option<String>,
}

impl ApiClient {
    /// Create a new API client for the given base URL.
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    /// Some endpoints report failure inside a 2xx body.
    fn check_mutation_body(body: &str) -> Result<()> {
        if let Ok(parsed) = serde_json::from_str::<MutationBody>(body) {
            if parsed.success == Some(false) {
                let message = parsed
                    .message
                    .unwrap_or_else(|| "Request failed".to_string());
                return Err(ApiError::RequestFailed(message).into());
            }
        }
        Ok(())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to send GET request to {}", url))?;

        let response = Self::check_response(response).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    async fn send_mutation<B: Serialize>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<()> {
        let url = self.url(path);
        let mut request = self.client.request(method.clone(), &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to send {} request to {}", method, url))?;

        let response = Self::check_response(response).await?;
        let text = response.text().await.unwrap_or_default();
        Self::check_mutation_body(&text)
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<()> {
        self.send_mutation(reqwest::Method::POST, path, Some(body))
            .await
    }

    async fn put<B: Serialize>(&self, path: &str, body: &B) -> Result<()> {
        self.send_mutation(reqwest::Method::PUT, path, Some(body))
            .await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.send_mutation::<()>(reqwest::Method::DELETE, path, None)
            .await
    }

    /// Parse a list response that may be a bare array or wrapped in
    /// `{"data": [...]}`.
    fn parse_list<T: DeserializeOwned>(text: &str, what: &str) -> Result<Vec<T>> {
        if let Ok(items) = serde_json::from_str::<Vec<T>>(text) {
            return Ok(items);
        }

        #[derive(Deserialize)]
        struct Wrapper<T> {
            #[serde(default = "Vec::new")]
            data: Vec<T>,
        }

        if let Ok(wrapper) = serde_json::from_str::<Wrapper<T>>(text) {
            return Ok(wrapper.data);
        }

        Err(anyhow::anyhow!(
            "Failed to parse {} response. Response starts with: {}",
            what,
            Self::preview(text)
        ))
    }

    /// First ~200 bytes of a body for error messages, cut on a char
    /// boundary so multibyte responses cannot panic the slice.
    fn preview(text: &str) -> &str {
        let mut end = text.len().min(200);
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        &text[..end]
    }

    async fn get_list<T: DeserializeOwned>(&self, path: &str, what: &str) -> Result<Vec<T>> {
        let url = self.url(path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to send GET request to {}", url))?;

        let response = Self::check_response(response).await?;
        let text = response.text().await?;
        debug!(what, bytes = text.len(), "List response received");
        Self::parse_list(&text, what)
    }

    // ===== Routes =====

    pub async fn fetch_routes(&self) -> Result<Vec<Route>> {
        self.get_list("/routes", "routes").await
    }

    pub async fn create_route(&self, route: &NewRoute) -> Result<()> {
        self.post("/routes", route).await
    }

    /// Batched update of already-persisted routes.
    pub async fn update_routes(&self, routes: &[Route]) -> Result<()> {
        self.put("/routes", &routes).await
    }

    pub async fn update_route(&self, route: &Route) -> Result<()> {
        self.put(&format!("/routes/{}", route.id.raw()), route).await
    }

    pub async fn delete_route(&self, id: i64) -> Result<()> {
        self.delete(&format!("/routes/{}", id)).await
    }

    // ===== Locations =====

    pub async fn fetch_locations(&self) -> Result<Vec<Location>> {
        self.get_list("/locations", "locations").await
    }

    pub async fn fetch_route_locations(&self, route_id: i64) -> Result<Vec<Location>> {
        self.get_list(&format!("/locations?routeId={}", route_id), "locations")
            .await
    }

    pub async fn create_location(&self, location: &NewLocation) -> Result<()> {
        self.post("/locations", location).await
    }

    /// Batched update of already-persisted locations.
    pub async fn update_locations(&self, locations: &[Location]) -> Result<()> {
        self.put("/locations", &locations).await
    }

    pub async fn update_location(&self, location: &Location) -> Result<()> {
        self.put(&format!("/locations/{}", location.id.raw()), location)
            .await
    }

    pub async fn delete_location(&self, id: i64) -> Result<()> {
        self.delete(&format!("/locations/{}", id)).await
    }

    // ===== Location images =====

    pub async fn add_location_images(&self, id: i64, urls: &[String]) -> Result<()> {
        let body = serde_json::json!({ "images": urls });
        self.post(&format!("/locations/{}/images", id), &body).await
    }

    pub async fn remove_location_image(&self, id: i64, url: &str) -> Result<()> {
        let body = serde_json::json!({ "url": url });
        self.send_mutation(
            reqwest::Method::DELETE,
            &format!("/locations/{}/images", id),
            Some(&body),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_bare_array() {
        let json = r#"[{"id": 1, "route": "R-1", "shift": "am", "warehouse": "north"}]"#;
        let routes: Vec<Route> = ApiClient::parse_list(json, "routes").unwrap();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].route, "R-1");
    }

    #[test]
    fn test_parse_list_wrapped() {
        let json = r#"{"data": [{"id": 2, "route": "R-2", "shift": "pm", "warehouse": "south"}]}"#;
        let routes: Vec<Route> = ApiClient::parse_list(json, "routes").unwrap();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].id.raw(), 2);
    }

    #[test]
    fn test_parse_list_garbage_fails() {
        let result: Result<Vec<Route>> = ApiClient::parse_list("not json", "routes");
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_list_multibyte_garbage_errors_without_panic() {
        // A multibyte char straddling the preview cutoff must yield Err,
        // not a slice panic that would unwind through the read path.
        let body = format!("{}é{}", "x".repeat(199), "y".repeat(50));
        let result: Result<Vec<Route>> = ApiClient::parse_list(&body, "routes");
        assert!(result.is_err());
    }

    #[test]
    fn test_check_mutation_body_embedded_failure() {
        let err = ApiClient::check_mutation_body(r#"{"success": false, "message": "duplicate"}"#)
            .unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_check_mutation_body_accepts_non_json() {
        assert!(ApiClient::check_mutation_body("").is_ok());
        assert!(ApiClient::check_mutation_body("ok").is_ok());
        assert!(ApiClient::check_mutation_body(r#"{"success": true}"#).is_ok());
    }

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let client = ApiClient::new("http://localhost:3000/api/").unwrap();
        assert_eq!(client.url("/routes"), "http://localhost:3000/api/routes");
    }
}
