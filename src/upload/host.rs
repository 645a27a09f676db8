//! Client for the imgbb image-hosting API.
//!
//! Uploads never surface as `Err`: every call produces an `UploadOutcome`
//! that carries either the hosted URLs or an error message. Validation
//! (presence, MIME type, size) happens before any network I/O.

use futures::future::join_all;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

const IMGBB_UPLOAD_URL: &str = "https://api.imgbb.com/1/upload";

/// imgbb rejects uploads above 32MB.
const MAX_IMAGE_BYTES: usize = 32 * 1024 * 1024;

/// HTTP request timeout in seconds. Uploads get longer than the CRUD
/// client because image payloads are large.
const UPLOAD_TIMEOUT_SECS: u64 = 120;

/// An image file as handed over by the UI.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Result of one upload attempt. Exactly one of `url` and `error` is set.
#[derive(Debug, Clone, Default)]
pub struct UploadOutcome {
    pub url: Option<String>,
    pub display_url: Option<String>,
    pub delete_url: Option<String>,
    pub title: Option<String>,
    pub error: Option<String>,
}

impl UploadOutcome {
    pub fn succeeded(&self) -> bool {
        self.url.is_some()
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Deserialize)]
struct ImgbbResponse {
    #[serde(default)]
    success: bool,
    data: Option<ImgbbData>,
    error: Option<ImgbbError>,
}

#[derive(Debug, Deserialize)]
struct ImgbbData {
    image: Option<ImgbbImage>,
    display_url: Option<String>,
    delete_url: Option<String>,
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImgbbImage {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImgbbError {
    message: Option<String>,
}

/// Client for the imgbb upload endpoint.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ImageHostClient {
    client: Client,
    api_key: String,
}

impl ImageHostClient {
    pub fn new(api_key: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(UPLOAD_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.to_string(),
        })
    }

    /// Reject files the host would refuse, before spending any bandwidth.
    fn validate(file: &ImageFile) -> Option<UploadOutcome> {
        if file.bytes.is_empty() {
            return Some(UploadOutcome::failure("No file provided"));
        }
        if !file.mime.starts_with("image/") {
            return Some(UploadOutcome::failure("File must be an image"));
        }
        if file.bytes.len() > MAX_IMAGE_BYTES {
            return Some(UploadOutcome::failure("File size exceeds 32MB limit"));
        }
        None
    }

    /// Upload one image. Transport failures, non-2xx statuses, and
    /// API-reported failures all come back inside the outcome.
    pub async fn upload(&self, file: &ImageFile) -> UploadOutcome {
        if let Some(rejected) = Self::validate(file) {
            return rejected;
        }

        let part = match Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.mime)
        {
            Ok(part) => part,
            Err(e) => return UploadOutcome::failure(format!("Invalid MIME type: {}", e)),
        };
        let form = Form::new()
            .part("image", part)
            .text("name", file.name.clone());

        let url = format!("{}?key={}", IMGBB_UPLOAD_URL, self.api_key);
        let response = match self.client.post(&url).multipart(form).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(name = %file.name, error = %e, "Image upload failed to send");
                return UploadOutcome::failure(format!("Upload failed: {}", e));
            }
        };

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            warn!(name = %file.name, status = %status, "Image host returned an error");
            return UploadOutcome::failure(format!("Image host returned {}", status));
        }

        Self::parse_response(&text)
    }

    fn parse_response(text: &str) -> UploadOutcome {
        let parsed: ImgbbResponse = match serde_json::from_str(text) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "Failed to parse image host response");
                return UploadOutcome::failure("Invalid response from image host");
            }
        };

        if !parsed.success {
            let message = parsed
                .error
                .and_then(|e| e.message)
                .unwrap_or_else(|| "Upload failed".to_string());
            return UploadOutcome::failure(message);
        }

        let data = match parsed.data {
            Some(data) => data,
            None => return UploadOutcome::failure("Image host returned no data"),
        };
        let url = match data.image.and_then(|image| image.url) {
            Some(url) => url,
            None => return UploadOutcome::failure("Image host returned no URL"),
        };

        debug!(url = %url, "Image uploaded");
        UploadOutcome {
            url: Some(url),
            display_url: data.display_url,
            delete_url: data.delete_url,
            title: data.title,
            error: None,
        }
    }

    /// Upload several images in parallel. One outcome per input, in input
    /// order; failures stay per-element.
    pub async fn upload_many(&self, files: &[ImageFile]) -> Vec<UploadOutcome> {
        join_all(files.iter().map(|file| self.upload(file))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jpeg(len: usize) -> ImageFile {
        ImageFile {
            name: "dock.jpg".to_string(),
            mime: "image/jpeg".to_string(),
            bytes: vec![0u8; len],
        }
    }

    #[tokio::test]
    async fn test_oversize_file_rejected_without_network() {
        let client = ImageHostClient::new("test-key").unwrap();
        let outcome = client.upload(&jpeg(40 * 1024 * 1024)).await;

        assert!(!outcome.succeeded());
        assert_eq!(outcome.url, None);
        assert_eq!(outcome.error.as_deref(), Some("File size exceeds 32MB limit"));
    }

    #[tokio::test]
    async fn test_empty_file_rejected() {
        let client = ImageHostClient::new("test-key").unwrap();
        let outcome = client.upload(&jpeg(0)).await;
        assert_eq!(outcome.error.as_deref(), Some("No file provided"));
    }

    #[tokio::test]
    async fn test_non_image_mime_rejected() {
        let client = ImageHostClient::new("test-key").unwrap();
        let file = ImageFile {
            name: "notes.pdf".to_string(),
            mime: "application/pdf".to_string(),
            bytes: vec![0u8; 100],
        };
        let outcome = client.upload(&file).await;
        assert_eq!(outcome.error.as_deref(), Some("File must be an image"));
    }

    #[test]
    fn test_parse_success_response() {
        let json = r#"{
            "success": true,
            "data": {
                "title": "dock",
                "image": {"url": "https://i.ibb.co/abc/dock.jpg"},
                "display_url": "https://ibb.co/abc",
                "delete_url": "https://ibb.co/abc/delete"
            }
        }"#;
        let outcome = ImageHostClient::parse_response(json);
        assert!(outcome.succeeded());
        assert_eq!(outcome.url.as_deref(), Some("https://i.ibb.co/abc/dock.jpg"));
        assert_eq!(outcome.display_url.as_deref(), Some("https://ibb.co/abc"));
        assert_eq!(outcome.delete_url.as_deref(), Some("https://ibb.co/abc/delete"));
    }

    #[test]
    fn test_parse_api_reported_failure() {
        let json = r#"{"success": false, "error": {"message": "Invalid API key"}}"#;
        let outcome = ImageHostClient::parse_response(json);
        assert!(!outcome.succeeded());
        assert_eq!(outcome.error.as_deref(), Some("Invalid API key"));
    }

    #[test]
    fn test_parse_garbage_response() {
        let outcome = ImageHostClient::parse_response("<html>502</html>");
        assert!(!outcome.succeeded());
    }
}
