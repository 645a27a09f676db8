//! Upload orchestration: push images to the host, then attach the hosted
//! URLs to a location record.
//!
//! Progress is reported over an optional watch channel as a percentage:
//! 50 once the upload half is done, 100 once the URLs are persisted. The
//! orchestrator does not retry, and uploaded-but-unpersisted URLs are not
//! tracked for later recovery.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::service::DataService;

use super::{ImageFile, ImageHostClient};

/// Counts for a multi-image attach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachReport {
    pub uploaded: usize,
    pub failed: usize,
}

/// A progress channel pair, preset to 0 percent.
pub fn progress_channel() -> (watch::Sender<u8>, watch::Receiver<u8>) {
    watch::channel(0)
}

fn report(progress: Option<&watch::Sender<u8>>, percent: u8) {
    if let Some(tx) = progress {
        // Receivers may have gone away; progress is best-effort.
        let _ = tx.send(percent);
    }
}

pub struct Uploader {
    host: ImageHostClient,
    data: Arc<DataService>,
}

impl Uploader {
    pub fn new(host: ImageHostClient, data: Arc<DataService>) -> Self {
        Self { host, data }
    }

    /// Upload one image and attach its URL to the location. Fails with the
    /// originating message if either step fails; returns the hosted URL.
    pub async fn attach_image(
        &self,
        location_id: i64,
        file: &ImageFile,
        progress: Option<&watch::Sender<u8>>,
    ) -> Result<String> {
        let outcome = self.host.upload(file).await;
        let url = match outcome.url {
            Some(url) => url,
            None => {
                let message = outcome
                    .error
                    .unwrap_or_else(|| "Upload failed".to_string());
                bail!(message);
            }
        };

        self.persist_attached(location_id, std::slice::from_ref(&url), progress)
            .await?;

        debug!(location_id, url = %url, "Image attached to location");
        Ok(url)
    }

    /// Upload several images in parallel and attach the successful ones as
    /// one batch. Fails only when no upload succeeds or when persistence
    /// fails; individual upload failures are counted in the report.
    pub async fn attach_images(
        &self,
        location_id: i64,
        files: &[ImageFile],
        progress: Option<&watch::Sender<u8>>,
    ) -> Result<AttachReport> {
        let outcomes = self.host.upload_many(files).await;
        let urls: Vec<String> = outcomes.iter().filter_map(|o| o.url.clone()).collect();
        let failed = outcomes.len() - urls.len();

        if urls.is_empty() {
            let message = outcomes
                .into_iter()
                .find_map(|o| o.error)
                .unwrap_or_else(|| "All uploads failed".to_string());
            bail!(message);
        }
        if failed > 0 {
            warn!(location_id, failed, "Some image uploads failed");
        }

        self.persist_attached(location_id, &urls, progress).await?;

        Ok(AttachReport {
            uploaded: urls.len(),
            failed,
        })
    }

    /// Second half of both flows: the upload is done (50%), then the URLs
    /// are persisted to the location record (100%).
    async fn persist_attached(
        &self,
        location_id: i64,
        urls: &[String],
        progress: Option<&watch::Sender<u8>>,
    ) -> Result<()> {
        report(progress, 50);
        self.data
            .add_images_to_location(location_id, urls)
            .await
            .context("Failed to attach uploaded images to location")?;
        report(progress, 100);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_successful_attach_reports_progress_halves() {
        // The persist half must run at 50 percent and finish at 100: the
        // backend records what the channel showed while it was called.
        let (tx, rx) = progress_channel();
        let backend = Arc::new(StubBackend::with_progress(rx.clone()));
        let data = Arc::new(DataService::with_backend(backend.clone()));
        let uploader = Uploader::new(ImageHostClient::new("test-key").unwrap(), data);

        uploader
            .persist_attached(7, &["https://i.ibb.co/abc/dock.jpg".to_string()], Some(&tx))
            .await
            .unwrap();

        assert_eq!(*backend.seen_at_persist.lock().unwrap(), Some(50));
        assert_eq!(*rx.borrow(), 100);
    }

    #[tokio::test]
    async fn test_attach_image_fails_fast_on_invalid_file() {
        // An oversize file never reaches the network, so the orchestrator
        // must fail with the validation message and report no progress.
        let host = ImageHostClient::new("test-key").unwrap();
        let data = Arc::new(DataService::with_backend(Arc::new(StubBackend::new())));
        let uploader = Uploader::new(host, data);

        let file = ImageFile {
            name: "huge.jpg".to_string(),
            mime: "image/jpeg".to_string(),
            bytes: vec![0u8; 40 * 1024 * 1024],
        };

        let (tx, rx) = progress_channel();
        let err = uploader
            .attach_image(7, &file, Some(&tx))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("32MB"));
        assert_eq!(*rx.borrow(), 0);
    }

    #[tokio::test]
    async fn test_attach_images_fails_when_no_upload_succeeds() {
        let host = ImageHostClient::new("test-key").unwrap();
        let data = Arc::new(DataService::with_backend(Arc::new(StubBackend::new())));
        let uploader = Uploader::new(host, data);

        let files = vec![
            ImageFile {
                name: "a.txt".to_string(),
                mime: "text/plain".to_string(),
                bytes: vec![0u8; 10],
            },
            ImageFile {
                name: "b.jpg".to_string(),
                mime: "image/jpeg".to_string(),
                bytes: Vec::new(),
            },
        ];

        let err = uploader.attach_images(7, &files, None).await.unwrap_err();
        assert!(err.to_string().contains("File must be an image"));
    }

    // Inert backend; optionally records the progress value visible while
    // images are being persisted.
    struct StubBackend {
        progress: Option<watch::Receiver<u8>>,
        seen_at_persist: std::sync::Mutex<Option<u8>>,
    }

    impl StubBackend {
        fn new() -> Self {
            Self {
                progress: None,
                seen_at_persist: std::sync::Mutex::new(None),
            }
        }

        fn with_progress(progress: watch::Receiver<u8>) -> Self {
            Self {
                progress: Some(progress),
                seen_at_persist: std::sync::Mutex::new(None),
            }
        }
    }

    #[async_trait::async_trait]
    impl crate::store::Backend for StubBackend {
        async fn fetch_routes(&self) -> Result<Vec<crate::models::Route>> {
            Ok(Vec::new())
        }
        async fn create_route(&self, _: &crate::models::NewRoute) -> Result<()> {
            Ok(())
        }
        async fn update_routes(&self, _: &[crate::models::Route]) -> Result<()> {
            Ok(())
        }
        async fn update_route(&self, _: &crate::models::Route) -> Result<()> {
            Ok(())
        }
        async fn delete_route(&self, _: i64) -> Result<()> {
            Ok(())
        }
        async fn fetch_locations(&self) -> Result<Vec<crate::models::Location>> {
            Ok(Vec::new())
        }
        async fn fetch_route_locations(&self, _: i64) -> Result<Vec<crate::models::Location>> {
            Ok(Vec::new())
        }
        async fn create_location(&self, _: &crate::models::NewLocation) -> Result<()> {
            Ok(())
        }
        async fn update_locations(&self, _: &[crate::models::Location]) -> Result<()> {
            Ok(())
        }
        async fn update_location(&self, _: &crate::models::Location) -> Result<()> {
            Ok(())
        }
        async fn delete_location(&self, _: i64) -> Result<()> {
            Ok(())
        }
        async fn add_location_images(&self, _: i64, _: &[String]) -> Result<()> {
            if let Some(ref progress) = self.progress {
                *self.seen_at_persist.lock().unwrap() = Some(*progress.borrow());
            }
            Ok(())
        }
        async fn remove_location_image(&self, _: i64, _: &str) -> Result<()> {
            Ok(())
        }
    }
}
