//! waybill - client-side data access for the route/location manager.
//!
//! The crate fetches and caches route and location records from the waybill
//! REST backend, falls back to stale cache and then to a built-in dataset
//! when the network is unavailable, can run entirely against local JSON
//! files, and uploads images to imgbb before attaching the hosted URLs to
//! location records.
//!
//! Entry points:
//!
//! - [`DataService`]: cached, deduplicated reads and validated writes
//! - [`upload::Uploader`]: upload-then-attach orchestration
//! - [`Config`]: backend selection and credentials

pub mod api;
pub mod cache;
pub mod config;
pub mod fallback;
pub mod models;
pub mod service;
pub mod store;
pub mod upload;

pub use config::Config;
pub use models::{Location, RecordId, Route};
pub use service::DataService;
