//! REST API client module for the waybill backend.
//!
//! This module provides the `ApiClient` for the route and location CRUD
//! endpoints, and the `ApiError` taxonomy for transport and HTTP failures.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
