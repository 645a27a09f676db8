//! Data models for waybill entities.
//!
//! This module contains the data structures shared across the crate:
//!
//! - `Route`, `Location`: the two record types managed by the UI
//! - `NewRoute`, `NewLocation`: create payloads without client-only fields
//! - `RecordId`: explicit pending/persisted record identity

pub mod id;
pub mod location;
pub mod route;

use thiserror::Error;

pub use id::{RecordId, PENDING_THRESHOLD};
pub use location::{Location, NewLocation};
pub use route::{NewRoute, Route};

/// Problems detected before any request leaves the client.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Route is missing required field '{0}'")]
    MissingRouteField(&'static str),

    #[error("Location is missing required field '{0}'")]
    MissingLocationField(&'static str),

    #[error("Location references a route that has not been saved yet")]
    UnsavedRoute,
}
