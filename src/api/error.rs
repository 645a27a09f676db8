use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Shape some backend error bodies take: `{"message": "..."}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data.
    /// Cuts on a char boundary so multibyte bodies cannot panic the slice.
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!(
            "{}... (truncated, {} total bytes)",
            &body[..end],
            body.len()
        )
    }

    /// Pull the server-provided message out of a JSON error body, falling
    /// back to the (truncated) raw body.
    fn extract_message(body: &str) -> String {
        if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
            if let Some(msg) = parsed.message.or(parsed.error) {
                return msg;
            }
        }
        Self::truncate_body(body)
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = Self::extract_message(body);
        match status.as_u16() {
            400 => ApiError::BadRequest(message),
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(message),
            404 => ApiError::NotFound(message),
            500..=599 => ApiError::ServerError(message),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, message)),
        }
    }
}
