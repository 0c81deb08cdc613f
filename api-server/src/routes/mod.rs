mod auth;
mod generate;
mod todos;
mod upload;

pub use auth::{login_handler, signup_handler};
pub use generate::{generate_handler, health_handler};
pub use todos::{create_todo_handler, list_todos_handler};
pub use upload::{sanitize_filename, upload_handler};

use axum::{body::Bytes, http::HeaderMap};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::AppError;

/// Bearer credential from the `Authorization` header, if any.
pub(crate) fn bearer_credential(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.strip_prefix("Bearer ").unwrap_or(v).trim())
        .filter(|v| !v.is_empty())
}

/// Parse a JSON body so that malformed input yields our `{error}` body.
pub(crate) fn parse_json<T: DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|e| AppError::MalformedPayload(e.to_string()))
}

/// Parse and validate a JSON body.
pub(crate) fn parse_valid<T: DeserializeOwned + Validate>(body: &Bytes) -> Result<T, AppError> {
    let parsed: T = parse_json(body)?;
    parsed
        .validate()
        .map_err(|e| AppError::Shared(shared::Error::Validation(e.to_string())))?;
    Ok(parsed)
}
