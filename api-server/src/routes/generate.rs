use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State as Extract,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use shared::{validate_token, AuthenticatedUser, GenerateTryOnRequest};
use tracing::{info, warn};

use super::{bearer_credential, parse_json};
use crate::{error::AppError, state::State};

/// Verify an optional session credential. Only a present-but-invalid token,
/// or a missing one when auth is required, is rejected.
fn authorize(state: &State, credential: Option<&str>) -> Result<Option<AuthenticatedUser>, AppError> {
    match credential {
        Some(token) => validate_token(token, &state.config.jwt_secret)
            .map(Some)
            .map_err(|e| {
                warn!("Rejected credential: {}", e);
                AppError::Unauthorized("Invalid or expired token")
            }),
        None if state.config.require_auth => Err(AppError::Unauthorized("Authentication required")),
        None => Ok(None),
    }
}

pub async fn generate_handler(
    Extract(state): Extract<Arc<State>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let user = authorize(&state, bearer_credential(&headers))?;
    let payload: GenerateTryOnRequest = parse_json(&body)?;

    info!(
        user = user.as_ref().map(|u| u.user_id.to_string()).unwrap_or_default(),
        "Generating try-on for category: {}",
        payload.category.as_deref().unwrap_or("other")
    );

    let reply = state.relay.relay(&payload).await;
    let status = StatusCode::from_u16(reply.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    Ok((status, Json(reply.to_body())).into_response())
}

pub async fn health_handler(Extract(state): Extract<Arc<State>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "provider": state.relay.provider_name(),
    }))
}
