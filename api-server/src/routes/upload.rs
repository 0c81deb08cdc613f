use std::sync::Arc;

use axum::{
    extract::{Multipart, State as Extract},
    http::{header::HOST, HeaderMap},
    Json,
};
use chrono::Utc;
use shared::models::UploadResponse;
use tracing::info;

use crate::{error::AppError, state::State};

/// Field name the upload form uses for the file.
const FILE_FIELD: &str = "file";

/// Reduce a client supplied file name to a safe single path component.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

pub async fn upload_handler(
    Extract(state): Extract<Arc<State>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::MalformedPayload(e.to_string()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let original = field.file_name().unwrap_or("upload").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::MalformedPayload(e.to_string()))?;

        let filename = format!("{}-{}", Utc::now().timestamp_millis(), sanitize_filename(&original));
        tokio::fs::write(state.config.upload_dir.join(&filename), &data).await?;

        info!("Stored upload {} ({} bytes)", filename, data.len());

        return Ok(Json(UploadResponse {
            url: format!("{}/uploads/{}", base_url(&headers), filename),
            filename,
        }));
    }

    Err(AppError::MissingFile)
}

/// Externally visible origin of this server, from the request headers.
fn base_url(headers: &HeaderMap) -> String {
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    let host = headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");

    format!("{scheme}://{host}")
}
