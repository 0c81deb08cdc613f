//! Upstream generation API adapters.
//!
//! Every adapter turns a [`ProviderRequest`] into one HTTP call against its
//! API and reports the returned content parts in a common shape. Status
//! classification and outcome selection live in [`crate::relay`], so the
//! adapters never decide what counts as an image or a failure.

mod gateway;
mod vertex;

pub use gateway::GatewayProvider;
pub use vertex::VertexProvider;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{ProviderConfig, ProviderKind};
use crate::data_url::DataUrl;
use crate::secrets::resolve_credential;
use crate::{Error, Result};

/// What an adapter sends upstream.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    /// Category specific instruction text with the prompt filled in.
    pub instructions: String,
    pub image: DataUrl,
}

/// One piece of returned content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    /// Base64 image bytes; the mime type is whatever the provider declared.
    InlineImage {
        mime_type: Option<String>,
        data: String,
    },
    /// An image hosted by the provider.
    RemoteImage { url: String },
    Text(String),
}

/// Content parts of a successful upstream response, in provider order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderResponse {
    pub parts: Vec<ContentPart>,
}

/// Transport level and HTTP level failures of an upstream call.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Non-success HTTP status with the raw body.
    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A success status whose body could not be understood.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Capability every upstream adapter provides.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Submit one multimodal request. No retries.
    async fn submit_generation(&self, request: &ProviderRequest) -> std::result::Result<ProviderResponse, ProviderError>;

    fn kind(&self) -> ProviderKind;

    /// Display name used in logs and health output.
    fn name(&self) -> &str {
        match self.kind() {
            ProviderKind::Gateway => "AI gateway (chat completions)",
            ProviderKind::Vertex => "Vertex AI (generateContent)",
        }
    }
}

/// Build the adapter selected by configuration, resolving its credential.
pub async fn build_provider(config: &ProviderConfig) -> Result<Arc<dyn GenerationProvider>> {
    let client = reqwest::Client::new();

    match config.kind {
        ProviderKind::Gateway => {
            let api_key = resolve_credential(
                "AI_GATEWAY_API_KEY",
                config.gateway.api_key.as_deref(),
                config.gateway.api_key_secret_arn.as_deref(),
            )
            .await?;

            Ok(Arc::new(GatewayProvider::new(
                client,
                config.gateway.url.clone(),
                config.gateway.model.clone(),
                api_key,
            )))
        }
        ProviderKind::Vertex => {
            let project_id = config
                .vertex
                .project_id
                .clone()
                .ok_or_else(|| Error::Config("GOOGLE_PROJECT_ID is not configured".to_string()))?;

            let access_token = resolve_credential(
                "VERTEX_ACCESS_TOKEN",
                config.vertex.access_token.as_deref(),
                config.vertex.access_token_secret_arn.as_deref(),
            )
            .await?;

            Ok(Arc::new(VertexProvider::new(
                client,
                VertexProvider::endpoint(&project_id, &config.vertex.location, &config.vertex.model),
                access_token,
            )))
        }
    }
}

/// Read a response body, turning non-success statuses into [`ProviderError::Status`].
pub(crate) async fn read_body(response: reqwest::Response) -> std::result::Result<String, ProviderError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(ProviderError::Status {
            status: status.as_u16(),
            body,
        });
    }

    Ok(body)
}
