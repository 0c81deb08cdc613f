//! The generation relay shared by the server and the serverless function.

use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::data_url::DataUrl;
use crate::models::GenerateTryOnRequest;
use crate::outcome::{GenerationFailure, GenerationOutcome};
use crate::providers::{ContentPart, GenerationProvider, ProviderError, ProviderRequest, ProviderResponse};
use crate::request::GenerationRequest;
use crate::Error;

/// Mime type assumed when the provider returns image bytes without one.
const FALLBACK_IMAGE_MIME: &str = "image/png";

/// A relay answer together with the instruction text sent upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayReply {
    pub outcome: GenerationOutcome,
    /// `None` when the payload was rejected before composing.
    pub instructions: Option<String>,
}

impl RelayReply {
    pub fn status_code(&self) -> u16 {
        self.outcome.status_code()
    }

    pub fn to_body(&self) -> Value {
        self.outcome.to_body_with_instructions(self.instructions.as_deref())
    }
}

/// Forwards try-on requests to one upstream provider and normalizes the answer.
#[derive(Clone)]
pub struct Relay {
    provider: Arc<dyn GenerationProvider>,
}

impl Relay {
    pub fn new(provider: Arc<dyn GenerationProvider>) -> Self {
        Self { provider }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Validate a wire payload and generate. Invalid payloads never reach the provider.
    pub async fn relay(&self, payload: &GenerateTryOnRequest) -> RelayReply {
        match GenerationRequest::from_wire(payload) {
            Ok(request) => RelayReply {
                instructions: Some(request.instructions()),
                outcome: self.generate(&request).await,
            },
            Err(e) => {
                warn!("Rejected try-on request: {}", e);
                let message = match e {
                    Error::Validation(message) => message,
                    other => other.to_string(),
                };
                RelayReply {
                    outcome: GenerationFailure::Validation(message).into(),
                    instructions: None,
                }
            }
        }
    }

    /// Submit one request upstream and classify the result.
    pub async fn generate(&self, request: &GenerationRequest) -> GenerationOutcome {
        info!(
            category = %request.category(),
            provider = self.provider.name(),
            "Generating try-on image"
        );

        let provider_request = ProviderRequest {
            instructions: request.instructions(),
            image: request.image().clone(),
        };

        let outcome = match self.provider.submit_generation(&provider_request).await {
            Ok(response) => select_content(response),
            Err(e) => classify_error(e).into(),
        };

        match &outcome {
            GenerationOutcome::Image { .. } => info!("Image generation successful"),
            GenerationOutcome::TextOnly { message } => {
                warn!("Model returned text instead of image: {}", message)
            }
            GenerationOutcome::Failure(failure) => error!("Generation failed: {}", failure),
        }

        outcome
    }
}

/// Pick the outcome from a successful response: any image first, then text.
fn select_content(response: ProviderResponse) -> GenerationOutcome {
    let image = response.parts.iter().find_map(|part| match part {
        ContentPart::InlineImage { mime_type, data } => Some(
            DataUrl::new(mime_type.as_deref().unwrap_or(FALLBACK_IMAGE_MIME), data.as_str()).to_string(),
        ),
        ContentPart::RemoteImage { url } => Some(url.clone()),
        ContentPart::Text(_) => None,
    });

    if let Some(url) = image {
        return GenerationOutcome::Image { url };
    }

    let text = response.parts.into_iter().find_map(|part| match part {
        ContentPart::Text(text) if !text.trim().is_empty() => Some(text),
        _ => None,
    });

    match text {
        Some(message) => GenerationOutcome::TextOnly { message },
        None => GenerationFailure::NoContentGenerated.into(),
    }
}

fn classify_error(error: ProviderError) -> GenerationFailure {
    match error {
        ProviderError::Status { status: 429, .. } => GenerationFailure::RateLimited,
        ProviderError::Status { status: 402, .. } => GenerationFailure::QuotaExceeded,
        ProviderError::Status { status, body } => {
            error!(status, body = %body, "AI provider error");
            GenerationFailure::Provider { status, body }
        }
        ProviderError::Network(e) => GenerationFailure::Network(e.to_string()),
        ProviderError::UnexpectedResponse(message) => GenerationFailure::Provider {
            status: 500,
            body: message,
        },
    }
}
