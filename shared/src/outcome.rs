//! Result of a generation attempt and its HTTP rendering.

use serde_json::Value;
use thiserror::Error;

use crate::models::{ErrorBody, GenerateTryOnResponse};

/// Image shown when the model only answered with text.
pub const TEXT_ONLY_PLACEHOLDER_URL: &str =
    "https://via.placeholder.com/600x800?text=Model+Returned+Text+Only";

/// Why a generation attempt failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationFailure {
    /// Missing or malformed image/prompt. No provider call was made.
    #[error("{0}")]
    Validation(String),

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error("Usage limit reached. Please add credits to continue.")]
    QuotaExceeded,

    /// Any other non-success answer from the provider.
    #[error("AI provider error: {status}")]
    Provider { status: u16, body: String },

    #[error("No image generated")]
    NoContentGenerated,

    #[error("Failed to reach AI provider: {0}")]
    Network(String),
}

impl GenerationFailure {
    /// HTTP status returned to the caller.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::RateLimited => 429,
            Self::QuotaExceeded => 402,
            Self::Provider { .. } | Self::NoContentGenerated | Self::Network(_) => 500,
        }
    }

    /// Rebuild a failure from a relay's HTTP error response.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        match status {
            400 => Self::Validation(message.into()),
            429 => Self::RateLimited,
            402 => Self::QuotaExceeded,
            _ => Self::Provider {
                status,
                body: message.into(),
            },
        }
    }
}

/// The outcome of one generation request. Exactly one variant per response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// A generated image as a data URL or a provider hosted URL.
    Image { url: String },
    /// The model declined or only described the edit.
    TextOnly { message: String },
    Failure(GenerationFailure),
}

impl GenerationOutcome {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Image { .. } | Self::TextOnly { .. } => 200,
            Self::Failure(failure) => failure.status_code(),
        }
    }

    /// JSON body for the HTTP response.
    pub fn to_body(&self) -> Value {
        self.to_body_with_instructions(None)
    }

    /// JSON body that also echoes the instruction text on success.
    pub fn to_body_with_instructions(&self, instructions: Option<&str>) -> Value {
        let instructions = instructions.map(str::to_string);
        let body = match self {
            Self::Image { url } => serde_json::to_value(GenerateTryOnResponse {
                generated_image_url: url.clone(),
                message: None,
                instructions,
            }),
            Self::TextOnly { message } => serde_json::to_value(GenerateTryOnResponse {
                generated_image_url: TEXT_ONLY_PLACEHOLDER_URL.to_string(),
                message: Some(message.clone()),
                instructions,
            }),
            Self::Failure(failure) => serde_json::to_value(ErrorBody::new(failure.to_string())),
        };

        body.unwrap_or_else(|_| serde_json::json!({ "error": "Internal error" }))
    }
}

impl From<GenerationFailure> for GenerationOutcome {
    fn from(failure: GenerationFailure) -> Self {
        Self::Failure(failure)
    }
}
