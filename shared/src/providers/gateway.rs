//! OpenAI-style chat-completions gateway adapter.
//!
//! The image goes upstream as a full data URL inside an `image_url` content
//! part. Generated images come back under `choices[0].message.images`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{read_body, ContentPart, GenerationProvider, ProviderError, ProviderRequest, ProviderResponse};
use crate::config::ProviderKind;
use crate::data_url::DataUrl;

pub struct GatewayProvider {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: String,
}

impl GatewayProvider {
    pub fn new(client: reqwest::Client, url: String, model: String, api_key: String) -> Self {
        Self {
            client,
            url,
            model,
            api_key,
        }
    }

    fn build_body(&self, request: &ProviderRequest) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: vec![
                    ChatRequestPart::Text {
                        text: request.instructions.clone(),
                    },
                    ChatRequestPart::ImageUrl {
                        image_url: ImageUrl {
                            url: request.image.to_string(),
                        },
                    },
                ],
            }],
            modalities: vec!["image".to_string(), "text".to_string()],
        }
    }
}

#[async_trait]
impl GenerationProvider for GatewayProvider {
    async fn submit_generation(&self, request: &ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let body = self.build_body(request);

        debug!(model = %self.model, "Submitting chat completion to AI gateway");

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let text = read_body(response).await?;
        let chat: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| ProviderError::UnexpectedResponse(format!("invalid gateway JSON: {}", e)))?;

        Ok(chat.into_provider_response())
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Gateway
    }
}

// Request types
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    modalities: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: Vec<ChatRequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ChatRequestPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize, Deserialize)]
struct ImageUrl {
    url: String,
}

// Response types
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<MessageContent>,
    #[serde(default)]
    images: Vec<ResponseImage>,
}

/// Gateways answer with either a plain string or a list of typed parts.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ResponseContentPart>),
}

#[derive(Debug, Deserialize)]
struct ResponseContentPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseImage {
    image_url: ImageUrl,
}

impl ChatResponse {
    fn into_provider_response(self) -> ProviderResponse {
        let mut parts = Vec::new();

        let Some(message) = self.choices.into_iter().next().and_then(|c| c.message) else {
            return ProviderResponse { parts };
        };

        for image in message.images {
            let url = image.image_url.url;
            let part = match DataUrl::normalize(&url) {
                Ok(data_url) if url.trim_start().starts_with("data:") => ContentPart::InlineImage {
                    mime_type: Some(data_url.mime_type().to_string()),
                    data: data_url.base64().to_string(),
                },
                _ => ContentPart::RemoteImage { url },
            };
            parts.push(part);
        }

        match message.content {
            Some(MessageContent::Text(text)) => parts.push(ContentPart::Text(text)),
            Some(MessageContent::Parts(items)) => {
                parts.extend(items.into_iter().filter_map(|p| p.text).map(ContentPart::Text));
            }
            None => {}
        }

        ProviderResponse { parts }
    }
}
