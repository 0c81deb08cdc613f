//! Vertex AI `generateContent` adapter.
//!
//! Vertex wants the image as raw base64 `inlineData` with a separate mime
//! type, so the data URL prefix is stripped before sending.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{read_body, ContentPart, GenerationProvider, ProviderError, ProviderRequest, ProviderResponse};
use crate::config::ProviderKind;

pub struct VertexProvider {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
}

impl VertexProvider {
    pub fn new(client: reqwest::Client, endpoint: String, access_token: String) -> Self {
        Self {
            client,
            endpoint,
            access_token,
        }
    }

    /// Regional `generateContent` URL for a publisher model.
    pub fn endpoint(project_id: &str, location: &str, model: &str) -> String {
        format!(
            "https://{location}-aiplatform.googleapis.com/v1/projects/{project_id}/locations/{location}/publishers/google/models/{model}:generateContent"
        )
    }

    fn build_body(request: &ProviderRequest) -> VertexRequest {
        VertexRequest {
            contents: vec![VertexContent {
                role: "user".to_string(),
                parts: vec![
                    VertexRequestPart::Text {
                        text: request.instructions.clone(),
                    },
                    VertexRequestPart::InlineData {
                        inline_data: VertexInlineData {
                            mime_type: request.image.mime_type().to_string(),
                            data: request.image.base64().to_string(),
                        },
                    },
                ],
            }],
            generation_config: VertexGenerationConfig {
                response_modalities: vec!["TEXT".to_string(), "IMAGE".to_string()],
            },
            safety_settings: vec![SafetySetting {
                category: "HARM_CATEGORY_DANGEROUS_CONTENT".to_string(),
                threshold: "BLOCK_ONLY_HIGH".to_string(),
            }],
        }
    }
}

#[async_trait]
impl GenerationProvider for VertexProvider {
    async fn submit_generation(&self, request: &ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let body = Self::build_body(request);

        debug!(endpoint = %self.endpoint, "Submitting generateContent to Vertex AI");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;

        let text = read_body(response).await?;
        let parsed: VertexResponse = serde_json::from_str(&text)
            .map_err(|e| ProviderError::UnexpectedResponse(format!("invalid Vertex JSON: {}", e)))?;

        Ok(parsed.into_provider_response())
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Vertex
    }
}

// Request types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VertexRequest {
    contents: Vec<VertexContent>,
    generation_config: VertexGenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize)]
struct VertexContent {
    role: String,
    parts: Vec<VertexRequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum VertexRequestPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: VertexInlineData,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VertexInlineData {
    #[serde(default)]
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VertexGenerationConfig {
    response_modalities: Vec<String>,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: String,
    threshold: String,
}

// Response types
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VertexResponse {
    #[serde(default)]
    candidates: Vec<VertexCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VertexCandidate {
    #[serde(default)]
    content: Option<VertexResponseContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VertexResponseContent {
    #[serde(default)]
    parts: Vec<VertexResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VertexResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    inline_data: Option<VertexInlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
    #[serde(default)]
    block_reason_message: Option<String>,
}

impl VertexResponse {
    fn into_provider_response(self) -> ProviderResponse {
        // A blocked prompt comes back as HTTP 200 without candidates.
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason_message.or(f.block_reason)) {
            warn!("Vertex AI blocked the prompt: {}", reason);
            return ProviderResponse {
                parts: vec![ContentPart::Text(format!("Request blocked: {}", reason))],
            };
        }

        let Some(candidate) = self.candidates.into_iter().next() else {
            return ProviderResponse::default();
        };

        if let Some(reason) = candidate.finish_reason.as_deref() {
            debug!(finish_reason = reason, "Vertex AI candidate finished");
        }

        let parts = candidate
            .content
            .map(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|part| match (part.inline_data, part.text) {
                (Some(inline), _) => Some(ContentPart::InlineImage {
                    mime_type: Some(inline.mime_type).filter(|m| !m.is_empty()),
                    data: inline.data,
                }),
                (None, Some(text)) => Some(ContentPart::Text(text)),
                (None, None) => None,
            })
            .collect();

        ProviderResponse { parts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_url::DataUrl;

    fn parse(json: &str) -> ProviderResponse {
        serde_json::from_str::<VertexResponse>(json)
            .unwrap()
            .into_provider_response()
    }

    #[test]
    fn test_endpoint() {
        assert_eq!(
            VertexProvider::endpoint("proj", "us-central1", "gemini-2.5-flash-image"),
            "https://us-central1-aiplatform.googleapis.com/v1/projects/proj/locations/us-central1/publishers/google/models/gemini-2.5-flash-image:generateContent"
        );
    }

    #[test]
    fn test_body_sends_raw_base64() {
        let request = ProviderRequest {
            instructions: "Dress the person".to_string(),
            image: DataUrl::normalize("data:image/png;base64,iVBOR").unwrap(),
        };
        let body = serde_json::to_value(VertexProvider::build_body(&request)).unwrap();

        let parts = &body["contents"][0]["parts"];
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(parts[0]["text"], "Dress the person");
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[1]["inlineData"]["data"], "iVBOR");
        assert_eq!(body["safetySettings"][0]["threshold"], "BLOCK_ONLY_HIGH");
        assert_eq!(body["generationConfig"]["responseModalities"], serde_json::json!(["TEXT", "IMAGE"]));
    }

    #[test]
    fn test_parses_parts_in_order() {
        let response = parse(
            r#"{"candidates":[{"content":{"role":"model","parts":[
                {"text":"Here is the edit"},
                {"inlineData":{"mimeType":"image/webp","data":"UklGR"}}
            ]},"finishReason":"STOP"}]}"#,
        );
        assert_eq!(
            response.parts,
            vec![
                ContentPart::Text("Here is the edit".to_string()),
                ContentPart::InlineImage {
                    mime_type: Some("image/webp".to_string()),
                    data: "UklGR".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_missing_mime_type_is_none() {
        let response = parse(r#"{"candidates":[{"content":{"parts":[{"inlineData":{"data":"AAAA"}}]}}]}"#);
        assert_eq!(
            response.parts,
            vec![ContentPart::InlineImage {
                mime_type: None,
                data: "AAAA".to_string()
            }]
        );
    }

    #[test]
    fn test_blocked_prompt_becomes_text() {
        let response = parse(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#);
        assert_eq!(response.parts, vec![ContentPart::Text("Request blocked: SAFETY".to_string())]);
    }

    #[test]
    fn test_no_candidates() {
        assert!(parse(r#"{"candidates":[]}"#).parts.is_empty());
    }
}
