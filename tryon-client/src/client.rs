//! HTTP client for a try-on relay.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use serde_json::{json, Value};
use shared::{GenerateTryOnResponse, GenerationFailure, GenerationOutcome, GenerationRequest, TEXT_ONLY_PLACEHOLDER_URL};
use tracing::{debug, info, warn};

use crate::error::ClientError;

/// Route of the long-running server. Serverless deployments mount the
/// function elsewhere, see [`TryOnClient::with_generate_path`].
pub const DEFAULT_GENERATE_PATH: &str = "/api/generate-tryon";
pub const LOGIN_PATH: &str = "/auth/login";

/// A session token, always passed explicitly to the calls that need it.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn token(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Status and JSON body of a relay response.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Value,
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_json(
        &self,
        path: &str,
        body: &Value,
        credential: Option<&Credential>,
    ) -> Result<TransportResponse, ClientError>;
}

pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(
        &self,
        path: &str,
        body: &Value,
        credential: Option<&Credential>,
    ) -> Result<TransportResponse, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let mut request = self.client.post(&url).json(body);
        if let Some(credential) = credential {
            request = request.bearer_auth(credential.token());
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        // Proxies sometimes answer with plain text
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        Ok(TransportResponse { status, body })
    }
}

#[derive(Clone)]
pub struct TryOnClient {
    transport: Arc<dyn Transport>,
    generate_path: String,
}

impl TryOnClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_transport(Arc::new(HttpTransport::new(base_url)))
    }

    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            generate_path: DEFAULT_GENERATE_PATH.to_string(),
        }
    }

    pub fn with_generate_path(mut self, path: impl Into<String>) -> Self {
        self.generate_path = path.into();
        self
    }

    /// Submit one request. Never retries; every failure becomes an outcome.
    pub async fn generate(&self, request: &GenerationRequest, credential: Option<&Credential>) -> GenerationOutcome {
        let body = match serde_json::to_value(request.to_wire()) {
            Ok(body) => body,
            Err(e) => return GenerationFailure::Validation(e.to_string()).into(),
        };

        info!("Submitting {} try-on", request.category().as_str());

        match self.transport.post_json(&self.generate_path, &body, credential).await {
            Ok(response) => interpret(response),
            Err(e) => {
                warn!("Generation request failed: {}", e);
                GenerationFailure::Network(e.to_string()).into()
            }
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Credential, ClientError> {
        let body = json!({ "email": email, "password": password });
        let response = self.transport.post_json(LOGIN_PATH, &body, None).await?;

        match response.status {
            200 => response
                .body
                .get("token")
                .and_then(Value::as_str)
                .map(Credential::new)
                .ok_or_else(|| ClientError::UnexpectedResponse("login response has no token".to_string())),
            401 => Err(ClientError::InvalidCredential),
            status => Err(ClientError::Status {
                status,
                message: error_message(&response.body),
            }),
        }
    }
}

fn interpret(response: TransportResponse) -> GenerationOutcome {
    if response.status != 200 {
        return GenerationFailure::from_status(response.status, error_message(&response.body)).into();
    }

    match serde_json::from_value::<GenerateTryOnResponse>(response.body) {
        Ok(GenerateTryOnResponse {
            generated_image_url,
            message: Some(message),
            ..
        }) if generated_image_url == TEXT_ONLY_PLACEHOLDER_URL => GenerationOutcome::TextOnly { message },
        Ok(body) => GenerationOutcome::Image {
            url: body.generated_image_url,
        },
        Err(e) => GenerationFailure::Provider {
            status: 200,
            body: e.to_string(),
        }
        .into(),
    }
}

fn error_message(body: &Value) -> String {
    match body {
        Value::String(text) => text.clone(),
        other => other
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("Failed to generate image")
            .to_string(),
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    };
    use tokio::sync::Notify;

    /// Answers every call with one canned response.
    pub struct FakeTransport {
        pub response: Result<TransportResponse, String>,
        pub calls: AtomicUsize,
        pub last_path: Mutex<Option<String>>,
        pub last_body: Mutex<Option<Value>>,
        pub last_token: Mutex<Option<String>>,
        /// When set, calls wait for a notification before answering.
        pub gate: Option<Notify>,
    }

    impl FakeTransport {
        pub fn ok(body: Value) -> Self {
            Self::status(200, body)
        }

        pub fn status(status: u16, body: Value) -> Self {
            Self {
                response: Ok(TransportResponse { status, body }),
                calls: AtomicUsize::new(0),
                last_path: Mutex::new(None),
                last_body: Mutex::new(None),
                last_token: Mutex::new(None),
                gate: None,
            }
        }

        pub fn unreachable() -> Self {
            Self {
                response: Err("connection refused".to_string()),
                ..Self::ok(Value::Null)
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn post_json(
            &self,
            path: &str,
            body: &Value,
            credential: Option<&Credential>,
        ) -> Result<TransportResponse, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_path.lock().unwrap() = Some(path.to_string());
            *self.last_body.lock().unwrap() = Some(body.clone());
            *self.last_token.lock().unwrap() = credential.map(|c| c.token().to_string());

            if let Some(gate) = &self.gate {
                gate.notified().await;
            }

            self.response.clone().map_err(ClientError::Network)
        }
    }
}
