//! Generate Try-On Lambda - Handles the serverless /generate-tryon endpoint.
//!
//! Accepts `{imageBase64, prompt, category}`, forwards it to the configured
//! generation provider through the shared relay, and answers with either
//! `{generatedImageUrl, message?}` or `{error}`. Every response carries CORS
//! headers so the browser can call the function directly.

use lambda_http::{run, service_fn, Body, Error, Request, Response};
use shared::http::{error_response, preflight_response, reply_response};
use shared::{build_provider, validate_token, AuthConfig, GenerateTryOnRequest, ProviderConfig, Relay};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Application state shared across requests.
struct AppState {
    relay: Relay,
    /// Secret for verifying optional session tokens.
    jwt_secret: Option<String>,
    require_auth: bool,
}

impl AppState {
    async fn new() -> Result<Self, Error> {
        let auth = AuthConfig::from_env()?;
        let config = ProviderConfig::from_env()?;
        let provider = build_provider(&config).await?;
        info!("Using generation provider: {}", provider.name());

        Ok(Self {
            relay: Relay::new(provider),
            jwt_secret: auth.jwt_secret,
            require_auth: auth.require_auth,
        })
    }
}

/// Bearer credential from the `Authorization` header, if any.
fn bearer_credential(event: &Request) -> Option<&str> {
    event
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.strip_prefix("Bearer ").unwrap_or(v).trim())
        .filter(|v| !v.is_empty())
}

/// Check the caller's credential. `Err` carries the 401 message.
fn authorize(state: &AppState, credential: Option<&str>) -> Result<(), &'static str> {
    match (credential, state.jwt_secret.as_deref()) {
        (Some(token), Some(secret)) => match validate_token(token, secret) {
            Ok(user) => {
                info!("Authenticated request for user: {}", user.user_id);
                Ok(())
            }
            Err(e) => {
                warn!("Rejected credential: {}", e);
                Err("Invalid or expired token")
            }
        },
        (Some(_), None) => {
            warn!("Rejected credential: JWT_SECRET is not configured");
            Err("Invalid or expired token")
        }
        (None, _) if state.require_auth => Err("Authentication required"),
        (None, _) => Ok(()),
    }
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    let method = event.method().as_str();

    if method == "OPTIONS" {
        return preflight_response();
    }

    if method != "POST" {
        return error_response(405, "Method not allowed");
    }

    if let Err(message) = authorize(&state, bearer_credential(&event)) {
        return error_response(401, message);
    }

    let payload: GenerateTryOnRequest = match serde_json::from_slice(event.body().as_ref()) {
        Ok(payload) => payload,
        Err(e) => return error_response(400, format!("Invalid request body: {}", e)),
    };

    info!(
        "Generating try-on for category: {}",
        payload.category.as_deref().unwrap_or("other")
    );

    let reply = state.relay.relay(&payload).await;
    reply_response(&reply)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let state = Arc::new(AppState::new().await?);

    run(service_fn(move |event| {
        let state = Arc::clone(&state);
        async move { handler(state, event).await }
    }))
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use shared::providers::{ContentPart, ProviderError};
    use shared::{GenerationProvider, ProviderKind, ProviderRequest, ProviderResponse};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const USER_ID: &str = "6f1c2a5e-2f55-4a8e-9a76-0c4bbd3b1a11";

    struct StubProvider {
        calls: AtomicUsize,
        status: Option<u16>,
    }

    #[async_trait]
    impl GenerationProvider for StubProvider {
        async fn submit_generation(&self, _request: &ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.status {
                Some(status) => Err(ProviderError::Status {
                    status,
                    body: "upstream said no".to_string(),
                }),
                None => Ok(ProviderResponse {
                    parts: vec![ContentPart::InlineImage {
                        mime_type: Some("image/png".to_string()),
                        data: "iVBOR".to_string(),
                    }],
                }),
            }
        }

        fn kind(&self) -> ProviderKind {
            ProviderKind::Gateway
        }
    }

    fn state(status: Option<u16>, require_auth: bool) -> (Arc<AppState>, Arc<StubProvider>) {
        let stub = Arc::new(StubProvider {
            calls: AtomicUsize::new(0),
            status,
        });
        let state = Arc::new(AppState {
            relay: Relay::new(stub.clone()),
            jwt_secret: Some("secret".to_string()),
            require_auth,
        });
        (state, stub)
    }

    fn request(method: &str, body: &str, token: Option<&str>) -> Request {
        let mut builder = lambda_http::http::Request::builder()
            .method(method)
            .uri("https://functions.test/generate-tryon")
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn json(response: &Response<Body>) -> serde_json::Value {
        serde_json::from_slice(response.body().as_ref()).unwrap()
    }

    const VALID: &str = r#"{"imageBase64":"data:image/jpeg;base64,QUJD","prompt":"red lipstick","category":"makeup"}"#;

    #[tokio::test]
    async fn test_preflight() {
        let (state, stub) = state(None, false);
        let response = handler(state, request("OPTIONS", "", None)).await.unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_generates_image() {
        let (state, stub) = state(None, false);
        let response = handler(state, request("POST", VALID, None)).await.unwrap();
        assert_eq!(response.status(), 200);
        let body = json(&response);
        assert_eq!(body["generatedImageUrl"], "data:image/png;base64,iVBOR");
        assert!(body["instructions"].as_str().unwrap().starts_with("Apply makeup to the person in this image: red lipstick."));
        assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_prompt_is_400_without_provider_call() {
        let (state, stub) = state(None, false);
        let response = handler(state, request("POST", r#"{"imageBase64":"QUJD"}"#, None))
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        assert!(json(&response)["error"].as_str().unwrap().contains("imageBase64 and prompt"));
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_malformed_json_is_400() {
        let (state, _) = state(None, false);
        let response = handler(state, request("POST", "{not json", None)).await.unwrap();
        assert_eq!(response.status(), 400);
    }

    #[tokio::test]
    async fn test_provider_statuses_are_mirrored() {
        for (upstream, expected) in [(429, 429), (402, 402), (500, 500), (503, 500)] {
            let (state, _) = state(Some(upstream), false);
            let response = handler(state, request("POST", VALID, None)).await.unwrap();
            assert_eq!(response.status(), expected);
            assert!(json(&response)["error"].is_string());
        }
    }

    #[tokio::test]
    async fn test_required_auth() {
        let (state, stub) = state(None, true);
        let response = handler(state.clone(), request("POST", VALID, None)).await.unwrap();
        assert_eq!(response.status(), 401);

        let token = shared::issue_token(USER_ID.parse().unwrap(), "secret").unwrap();
        let response = handler(state, request("POST", VALID, Some(&token))).await.unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_token_is_rejected() {
        let (state, stub) = state(None, false);
        let response = handler(state, request("POST", VALID, Some("garbage"))).await.unwrap();
        assert_eq!(response.status(), 401);
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_token_without_configured_secret_is_rejected() {
        for require_auth in [true, false] {
            let stub = Arc::new(StubProvider {
                calls: AtomicUsize::new(0),
                status: None,
            });
            let state = Arc::new(AppState {
                relay: Relay::new(stub.clone()),
                jwt_secret: None,
                require_auth,
            });

            let response = handler(state, request("POST", VALID, Some("forged"))).await.unwrap();
            assert_eq!(response.status(), 401);
            assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn test_rejects_other_methods() {
        let (state, _) = state(None, false);
        let response = handler(state, request("GET", "", None)).await.unwrap();
        assert_eq!(response.status(), 405);
    }
}
