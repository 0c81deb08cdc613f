//! Configuration management for the relay.

use std::env;
use std::str::FromStr;

use crate::{Error, Result};

/// Default chat-completions gateway endpoint.
pub const DEFAULT_GATEWAY_URL: &str = "https://ai.gateway.lovable.dev/v1/chat/completions";
/// Default model requested from the gateway.
pub const DEFAULT_GATEWAY_MODEL: &str = "google/gemini-2.5-flash-image-preview";
/// Default Vertex AI model.
pub const DEFAULT_VERTEX_MODEL: &str = "gemini-2.5-flash-image";

/// Which upstream API the relay talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderKind {
    /// OpenAI-style chat-completions gateway.
    #[default]
    Gateway,
    /// Google Vertex AI `generateContent`.
    Vertex,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gateway => "gateway",
            Self::Vertex => "vertex",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gateway" | "lovable" => Ok(Self::Gateway),
            "vertex" | "vertex-ai" => Ok(Self::Vertex),
            other => Err(Error::Config(format!("Unknown TRYON_PROVIDER: {}", other))),
        }
    }
}

/// Chat-completions gateway settings.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub url: String,
    pub model: String,
    /// API key taken directly from the environment.
    pub api_key: Option<String>,
    /// Secrets Manager ARN holding the API key, used when `api_key` is unset.
    pub api_key_secret_arn: Option<String>,
}

/// Vertex AI settings.
#[derive(Debug, Clone)]
pub struct VertexConfig {
    pub project_id: Option<String>,
    pub location: String,
    pub model: String,
    /// OAuth access token sent as the bearer credential.
    pub access_token: Option<String>,
    pub access_token_secret_arn: Option<String>,
}

/// Provider configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub gateway: GatewayConfig,
    pub vertex: VertexConfig,
}

impl ProviderConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let kind = match var("TRYON_PROVIDER") {
            Some(value) => value.parse()?,
            None => ProviderKind::default(),
        };

        Ok(Self {
            kind,
            gateway: GatewayConfig {
                url: var("AI_GATEWAY_URL").unwrap_or_else(|| DEFAULT_GATEWAY_URL.to_string()),
                model: var("AI_GATEWAY_MODEL").unwrap_or_else(|| DEFAULT_GATEWAY_MODEL.to_string()),
                api_key: var("AI_GATEWAY_API_KEY").or_else(|| var("LOVABLE_API_KEY")),
                api_key_secret_arn: var("AI_GATEWAY_API_KEY_SECRET_ARN"),
            },
            vertex: VertexConfig {
                project_id: var("GOOGLE_PROJECT_ID"),
                location: var("GOOGLE_LOCATION").unwrap_or_else(|| "us-central1".to_string()),
                model: var("VERTEX_MODEL").unwrap_or_else(|| DEFAULT_VERTEX_MODEL.to_string()),
                access_token: var("VERTEX_ACCESS_TOKEN"),
                access_token_secret_arn: var("VERTEX_ACCESS_TOKEN_SECRET_ARN"),
            },
        })
    }
}

/// Session settings shared by every surface that accepts bearer tokens.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    /// HS256 secret for session tokens.
    pub jwt_secret: Option<String>,
    /// Reject generation requests without a valid session token.
    pub require_auth: bool,
}

impl AuthConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Fails when auth is required but no secret is configured.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = lookup("JWT_SECRET").filter(|v| !v.trim().is_empty());
        let require_auth = match lookup("TRYON_REQUIRE_AUTH") {
            Some(value) => parse_flag("TRYON_REQUIRE_AUTH", &value)?,
            None => false,
        };

        if require_auth && jwt_secret.is_none() {
            return Err(Error::Config(
                "TRYON_REQUIRE_AUTH is set but JWT_SECRET is not configured".to_string(),
            ));
        }

        Ok(Self {
            jwt_secret,
            require_auth,
        })
    }
}

/// Parse a boolean environment flag. Blank means unset.
pub fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        other => Err(Error::Config(format!("Invalid {} value: {}", key, other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_to_gateway() {
        let config = ProviderConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.kind, ProviderKind::Gateway);
        assert_eq!(config.gateway.url, DEFAULT_GATEWAY_URL);
        assert_eq!(config.gateway.model, DEFAULT_GATEWAY_MODEL);
        assert_eq!(config.vertex.location, "us-central1");
        assert!(config.gateway.api_key.is_none());
    }

    #[test]
    fn test_selects_vertex() {
        let config = ProviderConfig::from_lookup(lookup(&[
            ("TRYON_PROVIDER", "vertex"),
            ("GOOGLE_PROJECT_ID", "my-project"),
            ("VERTEX_ACCESS_TOKEN", "ya29.token"),
        ]))
        .unwrap();
        assert_eq!(config.kind, ProviderKind::Vertex);
        assert_eq!(config.vertex.project_id.as_deref(), Some("my-project"));
        assert_eq!(config.vertex.access_token.as_deref(), Some("ya29.token"));
    }

    #[test]
    fn test_legacy_gateway_key_name() {
        let config = ProviderConfig::from_lookup(lookup(&[("LOVABLE_API_KEY", "key-1")])).unwrap();
        assert_eq!(config.gateway.api_key.as_deref(), Some("key-1"));
    }

    #[test]
    fn test_unknown_provider_is_config_error() {
        let err = ProviderConfig::from_lookup(lookup(&[("TRYON_PROVIDER", "dall-e")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_parse_flag() {
        for value in ["true", "TRUE", " 1 ", "yes", "On"] {
            assert!(parse_flag("FLAG", value).unwrap(), "{value}");
        }
        for value in ["false", "False", "0", "no", "off", ""] {
            assert!(!parse_flag("FLAG", value).unwrap(), "{value}");
        }
        assert!(matches!(parse_flag("FLAG", "maybe"), Err(Error::Config(_))));
    }

    #[test]
    fn test_auth_config() {
        let config = AuthConfig::from_lookup(lookup(&[])).unwrap();
        assert!(!config.require_auth);
        assert!(config.jwt_secret.is_none());

        let config =
            AuthConfig::from_lookup(lookup(&[("JWT_SECRET", "s3cret"), ("TRYON_REQUIRE_AUTH", "TRUE")])).unwrap();
        assert!(config.require_auth);
        assert_eq!(config.jwt_secret.as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_required_auth_needs_secret() {
        let err = AuthConfig::from_lookup(lookup(&[("TRYON_REQUIRE_AUTH", "1")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = AuthConfig::from_lookup(lookup(&[("JWT_SECRET", "  "), ("TRYON_REQUIRE_AUTH", "true")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
