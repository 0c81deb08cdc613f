use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use shared::{AuthConfig, Error, ProviderConfig, Result};
use tracing::{info, warn};

/// Settings of the long-running server, loaded from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub upload_dir: PathBuf,
    /// Reject generation requests without a valid session token.
    pub require_auth: bool,
    pub provider: ProviderConfig,
}

impl ServerConfig {
    pub fn load() -> Result<Self> {
        let auth = AuthConfig::from_env()?;

        Ok(Self {
            port: try_load("PORT", "5000")?,
            database_url: required("DATABASE_URL")?,
            // The server issues tokens, so it always needs a secret
            jwt_secret: auth
                .jwt_secret
                .ok_or_else(|| Error::Config("JWT_SECRET is not set".to_string()))?,
            upload_dir: PathBuf::from(try_load::<String>("UPLOAD_DIR", "uploads")?),
            require_auth: auth.require_auth,
            provider: ProviderConfig::from_env()?,
        })
    }
}

fn required(key: &str) -> Result<String> {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| Error::Config(format!("{key} is not set")))
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    env::var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
            Error::Config(format!("Invalid {key} value: {e}"))
        })
}
