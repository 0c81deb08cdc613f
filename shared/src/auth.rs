//! Password hashing and JWT session tokens.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// bcrypt work factor for stored passwords.
pub const BCRYPT_COST: u32 = 10;

/// Session token lifetime.
pub const TOKEN_TTL_SECONDS: i64 = 60 * 60;

/// JWT claims issued at login.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user id)
    pub sub: String,
    /// Issued at
    pub iat: i64,
    /// Expiration
    pub exp: i64,
}

/// Decoded user information from a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

impl TryFrom<SessionClaims> for AuthenticatedUser {
    type Error = Error;

    fn try_from(claims: SessionClaims) -> Result<Self> {
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|e| Error::Auth(format!("Invalid subject: {}", e)))?;

        Ok(Self { user_id })
    }
}

/// Hash a password for storage.
pub fn hash_password(password: &str) -> Result<String> {
    Ok(bcrypt::hash(password, BCRYPT_COST)?)
}

/// Compare a password against a stored hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    Ok(bcrypt::verify(password, hash)?)
}

/// Sign a session token for the given user.
pub fn issue_token(user_id: Uuid, secret: &str) -> Result<String> {
    let now = Utc::now();
    let claims = SessionClaims {
        sub: user_id.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::seconds(TOKEN_TTL_SECONDS)).timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| Error::Internal(format!("Failed to sign token: {}", e)))
}

/// Validate a session token and extract user information.
pub fn validate_token(token: &str, secret: &str) -> Result<AuthenticatedUser> {
    // Skip "Bearer " prefix if present
    let token = token.strip_prefix("Bearer ").unwrap_or(token).trim();

    let validation = Validation::new(Algorithm::HS256);
    let key = DecodingKey::from_secret(secret.as_bytes());

    let token_data = decode::<SessionClaims>(token, &key, &validation)
        .map_err(|e| Error::Auth(format!("Failed to decode token: {}", e)))?;

    AuthenticatedUser::try_from(token_data.claims)
}
