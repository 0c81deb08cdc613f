use std::sync::Arc;

use axum::{body::Bytes, extract::State as Extract, Json};
use chrono::{DateTime, Utc};
use shared::models::{Credentials, LoginResponse, User};
use shared::{hash_password, issue_token, verify_password};
use tracing::{info, warn};
use uuid::Uuid;

use super::{parse_json, parse_valid};
use crate::{error::AppError, state::State};

pub async fn signup_handler(
    Extract(state): Extract<Arc<State>>,
    body: Bytes,
) -> Result<Json<User>, AppError> {
    let credentials: Credentials = parse_valid(&body)?;
    let password_hash = hash_password(&credentials.password)?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, email, password_hash)
        VALUES ($1, $2, $3)
        RETURNING id, email, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(credentials.email.trim().to_lowercase())
    .bind(&password_hash)
    .fetch_one(&state.db_pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            AppError::Shared(shared::Error::Conflict("Email already registered".to_string()))
        }
        other => other.into(),
    })?;

    info!("Created user {}", user.id);
    Ok(Json(user))
}

pub async fn login_handler(
    Extract(state): Extract<Arc<State>>,
    body: Bytes,
) -> Result<Json<LoginResponse>, AppError> {
    let credentials: Credentials = parse_json(&body)?;

    let row: Option<(Uuid, String, String, DateTime<Utc>)> = sqlx::query_as(
        "SELECT id, email, password_hash, created_at FROM users WHERE email = $1",
    )
    .bind(credentials.email.trim().to_lowercase())
    .fetch_optional(&state.db_pool)
    .await?;

    let Some((id, email, password_hash, created_at)) = row else {
        warn!("Login attempt for unknown email");
        return Err(AppError::InvalidCredential);
    };

    if !verify_password(&credentials.password, &password_hash)? {
        warn!("Login attempt with wrong password for user {}", id);
        return Err(AppError::InvalidCredential);
    }

    let token = issue_token(id, &state.config.jwt_secret)?;
    info!("User {} logged in", id);

    Ok(Json(LoginResponse {
        token,
        user: User {
            id,
            email,
            created_at,
        },
    }))
}
