//! Shared library for the virtual try-on services.
//!
//! This crate provides the generation relay, its provider adapters, and the
//! auth, config and HTTP utilities used by both the long-running server and
//! the serverless function.

pub mod auth;
pub mod category;
pub mod config;
pub mod data_url;
pub mod db;
pub mod error;
pub mod http;
pub mod models;
pub mod outcome;
pub mod providers;
pub mod relay;
pub mod request;
pub mod secrets;

pub use auth::{hash_password, issue_token, validate_token, verify_password, AuthenticatedUser};
pub use category::Category;
pub use config::{AuthConfig, ProviderConfig, ProviderKind};
pub use data_url::DataUrl;
pub use error::{Error, Result};
pub use models::{ErrorBody, GenerateTryOnRequest, GenerateTryOnResponse};
pub use outcome::{GenerationFailure, GenerationOutcome, TEXT_ONLY_PLACEHOLDER_URL};
pub use providers::{build_provider, GenerationProvider, ProviderRequest, ProviderResponse};
pub use relay::{Relay, RelayReply};
pub use request::GenerationRequest;
