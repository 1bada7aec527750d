use std::sync::Arc;

use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, warn};

use crate::config::AuthConfig;

const API_KEY_HEADER: &str = "x-api-key";

/// Checks callers against the single shared API key.
#[derive(Clone, Default)]
pub struct ApiKeyAuthorizer {
    api_key: Option<String>,
}

impl ApiKeyAuthorizer {
    pub fn new(api_key: Option<String>) -> Self {
        Self { api_key }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.api_key.clone())
    }

    /// Accepts `Authorization: Bearer <key>` or `x-api-key: <key>`.
    pub fn authorize(&self, headers: &HeaderMap) -> bool {
        let Some(expected) = self.api_key.as_deref() else {
            error!("APP_API_KEY not configured; rejecting mutating request");
            return false;
        };

        match presented_key(headers) {
            Some(provided) => constant_time_eq(provided.as_bytes(), expected.as_bytes()),
            None => false,
        }
    }
}

fn presented_key(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    bearer.or_else(|| {
        headers
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
    })
}

fn constant_time_eq(provided: &[u8], expected: &[u8]) -> bool {
    if provided.len() != expected.len() {
        return false;
    }
    provided
        .iter()
        .zip(expected)
        .fold(0u8, |acc, (left, right)| acc | (left ^ right))
        == 0
}

/// Extractor proving the request carried the shared API key.
#[derive(Debug, Clone, Copy)]
pub struct Authorized;

#[async_trait]
impl<S> FromRequestParts<S> for Authorized
where
    Arc<ApiKeyAuthorizer>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let authorizer = Arc::<ApiKeyAuthorizer>::from_ref(state);
        if authorizer.authorize(&parts.headers) {
            return Ok(Authorized);
        }

        warn!(method = %parts.method, path = %parts.uri.path(), "unauthorized request rejected");
        Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Unauthorized" })),
        )
            .into_response())
    }
}
