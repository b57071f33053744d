use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::collections::HashSet;
use std::sync::Arc;

use crate::job::BatchJob;
use crate::track::RenderSink;
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};

use super::config::{Config, Permission};

/// The API key a request was made with.
#[derive(Clone)]
pub struct AuthenticatedUser {
    pub key_name: String,
    pub permissions: HashSet<Permission>,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub job: BatchJob,
    pub sink: Arc<dyn RenderSink>,
}

#[derive(Debug)]
pub enum AuthError {
    MissingCredentials,
    MalformedCredentials,
    UnknownKey,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (code, message) = match self {
            AuthError::MissingCredentials => ("missing_credentials", "no Authorization header"),
            AuthError::MalformedCredentials => {
                ("malformed_credentials", "expected 'Authorization: Bearer <key>'")
            }
            AuthError::UnknownKey => ("unknown_api_key", "API key not recognized"),
        };
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::with_message(code, message)),
        )
            .into_response()
    }
}

fn bearer_key(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?
        .to_str()
        .map_err(|_| AuthError::MalformedCredentials)?;
    match value.strip_prefix("Bearer ").map(str::trim) {
        Some(key) if !key.is_empty() => Ok(key),
        _ => Err(AuthError::MalformedCredentials),
    }
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let key = bearer_key(&parts.headers)?;
        let api_key = state.config.find_api_key(key).ok_or_else(|| {
            log::debug!("rejected request to {} with an unknown key", parts.uri.path());
            AuthError::UnknownKey
        })?;

        Ok(AuthenticatedUser {
            key_name: api_key.name.clone(),
            permissions: api_key.permissions.clone(),
        })
    }
}

/// Fails with `insufficient_permissions` naming the missing grant.
pub fn require_permission(user: &AuthenticatedUser, permission: Permission) -> ApiResult<()> {
    if user.permissions.contains(&permission) {
        return Ok(());
    }
    log::debug!("key '{}' lacks {}", user.key_name, permission);
    Err(ApiError::Permission(permission))
}
