use std::ops::Deref;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::{Identity, TokenService};
use crate::database::models::Role;
use crate::error::ApiError;

/// Authenticated caller, inserted into request extensions by `jwt_auth`.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub identity: Identity,
    /// The bearer token as presented, for refresh.
    pub token: String,
}

impl Deref for AuthUser {
    type Target = Identity;

    fn deref(&self) -> &Identity {
        &self.identity
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// JWT authentication middleware that validates tokens and attaches the caller
pub async fn jwt_auth(
    State(tokens): State<Arc<TokenService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(request.headers()).map_err(ApiError::unauthorized)?;

    let identity = tokens
        .validate(&token)
        .map_err(|_| ApiError::unauthorized("Invalid or expired token"))?;

    request.extensions_mut().insert(AuthUser { identity, token });
    Ok(next.run(request).await)
}

/// Role gate for routes already behind `jwt_auth`; the role must match exactly
pub async fn require_role(
    State(role): State<Role>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let caller = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if caller.role != role {
        tracing::debug!("user {} lacks role {}", caller.user_id, role);
        return Err(ApiError::forbidden(format!("{} role required", role)));
    }

    Ok(next.run(request).await)
}

/// Extract the token from `Authorization: Bearer <token>`.
///
/// The scheme is case-insensitive; exactly one space separates it from a
/// non-empty token containing no whitespace.
pub fn extract_bearer(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    let (scheme, token) = auth_str
        .split_once(' ')
        .ok_or_else(|| "Authorization header must use Bearer token format".to_string())?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err("Authorization header must use Bearer token format".to_string());
    }
    if token.is_empty() || token.chars().any(char::is_whitespace) {
        return Err("Malformed bearer token".to_string());
    }

    Ok(token.to_string())
}
