// handlers/public/auth/register.rs - POST /api/users/register handler

use axum::extract::State;

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, JsonBody};
use crate::types::{AuthResponse, RegisterRequest};

/**
 * POST /api/users/register - Create an account and receive a token
 *
 * Input: `{ "username": "...", "email": "...", "password": "..." }`
 * Output: 201 with `{ "token": "...", "user": { ... } }`
 *
 * Any role in the body is ignored; new accounts are plain users.
 * Duplicate username or email answers 409.
 */
pub async fn register_post(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> ApiResult<AuthResponse> {
    let auth = state.users.register(request).await?;
    Ok(ApiResponse::created(auth))
}
