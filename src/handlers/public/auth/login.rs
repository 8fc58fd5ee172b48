// handlers/public/auth/login.rs - POST /api/users/login handler

use axum::extract::State;

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, JsonBody};
use crate::types::{AuthResponse, LoginRequest};

/// POST /api/users/login - Exchange username and password for a token
pub async fn login_post(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> ApiResult<AuthResponse> {
    let auth = state.users.login(request).await?;
    Ok(ApiResponse::success(auth))
}
