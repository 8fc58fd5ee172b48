// handlers/protected/auth/refresh.rs - POST /api/auth/refresh handler

use axum::extract::State;

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::types::RefreshResponse;

/**
 * POST /api/auth/refresh - Trade a still-valid token for one with a new window
 *
 * With the default `reload` policy the new claims come from the stored account,
 * so a role change shows up here and a deleted account gets 401.
 */
pub async fn refresh_post(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<RefreshResponse> {
    let refreshed = state.users.refresh(&user.identity, &user.token).await?;
    Ok(ApiResponse::success(refreshed))
}
