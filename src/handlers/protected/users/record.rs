// handlers/protected/users/record.rs - /api/users/:id handlers

use axum::extract::{Path, State};

use crate::app::AppState;
use crate::database::models::UserResponse;
use crate::handlers::utils::parse_id;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonBody};
use crate::types::UpdateUserRequest;

/// GET /api/users/:id - Self or admin
pub async fn user_get(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<UserResponse> {
    let id = parse_id(&id, "id")?;
    let found = state.users.get(&user.identity, id).await?;
    Ok(ApiResponse::success(found))
}

/// PUT /api/users/:id - Change username and email; self only
pub async fn user_put(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<UpdateUserRequest>,
) -> ApiResult<UserResponse> {
    let id = parse_id(&id, "id")?;
    let updated = state.users.update(&user.identity, id, request).await?;
    Ok(ApiResponse::success(updated))
}

/**
 * DELETE /api/users/:id - Remove the caller's own account
 *
 * Pets owned by the account go with it. Tokens already issued for it stay
 * valid until they expire.
 */
pub async fn user_delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let id = parse_id(&id, "id")?;
    state.users.delete(&user.identity, id).await?;
    Ok(ApiResponse::no_content())
}
