// handlers/protected/users/role.rs - PATCH /api/users/:id/role handler

use axum::extract::{Path, State};

use crate::app::AppState;
use crate::database::models::UserResponse;
use crate::handlers::utils::parse_id;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonBody};
use crate::types::ChangeRoleRequest;

/// PATCH /api/users/:id/role - `{role: "user" | "admin"}`; admin only
pub async fn role_patch(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<ChangeRoleRequest>,
) -> ApiResult<UserResponse> {
    let id = parse_id(&id, "id")?;
    let updated = state.users.change_role(&user.identity, id, request).await?;
    Ok(ApiResponse::success(updated))
}
