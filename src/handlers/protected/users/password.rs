// handlers/protected/users/password.rs - PATCH /api/users/:id/password handler

use axum::extract::{Path, State};

use crate::app::AppState;
use crate::handlers::utils::parse_id;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonBody};
use crate::types::{ChangePasswordRequest, MessageResponse};

/// PATCH /api/users/:id/password - `{old_password, new_password}`; self only
pub async fn password_patch(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<ChangePasswordRequest>,
) -> ApiResult<MessageResponse> {
    let id = parse_id(&id, "id")?;
    state.users.change_password(&user.identity, id, request).await?;
    Ok(ApiResponse::success(MessageResponse::new("Password updated")))
}
