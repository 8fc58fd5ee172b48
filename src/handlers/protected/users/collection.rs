// handlers/protected/users/collection.rs - GET /api/users handler

use axum::extract::{rejection::QueryRejection, Query, State};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::types::{PageParams, UserList};

/// GET /api/users?page&limit - Every account, newest first; admin only
pub async fn users_get(
    State(state): State<AppState>,
    user: AuthUser,
    query: Result<Query<PageParams>, QueryRejection>,
) -> ApiResult<UserList> {
    let Query(params) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let list = state.users.list(&user.identity, params).await?;
    Ok(ApiResponse::success(list))
}
