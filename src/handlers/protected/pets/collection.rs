// handlers/protected/pets/collection.rs - /api/pets handlers

use axum::extract::{rejection::QueryRejection, Query, State};

use crate::app::AppState;
use crate::database::models::Pet;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonBody};
use crate::types::{PetList, PetListParams, PetRequest};

/**
 * GET /api/pets?page&limit&species&owner_id - Page through visible pets
 *
 * Non-admin callers only ever see their own pets; `owner_id` is ignored for them.
 * Admins see every owner unless `owner_id` narrows the list.
 */
pub async fn pets_get(
    State(state): State<AppState>,
    user: AuthUser,
    query: Result<Query<PetListParams>, QueryRejection>,
) -> ApiResult<PetList> {
    let Query(params) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let list = state.pets.list(&user.identity, params).await?;
    Ok(ApiResponse::success(list))
}

/// POST /api/pets - Create a pet owned by the caller
pub async fn pets_post(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(request): JsonBody<PetRequest>,
) -> ApiResult<Pet> {
    let pet = state.pets.create(&user.identity, request).await?;
    Ok(ApiResponse::created(pet))
}
