// handlers/protected/pets/record.rs - /api/pets/:pet_id handlers

use axum::extract::{Path, State};

use crate::app::AppState;
use crate::database::models::Pet;
use crate::handlers::utils::parse_id;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonBody};
use crate::types::PetRequest;

/// GET /api/pets/:pet_id - Owner or admin
pub async fn pet_get(
    State(state): State<AppState>,
    user: AuthUser,
    Path(pet_id): Path<String>,
) -> ApiResult<Pet> {
    let id = parse_id(&pet_id, "pet_id")?;
    let pet = state.pets.get(&user.identity, id).await?;
    Ok(ApiResponse::success(pet))
}

/// PUT /api/pets/:pet_id - Replace name, species and price; owner or admin
pub async fn pet_put(
    State(state): State<AppState>,
    user: AuthUser,
    Path(pet_id): Path<String>,
    JsonBody(request): JsonBody<PetRequest>,
) -> ApiResult<Pet> {
    let id = parse_id(&pet_id, "pet_id")?;
    let pet = state.pets.update(&user.identity, id, request).await?;
    Ok(ApiResponse::success(pet))
}

/// DELETE /api/pets/:pet_id - Owner or admin; 204 on success
pub async fn pet_delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(pet_id): Path<String>,
) -> ApiResult<()> {
    let id = parse_id(&pet_id, "pet_id")?;
    state.pets.delete(&user.identity, id).await?;
    Ok(ApiResponse::no_content())
}
