use std::sync::Arc;

use validator::Validate;

use crate::auth::Identity;
use crate::config::ApiConfig;
use crate::database::models::{NewPet, Pet, PetChanges};
use crate::database::{Pagination, PetListQuery, PetRepository};
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::ownership::{ensure_owner_or_admin, list_scope, write_scope};
use crate::types::{PetList, PetListParams, PetRequest};

/// Pet operations with ownership enforcement.
pub struct PetService {
    pets: Arc<dyn PetRepository>,
    api: ApiConfig,
}

impl PetService {
    pub fn new(pets: Arc<dyn PetRepository>, api: ApiConfig) -> Self {
        Self { pets, api }
    }

    /// The new pet always belongs to the caller.
    pub async fn create(&self, caller: &Identity, request: PetRequest) -> ServiceResult<Pet> {
        let changes = Self::changes_from(request)?;
        let pet = self
            .pets
            .create(NewPet {
                name: changes.name,
                species: changes.species,
                price: changes.price,
                owner_id: caller.user_id,
            })
            .await?;

        tracing::info!("user {} created pet {}", caller.user_id, pet.id);
        Ok(pet)
    }

    pub async fn list(&self, caller: &Identity, params: PetListParams) -> ServiceResult<PetList> {
        let owner = list_scope(caller, params.owner_id.as_deref())?;
        let pagination = Pagination::parse(
            params.page.as_deref(),
            params.limit.as_deref(),
            self.api.default_page_limit,
            self.api.max_page_limit,
        );
        let species = params
            .species
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let query = PetListQuery { owner, pagination, species };
        let page = self.pets.list(&query).await?;
        Ok(PetList::from_page(page, pagination.page(), pagination.limit()))
    }

    pub async fn get(&self, caller: &Identity, id: i64) -> ServiceResult<Pet> {
        let pet = self.pets.find_by_id(id).await?;
        ensure_owner_or_admin(caller, &pet)?;
        Ok(pet)
    }

    /// Replace name, species and price. The owner never changes.
    pub async fn update(&self, caller: &Identity, id: i64, request: PetRequest) -> ServiceResult<Pet> {
        let changes = Self::changes_from(request)?;
        let existing = self.pets.find_by_id(id).await?;
        ensure_owner_or_admin(caller, &existing)?;

        let pet = self.pets.update(id, write_scope(caller), changes).await?;
        tracing::info!("user {} updated pet {}", caller.user_id, id);
        Ok(pet)
    }

    pub async fn delete(&self, caller: &Identity, id: i64) -> ServiceResult<()> {
        let existing = self.pets.find_by_id(id).await?;
        ensure_owner_or_admin(caller, &existing)?;

        self.pets.delete(id, write_scope(caller)).await?;
        tracing::info!("user {} deleted pet {}", caller.user_id, id);
        Ok(())
    }

    fn changes_from(request: PetRequest) -> ServiceResult<PetChanges> {
        let request = request.trimmed();
        request.validate()?;
        let price = request
            .price
            .ok_or_else(|| ServiceError::field("price", "Price is required"))?;
        if !price.is_finite() {
            return Err(ServiceError::field("price", "Price must be a finite number"));
        }

        Ok(PetChanges { name: request.name, species: request.species, price })
    }
}
