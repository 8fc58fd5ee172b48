use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::database::manager::DatabaseError;
use crate::database::models::{NewPet, NewUser, Pet, PetChanges, Role, User, UserProfile};
use crate::database::repository::{
    HealthCheck, OwnerFilter, Page, Pagination, PetListQuery, PetRepository, UserRepository,
};

/// In-process store with the same contract as the Postgres one.
///
/// All tables sit behind one mutex, so every call is atomic: uniqueness checks and
/// the insert they guard cannot interleave with another registration.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    pets: BTreeMap<i64, Pet>,
    last_user_id: i64,
    last_pet_id: i64,
}

impl Tables {
    fn unique_conflict(&self, username: &str, email: &str, except: Option<i64>) -> Option<&'static str> {
        let mut others = self.users.values().filter(|u| Some(u.id) != except);
        if others.clone().any(|u| u.username == username) {
            return Some("username");
        }
        if others.any(|u| u.email == email) {
            return Some("email");
        }
        None
    }

    fn user_mut(&mut self, id: i64) -> Result<&mut User, DatabaseError> {
        self.users
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::NotFound(format!("user {} not found", id)))
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, DatabaseError> {
        self.tables
            .lock()
            .map_err(|_| DatabaseError::QueryError("memory store lock poisoned".to_string()))
    }
}

fn paginate<T: Clone>(rows: Vec<&T>, pagination: Pagination) -> Vec<T> {
    let offset = usize::try_from(pagination.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(pagination.limit()).unwrap_or(usize::MAX);
    rows.into_iter().skip(offset).take(limit).cloned().collect()
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: NewUser) -> Result<User, DatabaseError> {
        let mut tables = self.lock()?;
        if let Some(field) = tables.unique_conflict(&user.username, &user.email, None) {
            return Err(DatabaseError::UniqueViolation(field.to_string()));
        }

        tables.last_user_id += 1;
        let now = Utc::now();
        let created = User {
            id: tables.last_user_id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<User, DatabaseError> {
        self.lock()?
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound(format!("user {} not found", id)))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        Ok(self.lock()?.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        Ok(self.lock()?.users.values().find(|u| u.email == email).cloned())
    }

    async fn update_profile(&self, id: i64, profile: UserProfile) -> Result<User, DatabaseError> {
        let mut tables = self.lock()?;
        tables.user_mut(id)?;
        if let Some(field) = tables.unique_conflict(&profile.username, &profile.email, Some(id)) {
            return Err(DatabaseError::UniqueViolation(field.to_string()));
        }

        let user = tables.user_mut(id)?;
        user.username = profile.username;
        user.email = profile.email;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), DatabaseError> {
        let mut tables = self.lock()?;
        let user = tables.user_mut(id)?;
        user.password_hash = password_hash.to_string();
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn update_role(&self, id: i64, role: Role) -> Result<User, DatabaseError> {
        let mut tables = self.lock()?;
        let user = tables.user_mut(id)?;
        user.role = role;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), DatabaseError> {
        let mut tables = self.lock()?;
        if tables.users.remove(&id).is_none() {
            return Err(DatabaseError::NotFound(format!("user {} not found", id)));
        }
        tables.pets.retain(|_, pet| pet.owner_id != id);
        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> Result<Page<User>, DatabaseError> {
        let tables = self.lock()?;
        let rows: Vec<&User> = tables.users.values().rev().collect();
        let total = rows.len() as i64;
        Ok(Page {
            items: paginate(rows, pagination),
            total,
        })
    }
}

#[async_trait]
impl PetRepository for MemoryStore {
    async fn create(&self, pet: NewPet) -> Result<Pet, DatabaseError> {
        let mut tables = self.lock()?;
        if !tables.users.contains_key(&pet.owner_id) {
            return Err(DatabaseError::QueryError(format!(
                "owner {} does not exist",
                pet.owner_id
            )));
        }

        tables.last_pet_id += 1;
        let now = Utc::now();
        let created = Pet {
            id: tables.last_pet_id,
            name: pet.name,
            species: pet.species,
            price: pet.price,
            owner_id: pet.owner_id,
            created_at: now,
            updated_at: now,
        };
        tables.pets.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Pet, DatabaseError> {
        self.lock()?
            .pets
            .get(&id)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound(format!("pet {} not found", id)))
    }

    async fn update(&self, id: i64, scope: OwnerFilter, changes: PetChanges) -> Result<Pet, DatabaseError> {
        let mut tables = self.lock()?;
        let pet = tables
            .pets
            .get_mut(&id)
            .filter(|pet| scope.permits(pet.owner_id))
            .ok_or_else(|| DatabaseError::NotFound(format!("pet {} not found", id)))?;

        pet.name = changes.name;
        pet.species = changes.species;
        pet.price = changes.price;
        pet.updated_at = Utc::now();
        Ok(pet.clone())
    }

    async fn delete(&self, id: i64, scope: OwnerFilter) -> Result<(), DatabaseError> {
        let mut tables = self.lock()?;
        let visible = tables
            .pets
            .get(&id)
            .map(|pet| scope.permits(pet.owner_id))
            .unwrap_or(false);
        if !visible {
            return Err(DatabaseError::NotFound(format!("pet {} not found", id)));
        }
        tables.pets.remove(&id);
        Ok(())
    }

    async fn list(&self, query: &PetListQuery) -> Result<Page<Pet>, DatabaseError> {
        let tables = self.lock()?;
        let rows: Vec<&Pet> = tables
            .pets
            .values()
            .rev()
            .filter(|pet| query.owner.permits(pet.owner_id))
            .filter(|pet| query.species.as_deref().map_or(true, |s| pet.species == s))
            .collect();
        let total = rows.len() as i64;
        Ok(Page {
            items: paginate(rows, query.pagination),
            total,
        })
    }
}

#[async_trait]
impl HealthCheck for MemoryStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        self.lock().map(|_| ())
    }
}
