use async_trait::async_trait;
use sqlx::PgPool;

use crate::config::DatabaseConfig;
use crate::database::manager::{self, DatabaseError};
use crate::database::models::{NewPet, NewUser, Pet, PetChanges, Role, User, UserProfile, UserRow};
use crate::database::repository::{
    HealthCheck, OwnerFilter, Page, Pagination, PetListQuery, PetRepository, UserRepository,
};

const USER_COLUMNS: &str = "id, username, email, password_hash, role, created_at, updated_at";
const PET_COLUMNS: &str = "id, name, species, price, created_by AS owner_id, created_at, updated_at";

// `$n::BIGINT IS NULL` lets a single statement serve both scoped and unscoped callers.
const PET_FILTER: &str = "($1::BIGINT IS NULL OR created_by = $1) AND ($2::TEXT IS NULL OR species = $2)";

/// Postgres-backed store. Every call runs in its own transaction, which is
/// rolled back when dropped uncommitted.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        Ok(Self::new(manager::connect(config).await?))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn create(&self, user: NewUser) -> Result<User, DatabaseError> {
        let sql = format!(
            "INSERT INTO users (username, email, password_hash, role, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, NOW(), NOW()) RETURNING {}",
            USER_COLUMNS
        );

        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        row.try_into()
    }

    async fn find_by_id(&self, id: i64) -> Result<User, DatabaseError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => row.try_into(),
            None => Err(DatabaseError::NotFound(format!("user {} not found", id))),
        }
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn update_profile(&self, id: i64, profile: UserProfile) -> Result<User, DatabaseError> {
        let sql = format!(
            "UPDATE users SET username = $1, email = $2, updated_at = NOW() WHERE id = $3 RETURNING {}",
            USER_COLUMNS
        );

        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&profile.username)
            .bind(&profile.email)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let row = row.ok_or_else(|| DatabaseError::NotFound(format!("user {} not found", id)))?;
        tx.commit().await?;

        row.try_into()
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("user {} not found", id)));
        }
        tx.commit().await?;
        Ok(())
    }

    async fn update_role(&self, id: i64, role: Role) -> Result<User, DatabaseError> {
        let sql = format!(
            "UPDATE users SET role = $1, updated_at = NOW() WHERE id = $2 RETURNING {}",
            USER_COLUMNS
        );

        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(role.as_str())
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let row = row.ok_or_else(|| DatabaseError::NotFound(format!("user {} not found", id)))?;
        tx.commit().await?;

        row.try_into()
    }

    async fn delete(&self, id: i64) -> Result<(), DatabaseError> {
        // pets.created_by is ON DELETE CASCADE
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("user {} not found", id)));
        }
        tx.commit().await?;
        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> Result<Page<User>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM users ORDER BY id DESC LIMIT $1 OFFSET $2",
            USER_COLUMNS
        );

        let mut tx = self.pool.begin().await?;
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&mut *tx)
            .await?;
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(&mut *tx)
            .await?;
        tx.commit().await?;

        let items = rows
            .into_iter()
            .map(User::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page { items, total })
    }
}

#[async_trait]
impl PetRepository for PgStore {
    async fn create(&self, pet: NewPet) -> Result<Pet, DatabaseError> {
        let sql = format!(
            "INSERT INTO pets (name, species, price, created_by, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, NOW(), NOW()) RETURNING {}",
            PET_COLUMNS
        );

        let mut tx = self.pool.begin().await?;
        let created = sqlx::query_as::<_, Pet>(&sql)
            .bind(&pet.name)
            .bind(&pet.species)
            .bind(pet.price)
            .bind(pet.owner_id)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Pet, DatabaseError> {
        let sql = format!("SELECT {} FROM pets WHERE id = $1", PET_COLUMNS);
        sqlx::query_as::<_, Pet>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("pet {} not found", id)))
    }

    async fn update(&self, id: i64, scope: OwnerFilter, changes: PetChanges) -> Result<Pet, DatabaseError> {
        let sql = format!(
            "UPDATE pets SET name = $1, species = $2, price = $3, updated_at = NOW() \
             WHERE id = $4 AND ($5::BIGINT IS NULL OR created_by = $5) RETURNING {}",
            PET_COLUMNS
        );

        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query_as::<_, Pet>(&sql)
            .bind(&changes.name)
            .bind(&changes.species)
            .bind(changes.price)
            .bind(id)
            .bind(scope.owner_id())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("pet {} not found", id)))?;
        tx.commit().await?;
        Ok(updated)
    }

    async fn delete(&self, id: i64, scope: OwnerFilter) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM pets WHERE id = $1 AND ($2::BIGINT IS NULL OR created_by = $2)")
            .bind(id)
            .bind(scope.owner_id())
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("pet {} not found", id)));
        }
        tx.commit().await?;
        Ok(())
    }

    async fn list(&self, query: &PetListQuery) -> Result<Page<Pet>, DatabaseError> {
        let count_sql = format!("SELECT COUNT(*) FROM pets WHERE {}", PET_FILTER);
        let select_sql = format!(
            "SELECT {} FROM pets WHERE {} ORDER BY id DESC LIMIT $3 OFFSET $4",
            PET_COLUMNS, PET_FILTER
        );
        let owner = query.owner.owner_id();
        let species = query.species.as_deref();

        let mut tx = self.pool.begin().await?;
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(owner)
            .bind(species)
            .fetch_one(&mut *tx)
            .await?;
        let items = sqlx::query_as::<_, Pet>(&select_sql)
            .bind(owner)
            .bind(species)
            .bind(query.pagination.limit())
            .bind(query.pagination.offset())
            .fetch_all(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(Page { items, total })
    }
}

#[async_trait]
impl HealthCheck for PgStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
