use async_trait::async_trait;

use crate::database::manager::DatabaseError;
use crate::database::models::{NewPet, NewUser, Pet, PetChanges, Role, User, UserProfile};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;

/// Which owners a pet query or write may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerFilter {
    /// No owner restriction. Only ever produced for admin callers.
    All,
    Owner(i64),
}

impl OwnerFilter {
    pub fn owner_id(&self) -> Option<i64> {
        match self {
            OwnerFilter::All => None,
            OwnerFilter::Owner(id) => Some(*id),
        }
    }

    pub fn permits(&self, owner_id: i64) -> bool {
        match self {
            OwnerFilter::All => true,
            OwnerFilter::Owner(id) => *id == owner_id,
        }
    }
}

/// Normalized page/limit pair: page >= 1, 1 <= limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: i64,
    limit: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page: if page <= 0 { DEFAULT_PAGE } else { page },
            limit: if limit <= 0 { DEFAULT_LIMIT } else { limit },
        }
    }

    /// Parse raw query values. Missing, unparsable or non-positive values take the
    /// defaults; limits above `max_limit` are clamped.
    pub fn parse(page: Option<&str>, limit: Option<&str>, default_limit: i64, max_limit: i64) -> Self {
        let page = page
            .and_then(|p| p.trim().parse::<i64>().ok())
            .filter(|p| *p > 0)
            .unwrap_or(DEFAULT_PAGE);
        let default_limit = if default_limit <= 0 { DEFAULT_LIMIT } else { default_limit };
        let limit = limit
            .and_then(|l| l.trim().parse::<i64>().ok())
            .filter(|l| *l > 0)
            .unwrap_or(default_limit)
            .min(max_limit.max(1));
        Self { page, limit }
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE, DEFAULT_LIMIT)
    }
}

#[derive(Debug, Clone)]
pub struct PetListQuery {
    pub owner: OwnerFilter,
    pub pagination: Pagination,
    /// Exact species match; `None` means any species.
    pub species: Option<String>,
}

/// One page of results plus the number of rows matching before pagination.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account. Duplicate username or email yields `UniqueViolation`.
    async fn create(&self, user: NewUser) -> Result<User, DatabaseError>;

    async fn find_by_id(&self, id: i64) -> Result<User, DatabaseError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;

    async fn update_profile(&self, id: i64, profile: UserProfile) -> Result<User, DatabaseError>;

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), DatabaseError>;

    async fn update_role(&self, id: i64, role: Role) -> Result<User, DatabaseError>;

    /// Remove the account together with the pets it owns.
    async fn delete(&self, id: i64) -> Result<(), DatabaseError>;

    async fn list(&self, pagination: Pagination) -> Result<Page<User>, DatabaseError>;
}

#[async_trait]
pub trait PetRepository: Send + Sync {
    async fn create(&self, pet: NewPet) -> Result<Pet, DatabaseError>;

    async fn find_by_id(&self, id: i64) -> Result<Pet, DatabaseError>;

    /// Update a pet visible under `scope`; a pet outside the scope is `NotFound`.
    async fn update(&self, id: i64, scope: OwnerFilter, changes: PetChanges) -> Result<Pet, DatabaseError>;

    async fn delete(&self, id: i64, scope: OwnerFilter) -> Result<(), DatabaseError>;

    /// Newest first by id.
    async fn list(&self, query: &PetListQuery) -> Result<Page<Pet>, DatabaseError>;
}

#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn ping(&self) -> Result<(), DatabaseError>;
}
