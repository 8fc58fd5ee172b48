//! Fixtures for service-level unit tests.

use std::sync::Arc;

use chrono::Utc;

use crate::auth::{CredentialStore, Identity, TokenService};
use crate::config::{ApiConfig, RefreshPolicy, SecurityConfig};
use crate::database::models::{NewUser, Pet, Role, User};
use crate::database::{MemoryStore, UserRepository};
use crate::services::{PetService, UserService};

pub const TEST_SECRET: &str = "test-secret";
pub const TEST_PASSWORD: &str = "password123";

pub fn identity(user_id: i64, role: Role) -> Identity {
    Identity {
        user_id,
        email: format!("user{}@example.com", user_id),
        username: format!("user{}", user_id),
        role,
    }
}

pub fn pet_owned_by(owner_id: i64) -> Pet {
    let now = Utc::now();
    Pet {
        id: 1,
        name: "Rex".to_string(),
        species: "dog".to_string(),
        price: 10.0,
        owner_id,
        created_at: now,
        updated_at: now,
    }
}

/// Both services wired over one fresh in-memory store.
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub tokens: Arc<TokenService>,
    pub credentials: CredentialStore,
    pub users: UserService,
    pub pets: PetService,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_refresh_policy(RefreshPolicy::ReloadAccount)
    }

    pub fn with_refresh_policy(refresh_policy: RefreshPolicy) -> Self {
        let store = Arc::new(MemoryStore::new());
        let tokens = Arc::new(TokenService::new(TEST_SECRET).expect("test secret is non-empty"));
        let credentials = CredentialStore::with_cost(4);
        let security = SecurityConfig {
            jwt_secret: TEST_SECRET.to_string(),
            token_expiry_hours: 1,
            refresh_policy,
            cors_origins: Vec::new(),
        };
        let api = ApiConfig { default_page_limit: 10, max_page_limit: 100 };

        Self {
            users: UserService::new(store.clone(), tokens.clone(), credentials, &security, api.clone()),
            pets: PetService::new(store.clone(), api),
            store,
            tokens,
            credentials,
        }
    }

    /// Insert an account with `TEST_PASSWORD` directly, bypassing registration rules.
    pub async fn user(&self, username: &str, role: Role) -> Identity {
        let password_hash = self.credentials.hash(TEST_PASSWORD).expect("hash test password");
        let user = UserRepository::create(
            &*self.store,
            NewUser {
                username: username.to_string(),
                email: format!("{}@example.com", username),
                password_hash,
                role,
            },
        )
        .await
        .expect("create test user");
        Identity::from(&user)
    }

    pub async fn stored_user(&self, id: i64) -> User {
        UserRepository::find_by_id(&*self.store, id).await.expect("stored user")
    }
}
