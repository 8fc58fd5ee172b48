use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("failed to hash password: {0}")]
    Hashing(String),

    #[error("password hashing task failed: {0}")]
    Task(String),
}

/// Salted bcrypt hashing with a fixed cost per store.
#[derive(Debug, Clone, Copy)]
pub struct CredentialStore {
    cost: u32,
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::with_cost(bcrypt::DEFAULT_COST)
    }

    pub fn with_cost(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    pub fn hash(&self, plain: &str) -> Result<String, CredentialError> {
        bcrypt::hash(plain, self.cost).map_err(|e| CredentialError::Hashing(e.to_string()))
    }

    /// A malformed stored hash never verifies.
    pub fn verify(&self, hash: &str, plain: &str) -> bool {
        match bcrypt::verify(plain, hash) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::warn!("stored password hash could not be checked: {}", e);
                false
            }
        }
    }

    /// `hash` off the async runtime's worker threads.
    pub async fn hash_blocking(&self, plain: &str) -> Result<String, CredentialError> {
        let store = *self;
        let plain = plain.to_owned();
        tokio::task::spawn_blocking(move || store.hash(&plain))
            .await
            .map_err(|e| CredentialError::Task(e.to_string()))?
    }

    pub async fn verify_blocking(&self, hash: &str, plain: &str) -> Result<bool, CredentialError> {
        let store = *self;
        let hash = hash.to_owned();
        let plain = plain.to_owned();
        tokio::task::spawn_blocking(move || store.verify(&hash, &plain))
            .await
            .map_err(|e| CredentialError::Task(e.to_string()))
    }
}
