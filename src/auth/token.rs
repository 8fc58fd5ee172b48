use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::DEFAULT_TOKEN_EXPIRY_HOURS;
use crate::database::models::{Role, User};

pub const TOKEN_ISSUER: &str = "petstore-api";

/// The only algorithm tokens are signed with or accepted under.
const TOKEN_ALGORITHM: Algorithm = Algorithm::HS256;

/// Source of the current time for issuing and checking token windows.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub email: String,
    pub username: String,
    pub role: Role,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub iss: String,
}

/// The authenticated principal a valid token speaks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: i64,
    pub email: String,
    pub username: String,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            role: user.role,
        }
    }
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            email: claims.email,
            username: claims.username,
            role: claims.role,
        }
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token signing secret is not configured")]
    Configuration,

    /// Structural, signature, algorithm and time-window failures all collapse here.
    #[error("invalid or expired token")]
    Invalid,

    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Issues and validates stateless HS256 identity tokens.
///
/// Nothing is stored server side: a token is valid iff its signature verifies
/// under the configured secret and the clock reads inside `[nbf, exp]`. Tokens
/// cannot be revoked; they outlive password changes and account deletion until
/// they expire.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    pub fn new(secret: &str) -> Result<Self, TokenError> {
        Self::with_clock(secret, Arc::new(SystemClock))
    }

    pub fn with_clock(secret: &str, clock: Arc<dyn Clock>) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::Configuration);
        }

        // Window checks happen against `clock`, not the library's wall clock.
        let mut validation = Validation::new(TOKEN_ALGORITHM);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "nbf", "iss"]);
        validation.set_issuer(&[TOKEN_ISSUER]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            clock,
        })
    }

    /// Sign a token for `identity` valid from now for `ttl_hours`
    /// (non-positive values mean the 24 hour default).
    pub fn issue(&self, identity: &Identity, ttl_hours: i64) -> Result<String, TokenError> {
        let ttl_hours = if ttl_hours <= 0 {
            DEFAULT_TOKEN_EXPIRY_HOURS
        } else {
            ttl_hours
        };
        let now = self.clock.now();
        let expires_at = Duration::try_hours(ttl_hours)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| {
                TokenError::Signing(format!("token lifetime of {} hours is out of range", ttl_hours))
            })?;

        let claims = Claims {
            user_id: identity.user_id,
            email: identity.email.clone(),
            username: identity.username.clone(),
            role: identity.role,
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expires_at.timestamp(),
            iss: TOKEN_ISSUER.to_string(),
        };

        encode(&Header::new(TOKEN_ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    pub fn validate(&self, token: &str) -> Result<Identity, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            tracing::debug!("token rejected: {}", e);
            TokenError::Invalid
        })?;

        let claims = data.claims;
        let now = self.clock.now().timestamp();
        if now < claims.nbf || now > claims.exp {
            tracing::debug!(
                "token for user {} outside its window (nbf={}, exp={}, now={})",
                claims.user_id, claims.nbf, claims.exp, now
            );
            return Err(TokenError::Invalid);
        }

        Ok(claims.into())
    }

    /// Validate `token` and re-sign its claims with a fresh window. The claims
    /// are trusted as-is; no account lookup happens here.
    pub fn refresh(&self, token: &str, ttl_hours: i64) -> Result<String, TokenError> {
        let identity = self.validate(token)?;
        self.issue(&identity, ttl_hours)
    }
}
