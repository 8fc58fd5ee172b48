use std::collections::HashMap;

use thiserror::Error;

use crate::auth::{CredentialError, TokenError};
use crate::database::DatabaseError;

/// Failure taxonomy shared by every domain operation.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{message}")]
    Validation {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// Never shown to clients; the HTTP layer logs it and answers generically.
    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut field_errors = HashMap::new();
        field_errors.insert(field.to_string(), message.clone());
        ServiceError::Validation { message, field_errors: Some(field_errors) }
    }
}

impl From<DatabaseError> for ServiceError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) => ServiceError::NotFound(msg),
            DatabaseError::UniqueViolation(field) => {
                ServiceError::Conflict(format!("{} already taken", field))
            }
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

impl From<TokenError> for ServiceError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid => ServiceError::Unauthorized("Invalid or expired token".to_string()),
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

impl From<CredentialError> for ServiceError {
    fn from(err: CredentialError) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field_errors: HashMap<String, String> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let message = errs
                    .first()
                    .and_then(|e| e.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| format!("Invalid value for {}", field));
                (field.to_string(), message)
            })
            .collect();

        ServiceError::Validation {
            message: "Validation failed".to_string(),
            field_errors: Some(field_errors),
        }
    }
}
