/// Request and response bodies shared by handlers and services

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::Identity;
use crate::database::models::{Pet, UserResponse};
use crate::database::Page;

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50, message = "Username must be between 3 and 50 characters"))]
    pub username: String,

    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,

    #[validate(
        length(min = 8, message = "Password must be between 8 and 72 bytes"),
        custom(function = "validate_password_bytes", message = "Password must be between 8 and 72 bytes")
    )]
    pub password: String,
}

impl RegisterRequest {
    /// Surrounding whitespace is dropped before validation; the password is kept as sent.
    pub fn trimmed(self) -> Self {
        Self {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct UpdateUserRequest {
    #[validate(length(min = 3, max = 50, message = "Username must be between 3 and 50 characters"))]
    pub username: String,

    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,
}

impl UpdateUserRequest {
    pub fn trimmed(self) -> Self {
        Self {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub old_password: String,

    #[validate(
        length(min = 8, message = "Password must be between 8 and 72 bytes"),
        custom(function = "validate_password_bytes", message = "Password must be between 8 and 72 bytes")
    )]
    pub new_password: String,
}

/// bcrypt only reads the first 72 bytes of its input.
fn validate_password_bytes(password: &str) -> Result<(), validator::ValidationError> {
    if password.len() > 72 {
        return Err(validator::ValidationError::new("password_bytes"));
    }
    Ok(())
}

/// Role arrives as free text so an unknown value is a field error, not a JSON error.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct ChangeRoleRequest {
    #[validate(custom(function = "validate_role", message = "Role must be 'user' or 'admin'"))]
    pub role: String,
}

fn validate_role(role: &str) -> Result<(), validator::ValidationError> {
    match role {
        "user" | "admin" => Ok(()),
        _ => Err(validator::ValidationError::new("role")),
    }
}

/// Body for both pet create and pet replace.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct PetRequest {
    #[validate(length(min = 3, max = 100, message = "Name must be between 3 and 100 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 50, message = "Species must be between 1 and 50 characters"))]
    pub species: String,

    #[validate(required(message = "Price is required"), range(min = 0.0, message = "Price must not be negative"))]
    pub price: Option<f64>,
}

impl PetRequest {
    pub fn trimmed(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            species: self.species.trim().to_string(),
            price: self.price,
        }
    }
}

/// Raw pagination parameters; parsed leniently by `Pagination::parse`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PetListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub species: Option<String>,
    pub owner_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

/// Refresh answers with the identity signed into the new token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub token: String,
    pub user: Identity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub limit: i64,
    pub total: i64,
}

impl<T> ListResponse<T> {
    pub fn from_page(page: Page<T>, page_number: i64, limit: i64) -> Self {
        Self {
            items: page.items,
            page: page_number,
            limit,
            total: page.total,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

pub type PetList = ListResponse<Pet>;
pub type UserList = ListResponse<UserResponse>;
