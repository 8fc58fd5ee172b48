// handlers/protected/users/mod.rs - Account endpoints

pub mod collection; // GET /api/users (admin)
pub mod password;   // PATCH /api/users/:id/password
pub mod record;     // GET, PUT, DELETE /api/users/:id
pub mod role;       // PATCH /api/users/:id/role (admin)

pub use collection::users_get;
pub use password::password_patch;
pub use record::{user_delete, user_get, user_put};
pub use role::role_patch;
