// handlers/protected/auth/mod.rs - Authenticated token endpoints

pub mod refresh; // POST /api/auth/refresh
pub mod whoami;  // GET /api/auth/whoami

pub use refresh::refresh_post;
pub use whoami::whoami_get;
