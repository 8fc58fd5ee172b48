// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Security Level: None
// Middleware: request logging and CORS only

pub mod auth;
pub mod system;

pub use auth::*;
pub use system::{health_get, metrics_get, root_get};
