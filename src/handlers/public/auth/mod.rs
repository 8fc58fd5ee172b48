// handlers/public/auth/mod.rs - Token acquisition endpoints

pub mod login;    // POST /api/users/login
pub mod register; // POST /api/users/register

pub use login::login_post;
pub use register::register_post;
