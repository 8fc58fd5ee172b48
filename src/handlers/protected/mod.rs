// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Security Level: JWT Authentication Required
// Route Prefix: /api/*
// Middleware: jwt_auth on every route; require_role(admin) on the admin subset

pub mod auth;  // Token refresh and introspection
pub mod pets;  // Owner-scoped pet CRUD
pub mod users; // Account management

/*
The `AuthUser` extractor reads the identity `jwt_auth` attached to the request.
A handler mounted without that layer therefore answers 401 instead of running
anonymously.

Admin-only routes (GET /api/users, PATCH /api/users/:id/role) sit in their own
router with `require_role(Role::Admin)`; the services check the role again.
*/
