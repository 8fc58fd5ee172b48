pub mod error;
pub mod ownership;
pub mod pet_service;
pub mod user_service;

pub use error::{ServiceError, ServiceResult};
pub use pet_service::PetService;
pub use user_service::UserService;

/*
Services hold the domain rules between the HTTP handlers and the store.

Every operation receives the caller's `Identity` as an explicit argument, taken
from the `AuthUser` extractor by the handler. Checks run in a fixed order:

  1. structural validation of the request body
  2. load the target record (missing -> NotFound)
  3. ownership decision from `ownership` (denied -> Forbidden)
  4. the store write, scoped by `ownership::write_scope`

Pets follow the self-or-admin rule. Account changes (profile, password,
delete) are strictly self. Reading an account is self-or-admin, listing
accounts and changing roles are admin only.
*/
