pub mod password;
pub mod token;

pub use password::{CredentialError, CredentialStore};
pub use token::{Claims, Clock, Identity, SystemClock, TokenError, TokenService, TOKEN_ISSUER};
