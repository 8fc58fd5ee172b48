// handlers/protected/auth/whoami.rs - GET /api/auth/whoami handler

use crate::auth::Identity;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// GET /api/auth/whoami - The identity carried by the presented token
pub async fn whoami_get(user: AuthUser) -> ApiResult<Identity> {
    Ok(ApiResponse::success(user.identity))
}
