//! Self-or-admin decisions.
//!
//! Every check here runs after the target has been loaded (so a missing target
//! is `NotFound`) and before any write is attempted.

use crate::auth::Identity;
use crate::database::models::{Pet, User};
use crate::database::OwnerFilter;
use crate::services::error::{ServiceError, ServiceResult};

/// A record with a single owning account.
pub trait OwnedResource {
    fn owner_id(&self) -> i64;
}

impl OwnedResource for Pet {
    fn owner_id(&self) -> i64 {
        self.owner_id
    }
}

impl OwnedResource for User {
    fn owner_id(&self) -> i64 {
        self.id
    }
}

/// Owner or admin may proceed.
pub fn ensure_owner_or_admin<R: OwnedResource>(caller: &Identity, resource: &R) -> ServiceResult<()> {
    if caller.is_admin() || resource.owner_id() == caller.user_id {
        Ok(())
    } else {
        Err(ServiceError::Forbidden("You do not have access to this resource".to_string()))
    }
}

/// Only the account itself may proceed; the admin role grants nothing here.
pub fn ensure_self(caller: &Identity, target_id: i64) -> ServiceResult<()> {
    if caller.user_id == target_id {
        Ok(())
    } else {
        Err(ServiceError::Forbidden("You can only modify your own account".to_string()))
    }
}

pub fn ensure_self_or_admin(caller: &Identity, target: &User) -> ServiceResult<()> {
    ensure_owner_or_admin(caller, target)
}

/// Owner scope applied to pet writes.
pub fn write_scope(caller: &Identity) -> OwnerFilter {
    if caller.is_admin() {
        OwnerFilter::All
    } else {
        OwnerFilter::Owner(caller.user_id)
    }
}

/// Owner scope for a pet listing.
///
/// Non-admin callers always see only their own pets, whatever `requested` says.
/// Admins may narrow to one owner; an absent or blank value means all owners.
pub fn list_scope(caller: &Identity, requested: Option<&str>) -> ServiceResult<OwnerFilter> {
    if !caller.is_admin() {
        return Ok(OwnerFilter::Owner(caller.user_id));
    }

    match requested.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(OwnerFilter::All),
        Some(raw) => raw
            .parse::<i64>()
            .map(OwnerFilter::Owner)
            .map_err(|_| ServiceError::field("owner_id", "owner_id must be a numeric user id")),
    }
}
