use std::sync::Arc;

use validator::Validate;

use crate::auth::{CredentialStore, Identity, TokenService};
use crate::config::{AdminBootstrap, ApiConfig, RefreshPolicy, SecurityConfig};
use crate::database::models::{NewUser, Role, UserProfile, UserResponse};
use crate::database::{DatabaseError, Pagination, UserRepository};
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::ownership::{ensure_self, ensure_self_or_admin};
use crate::types::{
    AuthResponse, ChangePasswordRequest, ChangeRoleRequest, LoginRequest, PageParams,
    RefreshResponse, RegisterRequest, UpdateUserRequest, UserList,
};

const BAD_CREDENTIALS: &str = "Invalid username or password";

/// Account lifecycle, login and token issuance.
pub struct UserService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<TokenService>,
    credentials: CredentialStore,
    token_ttl_hours: i64,
    refresh_policy: RefreshPolicy,
    api: ApiConfig,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        tokens: Arc<TokenService>,
        credentials: CredentialStore,
        security: &SecurityConfig,
        api: ApiConfig,
    ) -> Self {
        Self {
            users,
            tokens,
            credentials,
            token_ttl_hours: security.token_expiry_hours,
            refresh_policy: security.refresh_policy,
            api,
        }
    }

    /// New accounts always get the `user` role.
    pub async fn register(&self, request: RegisterRequest) -> ServiceResult<AuthResponse> {
        let request = request.trimmed();
        request.validate()?;
        let RegisterRequest { username, email, password } = request;

        // The store's unique constraints still catch a concurrent duplicate.
        self.ensure_available(&username, &email, None).await?;

        let password_hash = self.credentials.hash_blocking(&password).await?;
        let user = self
            .users
            .create(NewUser { username, email, password_hash, role: Role::User })
            .await?;

        let token = self.tokens.issue(&Identity::from(&user), self.token_ttl_hours)?;
        tracing::info!("registered user {} ({})", user.id, user.username);
        Ok(AuthResponse { token, user: user.into() })
    }

    /// Unknown usernames and wrong passwords are indistinguishable to the caller.
    pub async fn login(&self, request: LoginRequest) -> ServiceResult<AuthResponse> {
        request.validate()?;

        let user = match self.users.find_by_username(request.username.trim()).await? {
            Some(user) => user,
            None => {
                tracing::debug!("login for unknown user '{}'", request.username);
                return Err(ServiceError::Unauthorized(BAD_CREDENTIALS.to_string()));
            }
        };

        if !self.credentials.verify_blocking(&user.password_hash, &request.password).await? {
            tracing::debug!("wrong password for user {}", user.id);
            return Err(ServiceError::Unauthorized(BAD_CREDENTIALS.to_string()));
        }

        let token = self.tokens.issue(&Identity::from(&user), self.token_ttl_hours)?;
        Ok(AuthResponse { token, user: user.into() })
    }

    /// Issue a token with a fresh window. Under `ReloadAccount` the claims come
    /// from the stored account, so role changes and deletions take effect here.
    pub async fn refresh(&self, caller: &Identity, raw_token: &str) -> ServiceResult<RefreshResponse> {
        match self.refresh_policy {
            RefreshPolicy::ReloadAccount => {
                let user = self.users.find_by_id(caller.user_id).await.map_err(|e| match e {
                    DatabaseError::NotFound(_) => {
                        ServiceError::Unauthorized("Account no longer exists".to_string())
                    }
                    other => other.into(),
                })?;
                let identity = Identity::from(&user);
                let token = self.tokens.issue(&identity, self.token_ttl_hours)?;
                Ok(RefreshResponse { token, user: identity })
            }
            RefreshPolicy::TrustClaims => {
                let token = self.tokens.refresh(raw_token, self.token_ttl_hours)?;
                Ok(RefreshResponse { token, user: caller.clone() })
            }
        }
    }

    pub async fn get(&self, caller: &Identity, id: i64) -> ServiceResult<UserResponse> {
        let user = self.users.find_by_id(id).await?;
        ensure_self_or_admin(caller, &user)?;
        Ok(user.into())
    }

    pub async fn list(&self, caller: &Identity, params: PageParams) -> ServiceResult<UserList> {
        if !caller.is_admin() {
            return Err(ServiceError::Forbidden("Admin role required".to_string()));
        }

        let pagination = Pagination::parse(
            params.page.as_deref(),
            params.limit.as_deref(),
            self.api.default_page_limit,
            self.api.max_page_limit,
        );
        let page = self.users.list(pagination).await?;
        Ok(UserList {
            items: page.items.into_iter().map(UserResponse::from).collect(),
            page: pagination.page(),
            limit: pagination.limit(),
            total: page.total,
        })
    }

    pub async fn update(
        &self,
        caller: &Identity,
        id: i64,
        request: UpdateUserRequest,
    ) -> ServiceResult<UserResponse> {
        let request = request.trimmed();
        request.validate()?;
        self.users.find_by_id(id).await?;
        ensure_self(caller, id)?;

        let profile = UserProfile { username: request.username, email: request.email };
        self.ensure_available(&profile.username, &profile.email, Some(id)).await?;

        let user = self.users.update_profile(id, profile).await?;
        tracing::info!("user {} updated their profile", id);
        Ok(user.into())
    }

    /// A wrong current password fails with `Unauthorized` and leaves the hash untouched.
    pub async fn change_password(
        &self,
        caller: &Identity,
        id: i64,
        request: ChangePasswordRequest,
    ) -> ServiceResult<()> {
        request.validate()?;
        let user = self.users.find_by_id(id).await?;
        ensure_self(caller, id)?;

        if !self.credentials.verify_blocking(&user.password_hash, &request.old_password).await? {
            return Err(ServiceError::Unauthorized("Current password is incorrect".to_string()));
        }

        let password_hash = self.credentials.hash_blocking(&request.new_password).await?;
        self.users.update_password(id, &password_hash).await?;
        tracing::info!("user {} changed their password", id);
        Ok(())
    }

    /// Removes the account and every pet it owns.
    pub async fn delete(&self, caller: &Identity, id: i64) -> ServiceResult<()> {
        self.users.find_by_id(id).await?;
        ensure_self(caller, id)?;

        self.users.delete(id).await?;
        tracing::info!("user {} deleted their account", id);
        Ok(())
    }

    pub async fn change_role(
        &self,
        caller: &Identity,
        id: i64,
        request: ChangeRoleRequest,
    ) -> ServiceResult<UserResponse> {
        request.validate()?;
        let role: Role = request
            .role
            .parse()
            .map_err(|e: String| ServiceError::field("role", e))?;

        if !caller.is_admin() {
            return Err(ServiceError::Forbidden("Admin role required".to_string()));
        }
        self.users.find_by_id(id).await?;
        if caller.user_id == id && role != Role::Admin {
            return Err(ServiceError::Forbidden("Admins cannot demote themselves".to_string()));
        }

        let user = self.users.update_role(id, role).await?;
        tracing::info!("user {} set role of user {} to {}", caller.user_id, id, role);
        Ok(user.into())
    }

    /// Create the configured admin account unless the username already exists.
    /// An existing account under that name is left as it is.
    pub async fn ensure_admin(&self, bootstrap: &AdminBootstrap) -> ServiceResult<()> {
        let request = RegisterRequest {
            username: bootstrap.username.clone(),
            email: bootstrap.email.clone(),
            password: bootstrap.password.clone(),
        }
        .trimmed();
        request.validate()?;

        if let Some(existing) = self.users.find_by_username(&request.username).await? {
            if existing.role != Role::Admin {
                tracing::warn!(
                    "bootstrap admin '{}' exists without the admin role; leaving it unchanged",
                    request.username
                );
            }
            return Ok(());
        }

        let password_hash = self.credentials.hash_blocking(&request.password).await?;
        let user = self
            .users
            .create(NewUser {
                username: request.username,
                email: request.email,
                password_hash,
                role: Role::Admin,
            })
            .await?;
        tracing::info!("created bootstrap admin {} ({})", user.id, user.username);
        Ok(())
    }

    async fn ensure_available(&self, username: &str, email: &str, except: Option<i64>) -> ServiceResult<()> {
        if let Some(user) = self.users.find_by_username(username).await? {
            if Some(user.id) != except {
                return Err(ServiceError::Conflict("username already taken".to_string()));
            }
        }
        if let Some(user) = self.users.find_by_email(email).await? {
            if Some(user.id) != except {
                return Err(ServiceError::Conflict("email already taken".to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{TestContext, TEST_PASSWORD};
    use crate::types::PetRequest;

    fn register_request(name: &str) -> RegisterRequest {
        RegisterRequest {
            username: name.into(),
            email: format!("{}@example.com", name),
            password: "password123".into(),
        }
    }

    #[tokio::test]
    async fn register_issues_a_token_for_a_plain_user() {
        let ctx = TestContext::new();
        let auth = ctx.users.register(register_request("alice")).await.unwrap();

        assert_eq!(auth.user.role, Role::User);
        let identity = ctx.tokens.validate(&auth.token).unwrap();
        assert_eq!(identity.user_id, auth.user.id);
        assert_eq!(identity.username, "alice");
    }

    #[tokio::test]
    async fn padded_username_is_measured_after_trimming() {
        let ctx = TestContext::new();

        let short = RegisterRequest { username: " ab ".into(), ..register_request("alice") };
        match ctx.users.register(short).await {
            Err(ServiceError::Validation { field_errors: Some(fields), .. }) => {
                assert!(fields.contains_key("username"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }

        let blank = RegisterRequest { username: "     ".into(), ..register_request("alice") };
        assert!(matches!(ctx.users.register(blank).await, Err(ServiceError::Validation { .. })));

        let padded = RegisterRequest {
            username: "  alice ".into(),
            email: " alice@example.com ".into(),
            password: "password123".into(),
        };
        let auth = ctx.users.register(padded).await.unwrap();
        assert_eq!(auth.user.username, "alice");
        assert_eq!(auth.user.email, "alice@example.com");
    }

    #[tokio::test]
    async fn padded_profile_update_is_rejected() {
        let ctx = TestContext::new();
        let alice = ctx.user("alice", Role::User).await;

        let short = UpdateUserRequest { username: "  al  ".into(), email: "alice@example.com".into() };
        assert!(matches!(
            ctx.users.update(&alice, alice.user_id, short).await,
            Err(ServiceError::Validation { .. })
        ));
        assert_eq!(ctx.stored_user(alice.user_id).await.username, "alice");
    }

    #[tokio::test]
    async fn bootstrap_admin_name_is_validated_after_trimming() {
        let ctx = TestContext::new();
        let bootstrap = AdminBootstrap {
            username: " ad ".into(),
            email: "admin@example.com".into(),
            password: "admin-password".into(),
        };
        assert!(matches!(ctx.users.ensure_admin(&bootstrap).await, Err(ServiceError::Validation { .. })));

        let padded = AdminBootstrap { username: " admin ".into(), ..bootstrap };
        ctx.users.ensure_admin(&padded).await.unwrap();
        let admin = ctx.store.find_by_username("admin").await.unwrap().unwrap();
        assert_eq!(admin.role, Role::Admin);
    }

    #[tokio::test]
    async fn duplicate_username_or_email_conflicts() {
        let ctx = TestContext::new();
        ctx.users.register(register_request("alice")).await.unwrap();

        let same_name = RegisterRequest { email: "other@example.com".into(), ..register_request("alice") };
        assert!(matches!(ctx.users.register(same_name).await, Err(ServiceError::Conflict(_))));

        let same_email = RegisterRequest { username: "alicia".into(), ..register_request("alice") };
        assert!(matches!(ctx.users.register(same_email).await, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn login_hides_which_credential_was_wrong() {
        let ctx = TestContext::new();
        ctx.users.register(register_request("alice")).await.unwrap();

        let wrong_password = LoginRequest { username: "alice".into(), password: "nope-nope".into() };
        let unknown_user = LoginRequest { username: "mallory".into(), password: "password123".into() };

        let a = ctx.users.login(wrong_password).await.unwrap_err();
        let b = ctx.users.login(unknown_user).await.unwrap_err();
        assert_eq!(a.to_string(), b.to_string());
        assert!(matches!(a, ServiceError::Unauthorized(_)));

        let ok = LoginRequest { username: "alice".into(), password: "password123".into() };
        assert!(ctx.users.login(ok).await.is_ok());
    }

    #[tokio::test]
    async fn get_is_self_or_admin() {
        let ctx = TestContext::new();
        let alice = ctx.user("alice", Role::User).await;
        let bob = ctx.user("bob", Role::User).await;
        let admin = ctx.user("root", Role::Admin).await;

        assert!(ctx.users.get(&alice, alice.user_id).await.is_ok());
        assert!(ctx.users.get(&admin, alice.user_id).await.is_ok());
        assert!(matches!(ctx.users.get(&bob, alice.user_id).await, Err(ServiceError::Forbidden(_))));
        assert!(matches!(ctx.users.get(&bob, 999).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn profile_changes_are_strictly_self() {
        let ctx = TestContext::new();
        let alice = ctx.user("alice", Role::User).await;
        let admin = ctx.user("root", Role::Admin).await;

        let request = UpdateUserRequest { username: "alice2".into(), email: "alice2@example.com".into() };
        assert!(matches!(
            ctx.users.update(&admin, alice.user_id, request.clone()).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(ctx.users.delete(&admin, alice.user_id).await, Err(ServiceError::Forbidden(_))));

        let updated = ctx.users.update(&alice, alice.user_id, request).await.unwrap();
        assert_eq!(updated.username, "alice2");

        let taken = UpdateUserRequest { username: "root".into(), email: "alice2@example.com".into() };
        assert!(matches!(ctx.users.update(&alice, alice.user_id, taken).await, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn wrong_old_password_leaves_hash_unchanged() {
        let ctx = TestContext::new();
        let alice = ctx.user("alice", Role::User).await;
        let before = ctx.stored_user(alice.user_id).await.password_hash;

        let request = ChangePasswordRequest { old_password: "wrong-one".into(), new_password: "brand-new-pass".into() };
        assert!(matches!(
            ctx.users.change_password(&alice, alice.user_id, request).await,
            Err(ServiceError::Unauthorized(_))
        ));
        let after = ctx.stored_user(alice.user_id).await.password_hash;
        assert_eq!(before, after);

        let request = ChangePasswordRequest { old_password: TEST_PASSWORD.into(), new_password: "brand-new-pass".into() };
        ctx.users.change_password(&alice, alice.user_id, request).await.unwrap();
        let login = LoginRequest { username: "alice".into(), password: "brand-new-pass".into() };
        assert!(ctx.users.login(login).await.is_ok());
    }

    #[tokio::test]
    async fn delete_removes_owned_pets() {
        let ctx = TestContext::new();
        let alice = ctx.user("alice", Role::User).await;
        let admin = ctx.user("root", Role::Admin).await;
        let pet = PetRequest { name: "Rex".into(), species: "dog".into(), price: Some(1.0) };
        let pet = ctx.pets.create(&alice, pet).await.unwrap();

        ctx.users.delete(&alice, alice.user_id).await.unwrap();
        assert!(matches!(ctx.pets.get(&admin, pet.id).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn role_changes_need_admin_and_no_self_demotion() {
        let ctx = TestContext::new();
        let alice = ctx.user("alice", Role::User).await;
        let admin = ctx.user("root", Role::Admin).await;
        let promote = ChangeRoleRequest { role: "admin".into() };
        let demote = ChangeRoleRequest { role: "user".into() };

        assert!(matches!(
            ctx.users.change_role(&alice, alice.user_id, promote.clone()).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            ctx.users.change_role(&admin, admin.user_id, demote.clone()).await,
            Err(ServiceError::Forbidden(_))
        ));

        let promoted = ctx.users.change_role(&admin, alice.user_id, promote).await.unwrap();
        assert_eq!(promoted.role, Role::Admin);
        let demoted = ctx.users.change_role(&admin, alice.user_id, demote).await.unwrap();
        assert_eq!(demoted.role, Role::User);
    }

    #[tokio::test]
    async fn refresh_reloads_the_current_role() {
        let ctx = TestContext::new();
        let alice = ctx.user("alice", Role::User).await;
        let admin = ctx.user("root", Role::Admin).await;
        let token = ctx.tokens.issue(&alice, 1).unwrap();

        ctx.users
            .change_role(&admin, alice.user_id, ChangeRoleRequest { role: "admin".into() })
            .await
            .unwrap();

        let refreshed = ctx.users.refresh(&alice, &token).await.unwrap();
        assert_eq!(refreshed.user.role, Role::Admin);
        assert_eq!(ctx.tokens.validate(&refreshed.token).unwrap().role, Role::Admin);
    }

    #[tokio::test]
    async fn refresh_fails_once_the_account_is_gone() {
        let ctx = TestContext::new();
        let alice = ctx.user("alice", Role::User).await;
        let token = ctx.tokens.issue(&alice, 1).unwrap();
        ctx.users.delete(&alice, alice.user_id).await.unwrap();

        assert!(matches!(ctx.users.refresh(&alice, &token).await, Err(ServiceError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn trusted_refresh_keeps_token_claims() {
        let ctx = TestContext::with_refresh_policy(RefreshPolicy::TrustClaims);
        let alice = ctx.user("alice", Role::User).await;
        let token = ctx.tokens.issue(&alice, 1).unwrap();
        ctx.users.delete(&alice, alice.user_id).await.unwrap();

        let refreshed = ctx.users.refresh(&alice, &token).await.unwrap();
        assert_eq!(ctx.tokens.validate(&refreshed.token).unwrap(), alice);
    }

    #[tokio::test]
    async fn list_is_admin_only() {
        let ctx = TestContext::new();
        let alice = ctx.user("alice", Role::User).await;
        let admin = ctx.user("root", Role::Admin).await;

        assert!(matches!(ctx.users.list(&alice, PageParams::default()).await, Err(ServiceError::Forbidden(_))));
        let list = ctx.users.list(&admin, PageParams::default()).await.unwrap();
        assert_eq!(list.total, 2);
        assert_eq!(list.items[0].id, admin.user_id);
    }

    #[tokio::test]
    async fn ensure_admin_is_idempotent() {
        let ctx = TestContext::new();
        let bootstrap = AdminBootstrap {
            username: "admin".into(),
            email: "admin@example.com".into(),
            password: "admin-password".into(),
        };

        ctx.users.ensure_admin(&bootstrap).await.unwrap();
        ctx.users.ensure_admin(&bootstrap).await.unwrap();

        let admin = ctx.store.find_by_username("admin").await.unwrap().unwrap();
        assert_eq!(admin.role, Role::Admin);
        let list = ctx.users.list(&Identity::from(&admin), PageParams::default()).await.unwrap();
        assert_eq!(list.total, 1);
    }
}
