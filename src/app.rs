use std::sync::Arc;

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::{CredentialStore, TokenService};
use crate::config::AppConfig;
use crate::database::models::Role;
use crate::database::{HealthCheck, PetRepository, UserRepository};
use crate::error::ApiError;
use crate::handlers::{protected, public};
use crate::middleware::{jwt_auth, log_requests, require_role, MetricsSink, RequestMetrics};
use crate::services::{PetService, UserService};

/// Everything a handler can reach. Cloned per request; all fields are shared.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserService>,
    pub pets: Arc<PetService>,
    pub tokens: Arc<TokenService>,
    pub metrics: Arc<dyn MetricsSink>,
    pub health: Arc<dyn HealthCheck>,
}

impl AppState {
    pub fn new<S>(
        store: Arc<S>,
        tokens: Arc<TokenService>,
        credentials: CredentialStore,
        config: &AppConfig,
    ) -> Self
    where
        S: UserRepository + PetRepository + HealthCheck + 'static,
    {
        let users = UserService::new(
            store.clone(),
            tokens.clone(),
            credentials,
            &config.security,
            config.api.clone(),
        );
        let pets = PetService::new(store.clone(), config.api.clone());

        Self {
            users: Arc::new(users),
            pets: Arc::new(pets),
            tokens,
            metrics: Arc::new(RequestMetrics::new()),
            health: store,
        }
    }
}

/// Assemble the full HTTP surface.
pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        // Public
        .route("/", get(public::root_get))
        .route("/health", get(public::health_get))
        .route("/metrics", get(public::metrics_get))
        .merge(public_auth_routes())
        // Protected
        .merge(protected_routes(&state))
        .fallback(route_not_found)
        // Global middleware, outermost first
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(cors_origins))
                .layer(from_fn_with_state(state.metrics.clone(), log_requests)),
        )
        .with_state(state)
}

fn public_auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/users/register", post(public::register_post))
        .route("/api/users/login", post(public::login_post))
}

fn protected_routes(state: &AppState) -> Router<AppState> {
    use protected::{auth, pets, users};

    let admin_only: Router<AppState> = Router::new()
        .route("/api/users", get(users::users_get))
        .route("/api/users/:id/role", patch(users::role_patch))
        .route_layer(from_fn_with_state(Role::Admin, require_role));

    Router::new()
        .route("/api/auth/refresh", post(auth::refresh_post))
        .route("/api/auth/whoami", get(auth::whoami_get))
        .route("/api/pets", get(pets::pets_get).post(pets::pets_post))
        .route(
            "/api/pets/:pet_id",
            get(pets::pet_get).put(pets::pet_put).delete(pets::pet_delete),
        )
        .route(
            "/api/users/:id",
            get(users::user_get).put(users::user_put).delete(users::user_delete),
        )
        .route("/api/users/:id/password", patch(users::password_patch))
        .merge(admin_only)
        .route_layer(from_fn_with_state(state.tokens.clone(), jwt_auth))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
}

async fn route_not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
