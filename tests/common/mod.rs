#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::{Client, Method, StatusCode};
use serde_json::{json, Value};
use tokio::task::JoinHandle;

use petstore_api::auth::{CredentialStore, TokenService};
use petstore_api::config::AppConfig;
use petstore_api::database::MemoryStore;
use petstore_api::{router, AppState};

pub const TEST_SECRET: &str = "integration-test-secret";
pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin-password";

/// An in-process server over a fresh in-memory store, bound to an ephemeral port.
pub struct TestServer {
    pub base_url: String,
    pub store: Arc<MemoryStore>,
    pub tokens: Arc<TokenService>,
    client: Client,
    handle: JoinHandle<()>,
}

/// Status plus parsed `{code, status, data}` envelope (Null for empty bodies).
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestResponse {
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    pub fn error_code(&self) -> Option<&str> {
        self.body["data"]["code"].as_str()
    }
}

pub fn test_config(extra: &[(&str, &str)]) -> Result<AppConfig> {
    let mut vars: HashMap<String, String> = [
        ("JWT_SECRET_KEY", TEST_SECRET),
        ("DATABASE_BACKEND", "memory"),
        ("TOKEN_EXPIRATION_HOURS", "1"),
        ("ADMIN_USERNAME", ADMIN_USERNAME),
        ("ADMIN_EMAIL", "admin@example.com"),
        ("ADMIN_PASSWORD", ADMIN_PASSWORD),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (k, v) in extra {
        vars.insert(k.to_string(), v.to_string());
    }

    AppConfig::from_lookup(|name| vars.get(name).cloned()).context("test config")
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        Self::start_with(&[]).await
    }

    pub async fn start_with(extra: &[(&str, &str)]) -> Result<Self> {
        let config = test_config(extra)?;
        let store = Arc::new(MemoryStore::new());
        let tokens = Arc::new(TokenService::new(&config.security.jwt_secret)?);
        let state = AppState::new(store.clone(), tokens.clone(), CredentialStore::with_cost(4), &config);

        if let Some(admin) = &config.admin {
            state.users.ensure_admin(admin).await?;
        }

        let app = router(state, &config.security.cors_origins);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .context("failed to bind test listener")?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            base_url: format!("http://{}", addr),
            store,
            tokens,
            client: Client::new(),
            handle,
        })
    }

    pub async fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<TestResponse> {
        let mut req = self.client.request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }

        let res = req.send().await?;
        let status = res.status();
        let bytes = res.bytes().await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).context("response body is not JSON")?
        };
        Ok(TestResponse { status, body })
    }

    pub async fn get(&self, path: &str, token: &str) -> Result<TestResponse> {
        self.request(Method::GET, path, Some(token), None).await
    }

    pub async fn post(&self, path: &str, token: &str, body: Value) -> Result<TestResponse> {
        self.request(Method::POST, path, Some(token), Some(body)).await
    }

    pub async fn put(&self, path: &str, token: &str, body: Value) -> Result<TestResponse> {
        self.request(Method::PUT, path, Some(token), Some(body)).await
    }

    pub async fn patch(&self, path: &str, token: &str, body: Value) -> Result<TestResponse> {
        self.request(Method::PATCH, path, Some(token), Some(body)).await
    }

    pub async fn delete(&self, path: &str, token: &str) -> Result<TestResponse> {
        self.request(Method::DELETE, path, Some(token), None).await
    }

    /// Register `username` with password `<username>-password`; returns (token, user id).
    pub async fn register(&self, username: &str) -> Result<(String, i64)> {
        let res = self
            .request(
                Method::POST,
                "/api/users/register",
                None,
                Some(json!({
                    "username": username,
                    "email": format!("{}@example.com", username),
                    "password": format!("{}-password", username),
                })),
            )
            .await?;
        anyhow::ensure!(res.status == StatusCode::CREATED, "register {} failed: {}", username, res.body);
        token_and_id(&res)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<TestResponse> {
        self.request(
            Method::POST,
            "/api/users/login",
            None,
            Some(json!({ "username": username, "password": password })),
        )
        .await
    }

    pub async fn admin_token(&self) -> Result<String> {
        let res = self.login(ADMIN_USERNAME, ADMIN_PASSWORD).await?;
        anyhow::ensure!(res.status == StatusCode::OK, "admin login failed: {}", res.body);
        Ok(token_and_id(&res)?.0)
    }

    pub async fn create_pet(&self, token: &str, name: &str, species: &str) -> Result<Value> {
        let res = self
            .post("/api/pets", token, json!({ "name": name, "species": species, "price": 25.5 }))
            .await?;
        anyhow::ensure!(res.status == StatusCode::CREATED, "create pet failed: {}", res.body);
        Ok(res.data().clone())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub fn token_and_id(res: &TestResponse) -> Result<(String, i64)> {
    let token = res.data()["token"]
        .as_str()
        .context("response has no token")?
        .to_string();
    let id = res.data()["user"]["id"].as_i64().context("response has no user id")?;
    Ok((token, id))
}
