mod common;

use anyhow::Result;
use reqwest::{Method, StatusCode};
use serde_json::json;

use common::{token_and_id, TestServer};

#[tokio::test]
async fn health_and_banner_are_public() -> Result<()> {
    let server = TestServer::start().await?;

    let res = server.request(Method::GET, "/health", None, None).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["code"], 200);
    assert_eq!(res.body["status"], "OK");
    assert_eq!(res.data()["status"], "ok");

    let res = server.request(Method::GET, "/", None, None).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["name"], "petstore-api");
    Ok(())
}

#[tokio::test]
async fn register_then_login() -> Result<()> {
    let server = TestServer::start().await?;

    let res = server
        .request(
            Method::POST,
            "/api/users/register",
            None,
            Some(json!({ "username": "alice", "email": "alice@example.com", "password": "password123" })),
        )
        .await?;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["code"], 201);
    assert_eq!(res.data()["user"]["username"], "alice");
    assert_eq!(res.data()["user"]["role"], "user");
    assert!(res.data()["user"].get("password_hash").is_none());
    let (token, id) = token_and_id(&res)?;
    assert_eq!(server.tokens.validate(&token)?.user_id, id);

    let res = server.login("alice", "password123").await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(token_and_id(&res)?.1, id);

    let res = server.login("alice", "wrong-password").await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.error_code(), Some("UNAUTHORIZED"));
    let wrong_password_message = res.data()["error"].clone();

    let res = server.login("nobody", "password123").await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.data()["error"], wrong_password_message);
    Ok(())
}

#[tokio::test]
async fn register_never_grants_admin() -> Result<()> {
    let server = TestServer::start().await?;

    let res = server
        .request(
            Method::POST,
            "/api/users/register",
            None,
            Some(json!({
                "username": "mallory",
                "email": "mallory@example.com",
                "password": "password123",
                "role": "admin"
            })),
        )
        .await?;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.data()["user"]["role"], "user");

    let (token, _) = token_and_id(&res)?;
    let res = server.get("/api/users", &token).await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn register_validates_and_rejects_duplicates() -> Result<()> {
    let server = TestServer::start().await?;
    server.register("alice").await?;

    let res = server
        .request(
            Method::POST,
            "/api/users/register",
            None,
            Some(json!({ "username": "al", "email": "nope", "password": "short" })),
        )
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.error_code(), Some("VALIDATION_ERROR"));
    let fields = &res.data()["field_errors"];
    assert!(fields.get("username").is_some());
    assert!(fields.get("email").is_some());
    assert!(fields.get("password").is_some());

    let res = server
        .request(
            Method::POST,
            "/api/users/register",
            None,
            Some(json!({ "username": "alice", "email": "fresh@example.com", "password": "password123" })),
        )
        .await?;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.error_code(), Some("CONFLICT"));
    Ok(())
}

#[tokio::test]
async fn padded_registration_fields_are_trimmed_before_validation() -> Result<()> {
    let server = TestServer::start().await?;

    let res = server
        .request(
            Method::POST,
            "/api/users/register",
            None,
            Some(json!({ "username": " ab ", "email": "ab@example.com", "password": "password123" })),
        )
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.data()["field_errors"].get("username").is_some());

    // 40 two-byte characters exceed bcrypt's 72-byte input
    let res = server
        .request(
            Method::POST,
            "/api/users/register",
            None,
            Some(json!({ "username": "wide", "email": "wide@example.com", "password": "é".repeat(40) })),
        )
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.data()["field_errors"].get("password").is_some());

    let res = server
        .request(
            Method::POST,
            "/api/users/register",
            None,
            Some(json!({ "username": "  carol ", "email": " carol@example.com ", "password": "password123" })),
        )
        .await?;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.data()["user"]["username"], "carol");

    let res = server.login("carol", "password123").await?;
    assert_eq!(res.status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn malformed_json_uses_the_envelope() -> Result<()> {
    let server = TestServer::start().await?;

    let res = reqwest::Client::new()
        .post(format!("{}/api/users/login", server.base_url))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await?;
    assert_eq!(body["data"]["code"], "INVALID_JSON");
    Ok(())
}

#[tokio::test]
async fn concurrent_duplicate_registration_yields_one_conflict() -> Result<()> {
    let server = TestServer::start().await?;
    let body = json!({ "username": "twin", "email": "twin@example.com", "password": "password123" });

    let (a, b) = tokio::join!(
        server.request(Method::POST, "/api/users/register", None, Some(body.clone())),
        server.request(Method::POST, "/api/users/register", None, Some(body.clone())),
    );
    let mut statuses = vec![a?.status, b?.status];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::CREATED, StatusCode::CONFLICT]);
    Ok(())
}

#[tokio::test]
async fn protected_routes_require_a_bearer_token() -> Result<()> {
    let server = TestServer::start().await?;
    let (token, _) = server.register("alice").await?;

    let res = server.request(Method::GET, "/api/pets", None, None).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.error_code(), Some("UNAUTHORIZED"));

    for header in [token.clone(), format!("Basic {}", token), format!("Bearer  {}", token)] {
        let res = reqwest::Client::new()
            .get(format!("{}/api/pets", server.base_url))
            .header("authorization", header)
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    let res = reqwest::Client::new()
        .get(format!("{}/api/pets", server.base_url))
        .header("authorization", format!("bearer {}", token))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = server.get("/api/pets", "not.a.token").await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn whoami_and_refresh() -> Result<()> {
    let server = TestServer::start().await?;
    let (token, id) = server.register("alice").await?;

    let res = server.get("/api/auth/whoami", &token).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["user_id"], id);
    assert_eq!(res.data()["role"], "user");

    let res = server.post("/api/auth/refresh", &token, json!({})).await?;
    assert_eq!(res.status, StatusCode::OK);
    let refreshed = res.data()["token"].as_str().unwrap_or_default().to_string();
    assert_eq!(server.tokens.validate(&refreshed)?.user_id, id);
    Ok(())
}

#[tokio::test]
async fn refresh_picks_up_role_changes() -> Result<()> {
    let server = TestServer::start().await?;
    let (token, id) = server.register("alice").await?;
    let admin = server.admin_token().await?;

    let res = server
        .patch(&format!("/api/users/{}/role", id), &admin, json!({ "role": "admin" }))
        .await?;
    assert_eq!(res.status, StatusCode::OK);

    // The old token still says "user" until refreshed.
    assert_eq!(server.get("/api/users", &token).await?.status, StatusCode::FORBIDDEN);

    let res = server.post("/api/auth/refresh", &token, json!({})).await?;
    assert_eq!(res.data()["user"]["role"], "admin");
    let refreshed = res.data()["token"].as_str().unwrap_or_default().to_string();
    assert_eq!(server.get("/api/users", &refreshed).await?.status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn tokens_survive_account_deletion_but_refresh_does_not() -> Result<()> {
    let server = TestServer::start().await?;
    let (token, id) = server.register("alice").await?;

    let res = server.delete(&format!("/api/users/{}", id), &token).await?;
    assert_eq!(res.status, StatusCode::NO_CONTENT);

    // Stateless: the token itself is still valid.
    assert_eq!(server.get("/api/auth/whoami", &token).await?.status, StatusCode::OK);

    let res = server.post("/api/auth/refresh", &token, json!({})).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn metrics_count_requests_by_route() -> Result<()> {
    let server = TestServer::start().await?;
    let (token, _) = server.register("alice").await?;
    server.get("/api/pets/1", &token).await?;
    server.get("/api/pets/2", &token).await?;

    let res = server.request(Method::GET, "/metrics", None, None).await?;
    assert_eq!(res.status, StatusCode::OK);
    let per_path = &res.data()["per_path"];
    assert_eq!(per_path["/api/pets/:pet_id"], 2);
    assert_eq!(per_path["/api/users/register"], 1);
    assert!(res.data()["errors_total"].as_u64().unwrap_or_default() >= 2);
    Ok(())
}
