//! HTTP routing, auth and status mapping against the in-memory store

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use simplebank::account::{AccountRepository, MemoryAccountRepository};
use simplebank::credentials::{CredentialHasher, HashingConfig};
use simplebank::gateway::{build_router, state::AppState};
use simplebank::service::{BankService, CreateAccountRequest};
use simplebank::session::{SessionConfig, TOKEN_HEADER, TokenService};
use simplebank::transfer::TransferEngine;

struct TestApp {
    router: Router,
    bank: Arc<BankService>,
}

fn test_app() -> TestApp {
    let repo: Arc<dyn AccountRepository> = Arc::new(MemoryAccountRepository::new());
    let hasher = CredentialHasher::new(HashingConfig {
        memory_kib: 8,
        iterations: 1,
        parallelism: 1,
    })
    .unwrap();
    let tokens = Arc::new(
        TokenService::new(&SessionConfig {
            jwt_secret: "gateway-test-secret".to_string(),
            token_ttl_secs: 600,
        })
        .unwrap(),
    );
    let bank = Arc::new(
        BankService::new(repo.clone(), hasher, tokens, TransferEngine::new(repo)).unwrap(),
    );
    let router = build_router(Arc::new(AppState::new(bank.clone(), None)));
    TestApp { router, bank }
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    /// Account with a balance, plus a token for it
    async fn funded(&self, first: &str, balance: i64) -> (i64, i64, String) {
        let view = self
            .bank
            .open_account(
                CreateAccountRequest {
                    first_name: first.to_string(),
                    last_name: "test".to_string(),
                    password: "pw".to_string(),
                },
                balance,
            )
            .await
            .unwrap();
        let login = self.bank.authenticate(view.number, "pw").await.unwrap();
        (view.id, view.number, login.token)
    }
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn authed(method: &str, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token));
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = test_app();
    let (status, body) = app.send(get("/api/v1/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], 0);
    assert!(body["data"]["timestamp_ms"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn test_create_then_list_without_credentials() {
    let app = test_app();
    let (status, body) = app
        .send(json_request(
            "POST",
            "/api/v1/account",
            json!({"firstName": "abhi", "lastName": "anand", "password": "siuu"}),
        ))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    let data = &body["data"];
    assert_eq!(data["firstName"], "abhi");
    assert_eq!(data["balance"], 0);
    assert!(data.get("encryptedPassword").is_none());
    assert!(data.get("password").is_none());
    let number = data["number"].as_i64().unwrap();
    assert!((1_000_000_000_000..10_000_000_000_000).contains(&number));

    let (status, body) = app.send(get("/api/v1/account")).await;
    assert_eq!(status, StatusCode::OK);
    let list = body["data"].as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["number"], number);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let app = test_app();
    let (status, body) = app
        .send(json_request(
            "POST",
            "/api/v1/account",
            json!({"firstName": "abhi"}),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 1001);

    let (status, _) = app
        .send(json_request(
            "POST",
            "/api/v1/account",
            json!({"firstName": "", "lastName": "x", "password": "pw"}),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login() {
    let app = test_app();
    let (_, number, _) = app.funded("abhi", 0).await;

    let (status, body) = app
        .send(json_request(
            "POST",
            "/api/v1/login",
            json!({"number": number, "password": "pw"}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["number"], number);
    assert!(body["data"]["token"].as_str().unwrap().split('.').count() == 3);

    let (status, body) = app
        .send(json_request(
            "POST",
            "/api/v1/login",
            json!({"number": number, "password": "wrong"}),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 2002);

    let (status, _) = app
        .send(json_request(
            "POST",
            "/api/v1/login",
            json!({"number": 1, "password": "pw"}),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = test_app();
    let (id, _, token) = app.funded("abhi", 0).await;
    let uri = format!("/api/v1/account/{}", id);

    let (status, body) = app.send(get(&uri)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 2001);

    let (status, body) = app.send(authed("GET", &uri, "not.a.token", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 2002);

    let (status, body) = app.send(authed("GET", &uri, &token, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], id);

    let alternate = Request::builder()
        .uri(&uri)
        .header(TOKEN_HEADER, token.as_str())
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.send(alternate).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(json_request(
            "POST",
            "/api/v1/transfer",
            json!({"toAccount": 1, "amount": 1}),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_non_bearer_authorization_uses_alternate_header() {
    let app = test_app();
    let (id, _, token) = app.funded("abhi", 0).await;
    let uri = format!("/api/v1/account/{}", id);

    let request = Request::builder()
        .uri(&uri)
        .header(header::AUTHORIZATION, "Basic dXNlcjpwdw==")
        .header(TOKEN_HEADER, token.as_str())
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], id);

    let request = Request::builder()
        .uri(&uri)
        .header(header::AUTHORIZATION, "Basic dXNlcjpwdw==")
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 2002);
}

#[tokio::test]
async fn test_bad_path_id() {
    let app = test_app();
    let (_, _, token) = app.funded("abhi", 0).await;
    let (status, _) = app
        .send(authed("GET", "/api/v1/account/abc", &token, None))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_transfer_status_mapping() {
    let app = test_app();
    let (payer_id, payer, token) = app.funded("payer", 100).await;
    let (payee_id, payee, _) = app.funded("payee", 0).await;

    let (status, body) = app
        .send(authed(
            "POST",
            "/api/v1/transfer",
            &token,
            Some(json!({"toAccount": payee, "amount": 60})),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["fromAccount"], payer);
    assert_eq!(body["data"]["amount"], 60);
    assert_eq!(app.bank.get_account(payer_id).await.unwrap().balance, 40);
    assert_eq!(app.bank.get_account(payee_id).await.unwrap().balance, 60);

    let cases = [
        (json!({"toAccount": payee, "amount": 41}), StatusCode::CONFLICT),
        (json!({"toAccount": payee, "amount": 0}), StatusCode::BAD_REQUEST),
        (json!({"toAccount": payee, "amount": -5}), StatusCode::BAD_REQUEST),
        (json!({"toAccount": payer, "amount": 1}), StatusCode::BAD_REQUEST),
        (json!({"toAccount": 42, "amount": 1}), StatusCode::NOT_FOUND),
        (json!({"toAccount": payee}), StatusCode::BAD_REQUEST),
    ];
    for (body, expected) in cases {
        let (status, _) = app
            .send(authed("POST", "/api/v1/transfer", &token, Some(body.clone())))
            .await;
        assert_eq!(status, expected, "body {}", body);
    }

    // Nothing moved after the rejected attempts.
    assert_eq!(app.bank.get_account(payer_id).await.unwrap().balance, 40);
    assert_eq!(app.bank.get_account(payee_id).await.unwrap().balance, 60);
}

#[tokio::test]
async fn test_update_only_own_account() {
    let app = test_app();
    let (own_id, own_number, token) = app.funded("me", 0).await;
    let (other_id, _, _) = app.funded("them", 0).await;

    let (status, body) = app
        .send(authed(
            "PUT",
            &format!("/api/v1/account/{}", own_id),
            &token,
            Some(json!({"lastName": "renamed", "password": "fresh"})),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["lastName"], "renamed");
    assert!(app.bank.authenticate(own_number, "fresh").await.is_ok());

    let (status, body) = app
        .send(authed(
            "PUT",
            &format!("/api/v1/account/{}", other_id),
            &token,
            Some(json!({"firstName": "hijacked"})),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 2003);
    assert_eq!(
        app.bank.get_account(other_id).await.unwrap().first_name,
        "them"
    );
}

#[tokio::test]
async fn test_delete_account() {
    let app = test_app();
    let (id, _, token) = app.funded("gone", 0).await;
    let uri = format!("/api/v1/account/{}", id);

    let (status, body) = app.send(authed("DELETE", &uri, &token, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["deleted"], id);

    let (status, _) = app.send(authed("GET", &uri, &token, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.send(authed("DELETE", &uri, &token, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 4001);
}

#[tokio::test]
async fn test_openapi_document_served() {
    let app = test_app();
    let (status, body) = app.send(get("/api-docs/openapi.json")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"].get("/api/v1/transfer").is_some());
}
