//! Integration Tests: HttpUserStore against the axum user service
//!
//! Each test binds the router to 127.0.0.1:0 over a fresh in-memory store.
//!
//! These tests verify:
//! 1. create → find round trip and status mapping (404, 409, 400)
//! 2. Validation details in error bodies
//! 3. Admin-gated DELETE
//! 4. The session coordinator end to end over HTTP

use eventdao::server::serve;
use eventdao::store::CONFLICT_MESSAGE;
use eventdao::{
    App, AppConfig, HttpStoreConfig, HttpUserStore, NewUser, SessionState, Shutdown, StoreError, UserPatch, UserStore,
    WalletAddress,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

const ADMIN: &str = "6wWixzkisD9SDbxboz8EM66uq4QNWsC1xXcPM2Uvr6GK";

struct TestServer {
    base: String,
    shutdown: Shutdown,
}

impl TestServer {
    async fn start() -> Self {
        let admin = WalletAddress::parse(ADMIN).expect("admin");
        let app = App::in_memory(AppConfig::default().with_admin_wallet(admin));
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let shutdown = Shutdown::new();
        tokio::spawn(serve(listener, app.router(), shutdown.clone()));
        Self { base: format!("http://{}/api", addr), shutdown }
    }

    fn store(&self) -> HttpUserStore {
        HttpUserStore::new(HttpStoreConfig::new(self.base.clone()).with_timeout_secs(5)).expect("client")
    }

    fn url(&self, path: &str) -> String { format!("{}{}", self.base, path) }
}

impl Drop for TestServer {
    fn drop(&mut self) { self.shutdown.trigger(); }
}

fn addr(n: u8) -> WalletAddress { WalletAddress::from_public_key(&[n; 32]) }

/// Test: Health endpoint reports the service name
#[tokio::test]
async fn health_check() {
    let server = TestServer::start().await;
    let url = server.base.trim_end_matches("/api").to_string() + "/health";
    let body: Value = reqwest::get(url).await.expect("get").json().await.expect("json");
    assert_eq!(body, json!({"status": "ok", "service": "eventdao"}));
}

/// Test: Created user is found by wallet and id; missing wallet is None
#[tokio::test]
async fn create_then_find() {
    let server = TestServer::start().await;
    let store = server.store();

    let created = store.create(NewUser::new("alice", addr(1))).await.expect("create");
    assert_eq!(created.wallet_address, addr(1));
    assert_eq!(created.reputation, 0);

    let by_wallet = store.find_by_wallet(&addr(1)).await.expect("find");
    assert_eq!(by_wallet, Some(created.clone()));
    assert_eq!(store.find_by_wallet(&addr(1)).await.expect("find"), by_wallet);
    assert_eq!(store.find_by_id(&created.id).await.expect("find"), Some(created.clone()));
    assert_eq!(store.find_by_wallet(&addr(2)).await.expect("find"), None);
    assert_eq!(store.list().await.expect("list"), vec![created]);
}

/// Test: Duplicate username maps to Conflict and leaves the first row intact
#[tokio::test]
async fn duplicate_username_is_conflict() {
    let server = TestServer::start().await;
    let store = server.store();

    let first = store.create(NewUser::new("alice", addr(1))).await.expect("create");
    let err = store.create(NewUser::new("alice", addr(2))).await.unwrap_err();
    assert_eq!(err, StoreError::Conflict(CONFLICT_MESSAGE.into()));
    assert_eq!(store.find_by_wallet(&addr(1)).await.expect("find"), Some(first));
    assert_eq!(store.find_by_wallet(&addr(2)).await.expect("find"), None);
}

/// Test: Server-side validation returns 400 with every problem listed
#[tokio::test]
async fn create_validation_details() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let response = client.post(server.url("/users")).json(&json!({})).send().await.expect("post");
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.expect("json");
    assert_eq!(body["error"], "Validation error");
    assert_eq!(body["details"].as_array().map(|d| d.len()), Some(2));

    let response = client
        .post(server.url("/users"))
        .json(&json!({"username": "x".repeat(51), "wallet_address": addr(1).as_str()}))
        .send()
        .await
        .expect("post");
    assert_eq!(response.status().as_u16(), 400);
}

/// Test: Malformed wallet and id path segments are 400
#[tokio::test]
async fn malformed_path_segments() {
    let server = TestServer::start().await;

    let response = reqwest::get(server.url("/users/wallet/0OIl")).await.expect("get");
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.expect("json");
    assert_eq!(body["error"], "Invalid wallet address format");

    let response = reqwest::get(server.url("/users/not-a-uuid")).await.expect("get");
    assert_eq!(response.status().as_u16(), 400);
}

/// Test: Updates apply, conflict on taken names, and 404 on unknown ids
#[tokio::test]
async fn update_rules() {
    let server = TestServer::start().await;
    let store = server.store();
    let alice = store.create(NewUser::new("alice", addr(1))).await.expect("create");
    store.create(NewUser::new("bob", addr(2))).await.expect("create");

    let updated = store
        .update(&alice.id, UserPatch::default().username("alicia").avatar_url("https://cdn.eventdao.io/a.png"))
        .await
        .expect("update");
    assert_eq!(updated.username, "alicia");
    assert_eq!(updated.avatar_url.as_deref(), Some("https://cdn.eventdao.io/a.png"));

    let err = store.update(&alice.id, UserPatch::default().username("bob")).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));

    let err = store.update(&uuid::Uuid::new_v4(), UserPatch::default().username("zed")).await.unwrap_err();
    assert_eq!(err, StoreError::NotFound);
}

/// Test: DELETE needs the admin wallet header
#[tokio::test]
async fn delete_is_admin_only() {
    let server = TestServer::start().await;
    let store = server.store();
    let user = store.create(NewUser::new("carol", addr(3))).await.expect("create");
    let client = reqwest::Client::new();
    let url = server.url(&format!("/users/{}", user.id));

    let response = client.delete(&url).send().await.expect("delete");
    assert_eq!(response.status().as_u16(), 403);
    let body: Value = response.json().await.expect("json");
    assert_eq!(body["error"], "Wallet address is required for admin access");

    let response = client.delete(&url).header("x-wallet-address", addr(3).as_str()).send().await.expect("delete");
    assert_eq!(response.status().as_u16(), 403);

    // The plain client sends no header
    let err = store.delete(&user.id).await.unwrap_err();
    assert!(matches!(err, StoreError::Transport(ref msg) if msg.starts_with("HTTP 403")));

    let response = client.delete(&url).header("x-wallet-address", ADMIN).send().await.expect("delete");
    assert_eq!(response.status().as_u16(), 204);
    assert_eq!(store.find_by_id(&user.id).await.expect("find"), None);
}

/// Test: Coordinator over HTTP: ProfileMissing → register → ProfileFound, then a fresh session finds it
#[tokio::test]
async fn session_over_http() {
    let server = TestServer::start().await;
    let app = App::remote(AppConfig::default().with_api_url(server.base.clone())).expect("app");

    let session = app.session();
    let view = session.connect(addr(9)).await.expect("connect");
    assert_eq!(view.state, SessionState::ProfileMissing { address: addr(9) });

    let bob = session.register("bob").await.expect("register");
    assert_eq!(bob.wallet_address, addr(9));

    let fresh = app.session();
    let view = fresh.connect(addr(9)).await.expect("connect");
    assert_eq!(view.user(), Some(&bob));
}
