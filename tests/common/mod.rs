#![allow(dead_code)]

use conferio_client::{
    AppConfig, Conferio, IdentityStorageState, MockIdentityStorage,
    models::{Role, UserRecord},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Serialize)]
struct TestClaims {
    sub: String,
    exp: i64,
}

/// A signed JWT for `username` expiring `expires_in_secs` from now (negative = already expired).
pub fn jwt(username: &str, expires_in_secs: i64) -> String {
    let claims = TestClaims {
        sub: username.to_string(),
        exp: chrono::Utc::now().timestamp() + expires_in_secs,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"backend-only-secret"),
    )
    .expect("Failed to sign test token")
}

pub fn user(username: &str, role: Role) -> UserRecord {
    UserRecord {
        username: username.to_string(),
        role,
    }
}

/// The persisted record format, for seeding storage.
pub fn record(token: &str, username: &str, role: Role) -> String {
    serde_json::json!({
        "token": token,
        "user": { "username": username, "role": role.as_str() }
    })
    .to_string()
}

/// Serves `router` on an ephemeral port and returns its base URL.
pub async fn spawn_backend(router: axum::Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    address
}

pub struct TestClient {
    pub conferio: Conferio,
    pub storage: Arc<MockIdentityStorage>,
}

/// A `Conferio` context pointed at `address`, backed by in-memory storage.
pub fn client(address: &str) -> TestClient {
    let storage = Arc::new(MockIdentityStorage::new());
    let config = AppConfig {
        api_base_url: address.to_string(),
        ..AppConfig::default()
    };
    let conferio = Conferio::new(config, storage.clone() as IdentityStorageState);
    TestClient { conferio, storage }
}

/// Same as `client`, already signed in.
pub async fn signed_in_client(address: &str, username: &str, role: Role) -> TestClient {
    let test = client(address);
    test.conferio
        .session
        .set_identity(jwt(username, 3600), user(username, role))
        .await
        .expect("Failed to seed identity");
    test
}
