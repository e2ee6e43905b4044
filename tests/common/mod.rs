#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response, header};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::Utc;
use drop_api::modules::users::model::UserRecord;
use drop_api::modules::users::store::MemoryUserStore;
use drop_api::state::AppState;
use drop_api::web::Shutdown;
use drop_auth::{Claims, KeyStore, TokenAuthority, generate_private_key_pem};
use drop_config::AuthConfig;
use http_body_util::BodyExt;

pub const USER_PASSWORD: &str = "user-password";
pub const ADMIN_PASSWORD: &str = "admin-password";

fn record(id: &str, email: &str, password: &str, roles: &[&str]) -> UserRecord {
    UserRecord {
        id: id.to_string(),
        name: format!("Test {id}"),
        email: email.to_string(),
        roles: roles.iter().map(|r| r.to_string()).collect(),
        password_hash: bcrypt::hash(password, 4).unwrap(),
        date_created: Utc::now(),
        date_updated: Utc::now(),
    }
}

/// Keys `k1` and `k2`, user `u1` (USER), user `u2` (USER) and admin `a1`.
pub fn test_state() -> AppState {
    let pems: Vec<(String, String)> = ["k1", "k2"]
        .iter()
        .map(|kid| (kid.to_string(), generate_private_key_pem().unwrap()))
        .collect();
    let keys = KeyStore::from_pems(pems.iter().map(|(k, p)| (k.as_str(), p.as_str()))).unwrap();
    let authority = TokenAuthority::new("EdDSA", keys).unwrap();

    let users = MemoryUserStore::new(vec![
        record("u1", "u1@example.com", USER_PASSWORD, &["USER"]),
        record("u2", "u2@example.com", USER_PASSWORD, &["USER"]),
        record("a1", "admin@example.com", ADMIN_PASSWORD, &["ADMIN", "USER"]),
    ]);

    AppState::new(
        authority,
        Arc::new(users),
        AuthConfig::from_lookup(|_| None),
        Shutdown::new(),
    )
}

pub fn token_for(state: &AppState, sub: &str, roles: &[&str], kid: &str) -> String {
    let claims = Claims::new(
        sub,
        roles.iter().map(|r| r.to_string()).collect(),
        "drop project",
        Utc::now(),
        3600,
    )
    .unwrap();
    state.auth.issue(&claims, kid).unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn get_with_bearer(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

pub fn get_with_basic(uri: &str, user: &str, password: &str) -> Request<Body> {
    let credentials = STANDARD.encode(format!("{user}:{password}"));
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Basic {credentials}"))
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
