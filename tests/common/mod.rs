#![allow(dead_code)]

use reqwest::Client;
use serde_json::{json, Value};
use std::time::{SystemTime, UNIX_EPOCH};

pub const BASE_URL: &str = "http://localhost:8000";
pub const PASSWORD: &str = "testpass123";

/// Build a reqwest client for tests.
pub fn client() -> Client {
    Client::new()
}

/// Unique suffix so repeated runs don't collide on usernames.
pub fn unique_suffix() -> String {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}", ts % 1_000_000_000)
}

/// Build a URL for an API endpoint.
pub fn url(path: &str) -> String {
    format!("{}{}", BASE_URL, path)
}

pub async fn join(client: &Client, username: &str, email: &str, password: &str) -> reqwest::Response {
    client
        .post(url("/api/auth/join"))
        .json(&json!({
            "firstName": "Test",
            "lastName": "Player",
            "username": username,
            "email": email,
            "password": password,
            "confirmPassword": password,
        }))
        .send()
        .await
        .expect("Failed to send join request")
}

pub async fn login(client: &Client, username: &str, password: &str) -> reqwest::Response {
    client
        .post(url("/api/auth/login"))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("Failed to send login request")
}

/// A logged-in account: (id, username, token).
pub struct Player {
    pub id: i64,
    pub username: String,
    pub token: String,
}

/// Join and log in a fresh account.
pub async fn new_player(client: &Client, prefix: &str) -> Player {
    let username = format!("{prefix}_{}", unique_suffix());
    let resp = join(client, &username, &format!("{username}@lobby.dev"), PASSWORD).await;
    assert_eq!(resp.status(), 200, "join should succeed");

    let resp = login(client, &username, PASSWORD).await;
    assert_eq!(resp.status(), 200, "login should succeed");
    let body: Value = resp.json().await.unwrap();

    Player {
        id: body["user"]["id"].as_i64().unwrap(),
        username,
        token: body["token"].as_str().unwrap().to_string(),
    }
}
