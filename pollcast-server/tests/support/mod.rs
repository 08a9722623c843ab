use std::sync::Arc;

use anyhow::Result;
use axum_test::TestServer;
use pollcast_server::{
    infra::{app_state::AppState, config::Config},
    routes::create_app,
};
use serde_json::{Value, json};

pub fn in_memory_state() -> AppState {
    AppState::in_memory(Arc::new(Config::in_memory()))
}

/// Real HTTP transport so WebSocket upgrades work.
pub fn build_server(state: AppState) -> Result<TestServer> {
    TestServer::builder()
        .http_transport()
        .build(create_app(state))
        .map_err(|err| anyhow::anyhow!(err.to_string()))
}

pub async fn create_session(server: &TestServer, title: &str, options: &[&str]) -> String {
    let response = server
        .post("/create-session")
        .json(&json!({ "title": title, "options": options }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    let body: Value = response.json();
    body["sessionId"]
        .as_str()
        .expect("sessionId returned")
        .to_string()
}

pub async fn voter_token(server: &TestServer) -> String {
    let response = server.post("/join-session").await;
    response.assert_status_ok();
    let body: Value = response.json();
    body["voterToken"]
        .as_str()
        .expect("voterToken returned")
        .to_string()
}
