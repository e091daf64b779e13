//! Liveness check

mod common;

use serde_json::Value;

#[tokio::test]
async fn health_check_works() {
    let app = common::spawn_app();

    let response = reqwest::Client::new()
        .get(&format!("{}/healthcheck", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "OK");
}

#[tokio::test]
async fn unknown_route_is_404() {
    let app = common::spawn_app();

    let response = reqwest::Client::new()
        .get(&format!("{}/health_check", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(404, response.status().as_u16());
}
