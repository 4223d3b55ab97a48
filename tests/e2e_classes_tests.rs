//! End-to-end tests for the annotation class taxonomy.

mod common;

use common::{TestClient, TestServer};
use reqwest::StatusCode;

#[tokio::test]
async fn test_classes_are_seeded() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    let classes: Vec<serde_json::Value> = client.classes().await.json().await.unwrap();
    assert_eq!(classes.len(), 21);
    assert!(classes
        .iter()
        .any(|c| c["name"].as_str() == Some("Seagull Cry")));

    let names: Vec<String> = client.class_names().await.json().await.unwrap();
    assert_eq!(names.len(), 21);
    assert!(names.contains(&"Church Bell".to_string()));
}

#[tokio::test]
async fn test_add_class() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    let response = client.post_class("Accordion").await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let class: serde_json::Value = response.json().await.unwrap();
    assert_eq!(class["name"], "Accordion");

    let names: Vec<String> = client.class_names().await.json().await.unwrap();
    assert!(names.contains(&"Accordion".to_string()));
}

#[tokio::test]
async fn test_duplicate_class_conflicts() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    let response = client.post_class("Seagull Cry").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_empty_class_name_is_rejected() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    let response = client.post_class("   ").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
