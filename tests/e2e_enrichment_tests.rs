//! End-to-end tests for AI pre-annotation enrichment of served clips.

mod common;

use axum::{extract::Query, routing::get, Json, Router};
use common::{TestClient, TestServer, TestServerOptions};
use reqwest::StatusCode;
use serde::Deserialize;

#[derive(Deserialize)]
struct PredictionParams {
    user_id: String,
    recording_id: String,
}

/// Spawns a stand-in prediction service that echoes the query parameters
/// back inside the response, so tests can assert what the server sent.
async fn spawn_prediction_service() -> String {
    let app = Router::new().route(
        "/predict",
        get(|Query(params): Query<PredictionParams>| async move {
            Json(serde_json::json!({
                "aiClasses": [
                    format!("recording:{}", params.recording_id),
                    format!("user:{}", params.user_id),
                ],
                "aiRegions": [[0.5, 2.0]],
                "interface": 2
            }))
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/predict", addr)
}

/// A URL nothing listens on.
async fn dead_prediction_service() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/predict", addr)
}

fn header_str<'a>(response: &'a reqwest::Response, name: &str) -> &'a str {
    response.headers().get(name).unwrap().to_str().unwrap()
}

#[tokio::test]
async fn test_served_clip_carries_ai_pre_annotations() {
    let prediction_url = spawn_prediction_service().await;
    let server = TestServer::spawn_with(TestServerOptions {
        prediction_url: Some(prediction_url),
        ..Default::default()
    })
    .await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    let response = client.next_clip().await;
    assert_eq!(response.status(), StatusCode::OK);

    let classes: Vec<String> = serde_json::from_str(header_str(&response, "x-ai-classes")).unwrap();
    let filename = header_str(&response, "x-clip-filename");
    // recording_id is the basename without extension
    let expected_recording = filename.trim_end_matches(".wav");
    assert!(classes.contains(&format!("recording:{}", expected_recording)));
    // the user id reaches the prediction service too
    assert!(classes.iter().any(|c| c.starts_with("user:")));

    let regions: Vec<(f64, f64)> =
        serde_json::from_str(header_str(&response, "x-ai-regions")).unwrap();
    assert_eq!(regions, vec![(0.5, 2.0)]);
    assert_eq!(header_str(&response, "x-interface-variant"), "2");
}

#[tokio::test]
async fn test_unreachable_prediction_service_degrades_to_defaults() {
    let prediction_url = dead_prediction_service().await;
    let server = TestServer::spawn_with(TestServerOptions {
        prediction_url: Some(prediction_url),
        ..Default::default()
    })
    .await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    // the clip is still served
    let response = client.next_clip().await;
    assert_eq!(response.status(), StatusCode::OK);

    // with the zero-value enrichment
    assert_eq!(header_str(&response, "x-ai-classes"), "[]");
    assert_eq!(header_str(&response, "x-ai-regions"), "[]");
    assert_eq!(header_str(&response, "x-interface-variant"), "0");

    let bytes = response.bytes().await.unwrap();
    assert_eq!(&bytes[..], common::TEST_AUDIO_BYTES);
}

#[tokio::test]
async fn test_no_configured_service_also_serves_defaults() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    let response = client.next_clip().await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_str(&response, "x-ai-classes"), "[]");
    assert_eq!(header_str(&response, "x-interface-variant"), "0");
}

#[tokio::test]
async fn test_malformed_prediction_body_degrades_to_defaults() {
    // service answers 200 but with the wrong shape
    let app = Router::new().route(
        "/predict",
        get(|| async { Json(serde_json::json!({"unexpected": true})) }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let server = TestServer::spawn_with(TestServerOptions {
        prediction_url: Some(format!("http://{}/predict", addr)),
        ..Default::default()
    })
    .await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    let response = client.next_clip().await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_str(&response, "x-ai-classes"), "[]");
}
