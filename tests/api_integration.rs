//! Integration tests for the HTTP API

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;

use moodfi::core::create_router;

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_router();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_verify_endpoint_scores_a_capture() {
    let app = create_router();

    let response = app
        .oneshot(post(
            "/verify",
            json!({"expressed": "happy", "target": "happy"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["result"]["is_face_detected"], true);
    assert_eq!(json["result"]["dominant_emotion"], "happy");
    assert_eq!(json["result"]["vibe_check"]["passed"], true);
    assert!(json["reward"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn test_verify_endpoint_empty_frame() {
    let app = create_router();

    let response = app
        .oneshot(post("/verify", json!({"target": "happy"})))
        .await
        .unwrap();

    let json = body_json(response).await;
    assert_eq!(json["result"]["is_face_detected"], false);
    assert_eq!(json["reward"].as_f64().unwrap(), 0.0);
}

#[tokio::test]
async fn test_create_session() {
    let app = create_router();

    let response = app
        .oneshot(post("/session/new", json!({"seed": 11})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["session_id"].is_string());
    assert!(json["websocket_url"].is_string());
    assert_eq!(json["status"]["phase"], "RUNNING");
    assert_eq!(json["status"]["challenge_index"], 1);
    assert_eq!(json["status"]["time_remaining"], 30);
}

#[tokio::test]
async fn test_session_not_found() {
    let app = create_router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/session/nonexistent")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_capture_not_found() {
    let app = create_router();

    let response = app
        .oneshot(post(
            "/session/nonexistent/capture",
            json!({"expressed": "happy"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_full_session_flow() {
    let app = create_router();

    // Create a session; router clones share state
    let response = app
        .clone()
        .oneshot(post("/session/new", json!({"seed": 21})))
        .await
        .unwrap();
    let created = body_json(response).await;
    let session_id = created["session_id"].as_str().unwrap().to_string();

    // Play all ten challenges by always expressing the current target
    let mut target = created["status"]["target"].as_str().unwrap().to_string();
    for round in 1..=10 {
        let response = app
            .clone()
            .oneshot(post(
                &format!("/session/{}/capture", session_id),
                json!({"expressed": target}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["matched"], true, "round {} should match", round);

        if json["status"]["phase"] == "COMPLETE" {
            assert_eq!(round, 10);
            assert_eq!(json["status"]["correct"], 10);
            assert_eq!(json["status"]["score"], 100);
            break;
        }
        target = json["status"]["target"].as_str().unwrap().to_string();
    }

    // Final status survives on the session endpoint
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/session/{}", session_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["phase"], "COMPLETE");
    assert_eq!(json["correct"], 10);
}

#[tokio::test]
async fn test_capture_with_wrong_emotion_does_not_match() {
    let app = create_router();

    let response = app
        .clone()
        .oneshot(post("/session/new", json!({"seed": 31})))
        .await
        .unwrap();
    let created = body_json(response).await;
    let session_id = created["session_id"].as_str().unwrap().to_string();

    // Neutral is never a challenge target
    let response = app
        .clone()
        .oneshot(post(
            &format!("/session/{}/capture", session_id),
            json!({"expressed": "neutral"}),
        ))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["matched"], false);
    assert_eq!(json["status"]["challenge_index"], 1);
    assert_eq!(json["status"]["score"], 0);
}

#[tokio::test]
async fn test_stop_finalizes_session() {
    let app = create_router();

    let response = app
        .clone()
        .oneshot(post("/session/new", json!({"seed": 51})))
        .await
        .unwrap();
    let created = body_json(response).await;
    let session_id = created["session_id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(post(&format!("/session/{}/stop", session_id), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["phase"], "COMPLETE");
    assert!(json["bonus_reward"].as_u64().is_some());
}
