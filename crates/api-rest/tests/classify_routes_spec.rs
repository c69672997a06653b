mod common;

use axum::http::StatusCode;
use common::{
    acne_prediction, app, classify_request, local_path, request, send, send_json,
    truncated_classify_request, PNG, USER,
};
use serde_json::json;

#[tokio::test]
async fn health_returns_alive() {
    let app = app(acne_prediction(0.95));
    let (status, body) = send_json(&app.router, request("GET", "/health", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true, "message": "Cutis REST API is alive" }));
}

#[tokio::test]
async fn conditions_lists_catalog() {
    let app = app(acne_prediction(0.95));
    let (status, body) = send_json(&app.router, request("GET", "/conditions", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["conditions"][0]["name"], "Acne");
}

#[tokio::test]
async fn classify_without_image_is_bad_request() {
    let app = app(acne_prediction(0.95));
    let (status, body) =
        send_json(&app.router, classify_request(None, Some("Makati"), None)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({ "success": false, "message": "No image file was uploaded" })
    );
    assert!(app.audit.entries().is_empty());
}

#[tokio::test]
async fn classify_rejects_truncated_form() {
    let app = app(acne_prediction(0.95));
    let (status, body) = send_json(&app.router, truncated_classify_request()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(app.audit.entries().is_empty());
}

#[tokio::test]
async fn classify_rejects_unsupported_format() {
    let app = app(acne_prediction(0.95));
    let (status, body) =
        send_json(&app.router, classify_request(Some(b"plain text, not a photo"), None, None)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Unsupported image format"));
}

#[tokio::test]
async fn guest_classification_returns_result_and_servable_image() {
    let app = app(acne_prediction(0.95));
    let (status, body) =
        send_json(&app.router, classify_request(Some(PNG), Some("Makati"), None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["classification"], "Acne");
    assert_eq!(body["confidencePercentage"], "95.0");
    assert_eq!(
        body["recommendation"],
        "See a dermatologist for prescription retinoids"
    );
    assert_eq!(body["conditionFound"], true);
    assert_eq!(body["medicalHistoryAdded"], false);
    assert_eq!(body["historyId"], serde_json::Value::Null);
    assert_eq!(body["specialists"][0]["name"], "Dr. Ana Cruz");
    assert_eq!(body["clinics"][0]["title"], "Makati Skin Clinic");
    assert!(body["predictions"].is_array());

    let image_url = body["imageUrl"].as_str().unwrap();
    assert!(image_url.starts_with("http://localhost:3002/images/Skins/Acne/"));

    let (status, bytes, content_type) =
        send(&app.router, request("GET", &local_path(image_url), None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, PNG);
    assert_eq!(content_type.as_deref(), Some("image/png"));
}

#[tokio::test]
async fn image_requires_valid_unexpired_signature() {
    let app = app(acne_prediction(0.95));
    let (_, body) = send_json(&app.router, classify_request(Some(PNG), None, None)).await;
    let path = local_path(body["imageUrl"].as_str().unwrap());
    let unsigned = path.split('?').next().unwrap().to_string();

    let (status, _, _) = send(&app.router, request("GET", &unsigned, None, None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let tampered = format!("{}?expires=9999999999&sig=00", unsigned);
    let (status, _, _) = send(&app.router, request("GET", &tampered, None, None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    app.clock.advance(chrono::Duration::hours(2));
    let (status, _, _) = send(&app.router, request("GET", &path, None, None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn classifier_failure_is_reported_as_bad_request() {
    let app = app(json!({ "success": false, "message": "model unavailable" }));
    let (status, body) =
        send_json(&app.router, classify_request(Some(PNG), None, Some(USER))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "success": false, "message": "model unavailable" }));

    let (status, body) =
        send_json(&app.router, request("GET", "/medical-history", Some(USER), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["history"], json!([]));
}

#[tokio::test]
async fn malformed_identity_is_unauthorized() {
    let app = app(acne_prediction(0.95));
    let (status, body) =
        send_json(&app.router, classify_request(Some(PNG), None, Some("not-a-user"))).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "message": "Invalid user identity" }));
}
