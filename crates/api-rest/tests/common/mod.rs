#![allow(dead_code)]

use api_rest::{build_router, AppState};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Utc;
use cutis_core::audit::MemoryAuditLog;
use cutis_core::classifier::{Classifier, ClassifierError, ClassifierResponse, ImageUpload};
use cutis_core::classify::ClassificationService;
use cutis_core::clock::ManualClock;
use cutis_core::condition::{Condition, ConditionCatalog};
use cutis_core::config::ConfidenceThresholds;
use cutis_core::conversation::{ChatError, ChatModel, ConversationService, MemoryConversationStore};
use cutis_core::enrichment::{Enricher, SearchError, SearchHit, SearchKind, SearchProvider};
use cutis_core::history::{HistoryService, MedicalHistoryWriter, MemoryHistoryStore};
use cutis_core::storage::LocalObjectStorage;
use cutis_core::{ImageStore, Services};
use cutis_files::UrlSigner;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

pub const USER: &str = "550e8400e29b41d4a716446655440000";
pub const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];
const BOUNDARY: &str = "cutis-test-boundary";

pub struct FixedClassifier(pub Value);

#[async_trait]
impl Classifier for FixedClassifier {
    async fn classify(&self, _image: &ImageUpload) -> Result<ClassifierResponse, ClassifierError> {
        ClassifierResponse::from_json(self.0.clone())
            .map_err(|reason| ClassifierError::MalformedResponse { status: 200, reason })
    }
}

struct StaticSearch;

#[async_trait]
impl SearchProvider for StaticSearch {
    async fn search(
        &self,
        _query: &str,
        _location: &str,
        kind: SearchKind,
    ) -> Result<Vec<SearchHit>, SearchError> {
        Ok(match kind {
            SearchKind::Web => vec![SearchHit::web(
                "Dr. Ana Cruz",
                "https://example.ph/dr-cruz",
                "Dermatologist in Makati",
            )],
            SearchKind::Places => vec![SearchHit::web(
                "Makati Skin Clinic",
                "https://example.ph/clinic",
                "Ayala Ave",
            )],
        })
    }
}

struct CannedModel;

#[async_trait]
impl ChatModel for CannedModel {
    async fn generate(&self, _prompt: &str) -> Result<String, ChatError> {
        Ok("Keep the area clean and see a dermatologist.".into())
    }
}

pub struct TestApp {
    pub router: Router,
    pub audit: Arc<MemoryAuditLog>,
    pub clock: Arc<ManualClock>,
    _dir: TempDir,
}

pub fn acne_prediction(confidence: f64) -> Value {
    json!({
        "success": true,
        "predictions": [{ "class": "Acne", "confidence": confidence }]
    })
}

pub fn app(classifier_reply: Value) -> TestApp {
    app_with(classifier_reply, true)
}

pub fn app_with(classifier_reply: Value, chat_enabled: bool) -> TestApp {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let signer = UrlSigner::new(b"test-key".to_vec(), "http://localhost:3002", 3600).unwrap();
    let images = Arc::new(ImageStore::new(&dir.path().join("images"), signer.clone()).unwrap());
    let history_store = Arc::new(MemoryHistoryStore::new());
    let conversation_store = Arc::new(MemoryConversationStore::new());
    let audit = Arc::new(MemoryAuditLog::new());

    let catalog = ConditionCatalog::new(vec![Condition {
        name: "Acne".into(),
        description: "Clogged hair follicles".into(),
        severity: Default::default(),
        recommendation: Some("See a dermatologist for prescription retinoids".into()),
    }]);
    let enricher = Enricher::new(
        Arc::new(StaticSearch),
        clock.clone(),
        chrono::Duration::hours(24),
        "Philippines",
    );

    let classification = ClassificationService::new(
        Arc::new(LocalObjectStorage::new(images.clone())),
        Arc::new(FixedClassifier(classifier_reply)),
        Arc::new(catalog),
        Arc::new(enricher),
        MedicalHistoryWriter::new(history_store.clone(), clock.clone()),
        audit.clone(),
        ConfidenceThresholds::default(),
    );
    let history = HistoryService::new(
        history_store.clone(),
        conversation_store.clone(),
        audit.clone(),
        clock.clone(),
    )
    .with_signer(signer);
    let model: Option<Arc<dyn ChatModel>> = if chat_enabled {
        Some(Arc::new(CannedModel))
    } else {
        None
    };
    let conversations =
        ConversationService::new(conversation_store, history_store, model, clock.clone());

    let services = Services {
        classification: Arc::new(classification),
        history: Arc::new(history),
        conversations: Arc::new(conversations),
        images,
        clock: clock.clone(),
    };

    TestApp {
        router: build_router(AppState {
            services,
            max_upload_bytes: 1024 * 1024,
        }),
        audit,
        clock,
        _dir: dir,
    }
}

/// Multipart body with an optional `image` part and an optional `location` part.
pub fn classify_request(image: Option<&[u8]>, location: Option<&str>, user: Option<&str>) -> Request<Body> {
    let mut body = Vec::new();
    if let Some(bytes) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"rash.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    if let Some(location) = location {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"location\"\r\n\r\n{location}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let mut builder = Request::builder()
        .method("POST")
        .uri("/classify")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    builder.body(Body::from(body)).unwrap()
}

/// A `/classify` body cut off inside the `location` field.
pub fn truncated_classify_request() -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"rash.png\"\r\nContent-Type: image/png\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(PNG);
    body.extend_from_slice(
        format!("\r\n--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"location\"\r\n\r\nMak")
            .as_bytes(),
    );

    Request::builder()
        .method("POST")
        .uri("/classify")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

pub fn request(method: &str, uri: &str, user: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>, Option<String>) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec(), content_type)
}

pub async fn send_json(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, bytes, _) = send(router, request).await;
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

/// Path and query of a signed image URL.
pub fn local_path(url: &str) -> String {
    url.strip_prefix("http://localhost:3002").unwrap().to_string()
}
