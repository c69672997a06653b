//! Classifier client.
//!
//! The external classifier takes a multipart upload with a single `image` part and answers
//! with JSON:
//!
//! ```json
//! { "success": true, "predictions": [{ "class": "Acne", "confidence": 0.93 }] }
//! ```
//!
//! or a failure payload such as `{ "success": false, "message": "model unavailable" }`. The
//! HTTP status is not trusted: any JSON body is handed back for the caller to judge, and
//! only transport errors or non-JSON bodies are reported as [`ClassifierError`].

use crate::config::ClassifierSettings;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Filename sent to the classifier regardless of the original upload name.
const UPLOAD_FILENAME: &str = "image.jpg";
const API_KEY_HEADER: &str = "api-key";

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("classifier endpoint is not configured")]
    NotConfigured,
    #[error("request to classifier failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("classifier returned an unreadable response (status {status}): {reason}")]
    MalformedResponse { status: u16, reason: String },
}

/// Image handed to the classifier.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(rename = "class")]
    pub label: String,
    pub confidence: f64,
}

/// Parsed classifier reply plus the raw JSON object it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierResponse {
    pub success: bool,
    pub predictions: Vec<Prediction>,
    pub message: Option<String>,
    pub raw: Map<String, Value>,
}

impl ClassifierResponse {
    /// Interpret a classifier JSON body.
    ///
    /// Missing `success` counts as failure. Prediction entries that do not carry a string
    /// `class` and numeric `confidence` are skipped.
    pub fn from_json(value: Value) -> Result<Self, String> {
        let raw = match value {
            Value::Object(map) => map,
            other => return Err(format!("expected a JSON object, got {}", other)),
        };

        let success = raw.get("success").and_then(Value::as_bool).unwrap_or(false);
        let predictions = raw
            .get("predictions")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| serde_json::from_value::<Prediction>(item.clone()).ok())
                    .collect()
            })
            .unwrap_or_default();
        let message = ["message", "error"]
            .iter()
            .find_map(|key| raw.get(*key).and_then(Value::as_str))
            .map(str::to_string);

        Ok(Self {
            success,
            predictions,
            message,
            raw,
        })
    }

    /// The classifier's first-ranked prediction.
    ///
    /// `None` when the classifier reported failure or returned no predictions.
    pub fn top_prediction(&self) -> Option<&Prediction> {
        if !self.success {
            return None;
        }
        self.predictions.first()
    }
}

#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, image: &ImageUpload) -> Result<ClassifierResponse, ClassifierError>;
}

/// HTTP classifier client. One POST per call, no retries.
pub struct HttpClassifier {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpClassifier {
    pub fn new(client: reqwest::Client, settings: &ClassifierSettings) -> Self {
        Self {
            client,
            endpoint: settings.endpoint.clone(),
            api_key: settings.api_key.clone(),
        }
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, image: &ImageUpload) -> Result<ClassifierResponse, ClassifierError> {
        if self.endpoint.is_empty() {
            return Err(ClassifierError::NotConfigured);
        }

        let form = reqwest::multipart::Form::new().part("image", image_part(image));

        let response = self
            .client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, &self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "classifier returned non-success status");
        }

        let json: Value =
            serde_json::from_str(&body).map_err(|e| ClassifierError::MalformedResponse {
                status: status.as_u16(),
                reason: e.to_string(),
            })?;
        ClassifierResponse::from_json(json).map_err(|reason| ClassifierError::MalformedResponse {
            status: status.as_u16(),
            reason,
        })
    }
}

/// The `image` part. An unparseable content type is dropped rather than failing the call.
fn image_part(image: &ImageUpload) -> reqwest::multipart::Part {
    let part = || reqwest::multipart::Part::bytes(image.bytes.clone()).file_name(UPLOAD_FILENAME);
    match image.content_type.as_deref() {
        Some(content_type) => part().mime_str(content_type).unwrap_or_else(|e| {
            tracing::warn!(content_type, error = %e, "ignoring invalid image content type");
            part()
        }),
        None => part(),
    }
}
