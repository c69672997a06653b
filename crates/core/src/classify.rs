//! Image classification workflow.
//!
//! [`ClassificationService::classify`] runs one upload through the whole pipeline:
//!
//! 1. store the upload under [`TEMP_FOLDER`]
//! 2. ask the [`Classifier`] for predictions and take the most confident one
//! 3. relabel unreliable predictions, look the label up in the [`ConditionCatalog`] and
//!    derive the recommendation
//! 4. copy the image into its permanent folder
//! 5. enrich with specialists and clinics, record history for signed-in users, audit
//! 6. delete the temporary upload
//!
//! The temporary upload is deleted on every path once it exists. Failures before the
//! permanent copy is made leave no stored image behind; everything after that point is
//! best effort and cannot fail the request.

use crate::audit::{AuditEntry, AuditLog, AuditStatus};
use crate::best_effort::best_effort;
use crate::classifier::{Classifier, ClassifierResponse, ImageUpload};
use crate::condition::{Condition, ConditionCatalog};
use crate::config::ConfidenceThresholds;
use crate::constants::{AUDIT_MODULE_AI, CLASSIFIER_FAILURE_MESSAGE, NO_IMAGE_MESSAGE};
use crate::enrichment::Enricher;
use crate::history::{MedicalHistoryWriter, NewHistoryEntry, SourceRef};
use crate::recommendation::{effective_label, recommend, target_folder, ConfidenceTier};
use crate::storage::ObjectStorage;
use api_shared::{ClassifyRes, ConditionSummary};
use cutis_files::{FilesError, StoredImage, TEMP_FOLDER};
use cutis_types::Confidence;
use cutis_uuid::ShardableUuid;
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct ClassifyRequest {
    pub image: Option<ImageUpload>,
    pub location: Option<String>,
    /// `None` for guests.
    pub user_id: Option<ShardableUuid>,
}

/// Why a classification produced no result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifyFailure {
    NoImage,
    UnsupportedImage(String),
    /// The classifier answered but reported no usable prediction.
    ClassifierRejected { message: String },
    Internal { message: String },
}

impl ClassifyFailure {
    /// `true` for failures the caller can fix (HTTP 400), `false` for server faults.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, ClassifyFailure::Internal { .. })
    }

    pub fn message(&self) -> String {
        match self {
            ClassifyFailure::NoImage => NO_IMAGE_MESSAGE.to_string(),
            ClassifyFailure::UnsupportedImage(message)
            | ClassifyFailure::ClassifierRejected { message }
            | ClassifyFailure::Internal { message } => message.clone(),
        }
    }

    fn internal(error: impl std::fmt::Display) -> Self {
        ClassifyFailure::Internal {
            message: format!("Error classifying image: {}", error),
        }
    }
}

impl std::fmt::Display for ClassifyFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifySuccess {
    pub response: ClassifyRes,
    /// Classifier payload as received.
    pub raw: Map<String, Value>,
}

impl ClassifySuccess {
    /// The response body: the classifier's payload with every [`ClassifyRes`] field written
    /// over it.
    pub fn into_body(self) -> Value {
        let mut body = self.raw;
        if let Ok(Value::Object(fields)) = serde_json::to_value(&self.response) {
            body.extend(fields);
        }
        Value::Object(body)
    }
}

pub struct ClassificationService {
    storage: Arc<dyn ObjectStorage>,
    classifier: Arc<dyn Classifier>,
    catalog: Arc<ConditionCatalog>,
    enricher: Arc<Enricher>,
    history: MedicalHistoryWriter,
    audit: Arc<dyn AuditLog>,
    thresholds: ConfidenceThresholds,
}

impl ClassificationService {
    pub fn new(
        storage: Arc<dyn ObjectStorage>,
        classifier: Arc<dyn Classifier>,
        catalog: Arc<ConditionCatalog>,
        enricher: Arc<Enricher>,
        history: MedicalHistoryWriter,
        audit: Arc<dyn AuditLog>,
        thresholds: ConfidenceThresholds,
    ) -> Self {
        Self {
            storage,
            classifier,
            catalog,
            enricher,
            history,
            audit,
            thresholds,
        }
    }

    pub fn catalog(&self) -> &ConditionCatalog {
        &self.catalog
    }

    /// Classify one uploaded image.
    ///
    /// # Errors
    ///
    /// - [`ClassifyFailure::NoImage`] when the request carries no image; nothing is stored
    /// - [`ClassifyFailure::UnsupportedImage`] when the bytes are not JPEG, PNG or WebP
    /// - [`ClassifyFailure::ClassifierRejected`] when the classifier reports failure or
    ///   returns no predictions
    /// - [`ClassifyFailure::Internal`] for transport, storage and other unexpected errors
    pub async fn classify(&self, request: ClassifyRequest) -> Result<ClassifySuccess, ClassifyFailure> {
        let ClassifyRequest {
            image,
            location,
            user_id,
        } = request;
        let image = image.ok_or(ClassifyFailure::NoImage)?;

        let temp = self
            .storage
            .upload(TEMP_FOLDER, &image.filename, image.bytes.clone())
            .await
            .map_err(|e| match e {
                FilesError::UnsupportedFormat(_) => ClassifyFailure::UnsupportedImage(e.to_string()),
                other => ClassifyFailure::internal(other),
            })?;
        tracing::debug!(image_id = %temp.id, "temporary upload stored");

        let result = self
            .run(&image, &temp, location.as_deref(), user_id.as_ref())
            .await;

        if let Err(failure) = &result {
            tracing::warn!(error = %failure, "image classification failed");
            self.audit(
                user_id.as_ref(),
                format!("Classify Image Failed ({})", failure.message()),
                AuditStatus::Failed,
            )
            .await;
        }

        self.discard(&temp).await;
        result
    }

    async fn run(
        &self,
        image: &ImageUpload,
        temp: &StoredImage,
        location: Option<&str>,
        user_id: Option<&ShardableUuid>,
    ) -> Result<ClassifySuccess, ClassifyFailure> {
        // The declared content type is client-supplied; send the sniffed one instead.
        let upload = ImageUpload {
            filename: image.filename.clone(),
            content_type: Some(temp.media_type.as_str().to_string()),
            bytes: image.bytes.clone(),
        };
        let reply = self
            .classifier
            .classify(&upload)
            .await
            .map_err(ClassifyFailure::internal)?;

        let (label, confidence) = top_prediction(&reply)?;
        let classification = effective_label(&label, confidence, self.thresholds);
        let condition = self.catalog.find_by_classification(&classification);
        let outcome = recommend(confidence, condition, self.thresholds);
        let folder = target_folder(&classification, confidence, self.thresholds);

        let stored = self
            .storage
            .promote(&temp.id, &folder, &image.filename)
            .await
            .map_err(ClassifyFailure::internal)?;
        tracing::info!(
            classification = %classification,
            confidence = confidence.value(),
            image_id = %stored.id,
            "image classified"
        );

        let enrichment = self.enricher.enrich(&classification, location).await;

        let (medical_history_added, history_id) = match user_id {
            Some(user_id) => {
                let written = self
                    .history
                    .record(NewHistoryEntry {
                        user_id: user_id.clone(),
                        condition_label: classification.clone(),
                        condition: condition.cloned(),
                        image_url: stored.url.clone(),
                        image_id: Some(stored.id.clone()),
                        recommendation: outcome.advice.clone(),
                        severity: outcome.severity,
                        specialists: enrichment
                            .specialists
                            .iter()
                            .cloned()
                            .map(SourceRef::Detail)
                            .collect(),
                        clinics: enrichment
                            .clinics
                            .iter()
                            .cloned()
                            .map(SourceRef::Detail)
                            .collect(),
                    })
                    .await;
                (written.success, written.history_id.map(|id| id.to_string()))
            }
            None => (false, None),
        };

        let certainty = match outcome.tier {
            ConfidenceTier::High => "High Confidence",
            _ => "Low Confidence",
        };
        self.audit(
            user_id,
            format!(
                "Classified Image ({}, Confidence: {}%) {}",
                classification,
                confidence.percentage(),
                certainty
            ),
            AuditStatus::Success,
        )
        .await;

        Ok(ClassifySuccess {
            response: ClassifyRes {
                success: true,
                classification,
                confidence: confidence.value(),
                confidence_percentage: confidence.percentage(),
                image_url: stored.url,
                recommendation: outcome.advice,
                severity: outcome.severity.as_str().to_string(),
                medical_history_added,
                condition_found: condition.is_some(),
                condition: condition.map(summary),
                specialists: enrichment.specialists,
                clinics: enrichment.clinics,
                history_id,
            },
            raw: reply.raw,
        })
    }

    async fn audit(&self, user_id: Option<&ShardableUuid>, action: String, status: AuditStatus) {
        best_effort(
            "audit",
            self.audit.record(AuditEntry {
                user_id: user_id.cloned(),
                action,
                module: AUDIT_MODULE_AI.into(),
                status,
            }),
        )
        .await;
    }

    async fn discard(&self, temp: &StoredImage) {
        match self.storage.delete(&temp.id).await {
            Ok(true) => tracing::debug!(image_id = %temp.id, "temporary upload removed"),
            Ok(false) => {
                tracing::warn!(image_id = %temp.id, "temporary upload was already gone")
            }
            Err(e) => {
                tracing::error!(image_id = %temp.id, error = %e, "failed to remove temporary upload")
            }
        }
    }
}

fn top_prediction(reply: &ClassifierResponse) -> Result<(String, Confidence), ClassifyFailure> {
    let prediction = reply
        .top_prediction()
        .ok_or_else(|| ClassifyFailure::ClassifierRejected {
            message: reply
                .message
                .clone()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| CLASSIFIER_FAILURE_MESSAGE.to_string()),
        })?;
    let confidence =
        Confidence::normalise(prediction.confidence).map_err(ClassifyFailure::internal)?;
    Ok((prediction.label.clone(), confidence))
}

fn summary(condition: &Condition) -> ConditionSummary {
    ConditionSummary {
        name: condition.name.clone(),
        description: condition.description.clone(),
        severity: condition.severity.as_str().to_string(),
    }
}
