//! Production wiring.
//!
//! [`Services::from_config`] builds every collaborator from a [`CoreConfig`]: one shared
//! `reqwest` client for the classifier, search provider and conversation model, the
//! filesystem image store, the YAML record stores under the data directory and the
//! condition catalog.

use crate::audit::{AuditLog, TracingAuditLog};
use crate::classifier::HttpClassifier;
use crate::classify::ClassificationService;
use crate::clock::{Clock, SystemClock};
use crate::condition::ConditionCatalog;
use crate::config::CoreConfig;
use crate::conversation::{ChatModel, ConversationService, FsConversationStore, GeminiChatModel};
use crate::enrichment::{Enricher, SerperClient};
use crate::history::{FsHistoryStore, HistoryService, HistoryStore, MedicalHistoryWriter};
use crate::storage::LocalObjectStorage;
use crate::{CoreError, CoreResult};
use cutis_files::{ImageStore, UrlSigner};
use std::sync::Arc;

/// Everything the HTTP layer and the CLI need, built once per process.
#[derive(Clone)]
pub struct Services {
    pub classification: Arc<ClassificationService>,
    pub history: Arc<HistoryService>,
    pub conversations: Arc<ConversationService>,
    pub images: Arc<ImageStore>,
    pub clock: Arc<dyn Clock>,
}

impl Services {
    /// # Errors
    ///
    /// - [`CoreError::Storage`] if the image directory cannot be created or the signing
    ///   settings are unusable
    /// - [`CoreError::CatalogRead`] or [`CoreError::CatalogParse`] for a broken catalog file
    /// - [`CoreError::HttpClient`] if the HTTP client cannot be initialised
    pub fn from_config(cfg: &CoreConfig) -> CoreResult<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(CoreError::HttpClient)?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let audit: Arc<dyn AuditLog> = Arc::new(TracingAuditLog);

        let signer = UrlSigner::new(
            cfg.url_signing_key().to_vec(),
            cfg.public_url(),
            cfg.signed_url_ttl_secs(),
        )?;
        let images = Arc::new(ImageStore::new(&cfg.images_dir(), signer.clone())?);

        let catalog = ConditionCatalog::load(cfg.conditions_file())?;
        tracing::info!(
            conditions = catalog.len(),
            path = %cfg.conditions_file().display(),
            "condition catalog loaded"
        );

        let history_store: Arc<dyn HistoryStore> =
            Arc::new(FsHistoryStore::new(cfg.history_dir()));
        let conversation_store = Arc::new(FsConversationStore::new(cfg.conversations_dir()));

        let enricher = Enricher::new(
            Arc::new(SerperClient::new(client.clone(), cfg.search())),
            Arc::clone(&clock),
            chrono::Duration::seconds(cfg.search().cache_ttl_secs),
            cfg.search().default_location.clone(),
        );

        let classification = ClassificationService::new(
            Arc::new(LocalObjectStorage::new(Arc::clone(&images))),
            Arc::new(HttpClassifier::new(client.clone(), cfg.classifier())),
            Arc::new(catalog),
            Arc::new(enricher),
            MedicalHistoryWriter::new(Arc::clone(&history_store), Arc::clone(&clock)),
            Arc::clone(&audit),
            cfg.thresholds(),
        );

        let history = HistoryService::new(
            Arc::clone(&history_store),
            conversation_store.clone(),
            audit,
            Arc::clone(&clock),
        )
        .with_signer(signer);

        let model: Option<Arc<dyn ChatModel>> = match cfg.chat() {
            Some(settings) => {
                Some(Arc::new(GeminiChatModel::new(client, settings)) as Arc<dyn ChatModel>)
            }
            None => {
                tracing::warn!("no conversation model configured; conversations are disabled");
                None
            }
        };
        let conversations = ConversationService::new(
            conversation_store,
            history_store,
            model,
            Arc::clone(&clock),
        );

        Ok(Self {
            classification: Arc::new(classification),
            history: Arc::new(history),
            conversations: Arc::new(conversations),
            images,
            clock,
        })
    }
}
