use super::{load_detail, ConditionSnapshot, HistoryDetail, HistoryStore, MedicalHistoryEntry};
use crate::audit::{AuditEntry, AuditLog, AuditStatus};
use crate::best_effort::best_effort;
use crate::clock::Clock;
use crate::constants::AUDIT_MODULE_MEDICAL_RECORDS;
use crate::conversation::ConversationStore;
use crate::yaml_files::StoreResult;
use crate::{CoreError, CoreResult};
use cutis_files::UrlSigner;
use cutis_uuid::ShardableUuid;
use std::collections::HashSet;
use std::sync::Arc;

/// One row of a user's history list.
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySummary {
    pub entry: MedicalHistoryEntry,
    pub condition: Option<ConditionSnapshot>,
}

/// Read and delete operations over a user's medical history.
pub struct HistoryService {
    store: Arc<dyn HistoryStore>,
    conversations: Arc<dyn ConversationStore>,
    audit: Arc<dyn AuditLog>,
    signer: Option<UrlSigner>,
    clock: Arc<dyn Clock>,
}

impl HistoryService {
    pub fn new(
        store: Arc<dyn HistoryStore>,
        conversations: Arc<dyn ConversationStore>,
        audit: Arc<dyn AuditLog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            conversations,
            audit,
            signer: None,
            clock,
        }
    }

    /// Re-sign stored image URLs on read so listed entries never carry expired links.
    pub fn with_signer(mut self, signer: UrlSigner) -> Self {
        self.signer = Some(signer);
        self
    }

    /// The user's entries, newest first.
    pub async fn list(&self, user_id: &ShardableUuid) -> CoreResult<Vec<HistorySummary>> {
        let entries = self.store.entries_for_user(user_id).await?;
        let mut summaries = Vec::with_capacity(entries.len());
        for entry in entries {
            let condition = self.store.condition(&entry.condition_id).await?;
            summaries.push(HistorySummary {
                entry: self.refresh_image_url(entry),
                condition,
            });
        }
        Ok(summaries)
    }

    /// # Errors
    ///
    /// - [`CoreError::InvalidInput`] if `history_id` is not a canonical UUID
    /// - [`CoreError::NotFound`] if the entry is missing or belongs to someone else
    pub async fn get(&self, user_id: &ShardableUuid, history_id: &str) -> CoreResult<HistoryDetail> {
        let id = parse_history_id(history_id)?;
        let entry = self
            .store
            .entry_for_user(user_id, &id)
            .await?
            .ok_or_else(not_found)?;
        Ok(load_detail(self.store.as_ref(), self.refresh_image_url(entry)).await?)
    }

    /// Delete an entry, its condition snapshot, the specialist and clinic records no other
    /// entry refers to, and the user's conversations about it.
    ///
    /// Returns the number of conversations removed alongside the entry.
    pub async fn delete(&self, user_id: &ShardableUuid, history_id: &str) -> CoreResult<usize> {
        let id = parse_history_id(history_id)?;
        let entry = self
            .store
            .entry_for_user(user_id, &id)
            .await?
            .ok_or_else(not_found)?;
        if !self.store.delete_entry(user_id, &id).await? {
            return Err(not_found());
        }
        best_effort("release history records", self.release_records(&entry)).await;

        let removed = self.conversations.delete_for_history(user_id, &id).await?;
        tracing::info!(user = %user_id, history_id = %id, conversations = removed, "medical history deleted");

        best_effort(
            "audit",
            self.audit.record(AuditEntry {
                user_id: Some(user_id.clone()),
                action: format!("Deleted Medical History ({})", id),
                module: AUDIT_MODULE_MEDICAL_RECORDS.into(),
                status: AuditStatus::Success,
            }),
        )
        .await;

        Ok(removed)
    }

    async fn release_records(&self, entry: &MedicalHistoryEntry) -> StoreResult<()> {
        self.store.delete_condition(&entry.condition_id).await?;

        let remaining = self.store.all_entries().await?;
        let specialists_in_use: HashSet<&ShardableUuid> =
            remaining.iter().flat_map(|e| &e.specialists).collect();
        let clinics_in_use: HashSet<&ShardableUuid> =
            remaining.iter().flat_map(|e| &e.clinics).collect();

        for id in entry.specialists.iter().filter(|id| !specialists_in_use.contains(id)) {
            self.store.delete_specialist(id).await?;
        }
        for id in entry.clinics.iter().filter(|id| !clinics_in_use.contains(id)) {
            self.store.delete_clinic(id).await?;
        }
        Ok(())
    }

    fn refresh_image_url(&self, mut entry: MedicalHistoryEntry) -> MedicalHistoryEntry {
        if let (Some(signer), Some(image_id)) = (&self.signer, &entry.image_id) {
            entry.upload_skin = signer.sign_url(image_id.as_str(), self.clock.now());
        }
        entry
    }
}

fn parse_history_id(raw: &str) -> CoreResult<ShardableUuid> {
    ShardableUuid::parse(raw.trim()).map_err(|e| CoreError::InvalidInput(e.to_string()))
}

fn not_found() -> CoreError {
    CoreError::NotFound("Medical history not found".into())
}
